//! Chat client factory.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, OllamaClient};
use crate::types::ProviderType;
use docroute_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a chat client for a provider.
///
/// # Arguments
/// * `provider` - Provider identifier ("gemini", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Credential for providers that require one
///
/// # Errors
/// `AppError::MissingCredential` when Gemini is requested without a key,
/// `AppError::Config` for unknown providers.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    match ProviderType::parse(provider) {
        Some(ProviderType::Gemini) => {
            let key = api_key.filter(|k| !k.is_empty()).ok_or_else(|| {
                AppError::MissingCredential("Gemini chat provider requires an API key".to_string())
            })?;
            let client = match endpoint {
                Some(url) => GeminiClient::with_base_url(url, key),
                None => GeminiClient::new(key),
            };
            Ok(Arc::new(client))
        }
        Some(ProviderType::Ollama) => {
            let client = match endpoint {
                Some(url) => OllamaClient::with_base_url(url),
                None => OllamaClient::new(),
            };
            Ok(Arc::new(client))
        }
        None => Err(AppError::Config(format!("Unknown chat provider: {}", provider))),
    }
}
