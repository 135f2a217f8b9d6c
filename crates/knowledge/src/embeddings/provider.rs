//! Embedding provider trait and factory.

use super::providers::{GeminiProvider, OllamaProvider, TrigramProvider};
use docroute_core::config::EmbeddingConfig;
use docroute_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "gemini", "ollama", "trigram")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
///
/// The Gemini backend needs a credential; without one this returns
/// `AppError::MissingCredential` so callers can treat the collection as
/// unavailable rather than failing outright.
pub fn create_provider(
    config: &EmbeddingConfig,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "gemini" => {
            let key = api_key.filter(|k| !k.is_empty()).ok_or_else(|| {
                AppError::MissingCredential("Gemini embeddings require an API key".to_string())
            })?;
            Ok(Arc::new(GeminiProvider::new(config, key)?))
        }

        "ollama" => Ok(Arc::new(OllamaProvider::new(config)?)),

        "trigram" => Ok(Arc::new(TrigramProvider::new(config.dimensions))),

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: gemini, ollama, trigram",
            config.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: provider.to_string(),
            dimensions: 128,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_trigram_provider() {
        let provider = create_provider(&config("trigram"), None).unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.dimensions(), 128);
    }

    #[test]
    fn test_gemini_requires_key() {
        let err = create_provider(&config("gemini"), None).unwrap_err();
        assert!(matches!(err, AppError::MissingCredential(_)));

        let err = create_provider(&config("gemini"), Some("")).unwrap_err();
        assert!(matches!(err, AppError::MissingCredential(_)));

        let provider = create_provider(&config("gemini"), Some("key")).unwrap();
        assert_eq!(provider.provider_name(), "gemini");
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let provider = create_provider(&config("ollama"), None).unwrap();
        assert_eq!(provider.provider_name(), "ollama");
    }

    #[test]
    fn test_create_unknown_provider() {
        let result = create_provider(&config("unknown"), None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&config("trigram"), None).unwrap();
        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 128);
    }
}
