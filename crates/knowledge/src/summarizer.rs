//! Optional conversation summary attached to responses.
//!
//! Summaries are produced on every sixth message, from the last twenty
//! messages. Any failure yields an empty summary; the request itself never
//! fails because of summarization.

use crate::types::ChatMessage;
use docroute_core::config::ChatConfig;
use docroute_llm::{create_client, sanitize_model, LlmClient, LlmRequest, ProviderType};
use std::sync::Arc;
use tracing::{debug, warn};

/// Summarize when the message count is a multiple of this.
pub const SUMMARY_EVERY: usize = 6;

/// Number of trailing messages included in the prompt.
pub const SUMMARY_WINDOW: usize = 20;

pub const SUMMARY_INSTRUCTION: &str =
    "Summarize the following conversation briefly but keep key facts, user goals, constraints, and any conclusions.";

const SUMMARY_TEMPERATURE: f32 = 0.3;

enum ClientSource {
    /// Built per request from the request's credential.
    Provider {
        provider: String,
        endpoint: Option<String>,
    },
    Fixed(Arc<dyn LlmClient>),
}

pub struct Summarizer {
    enabled: bool,
    model: String,
    source: ClientSource,
}

impl Summarizer {
    pub fn new(enabled: bool, chat: &ChatConfig) -> Self {
        Self {
            enabled,
            model: chat.model.clone(),
            source: ClientSource::Provider {
                provider: chat.provider.clone(),
                endpoint: chat.endpoint.clone(),
            },
        }
    }

    /// Use a prebuilt client. A credential is still required per request.
    pub fn with_client(enabled: bool, model: impl Into<String>, client: Arc<dyn LlmClient>) -> Self {
        Self {
            enabled,
            model: model.into(),
            source: ClientSource::Fixed(client),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn requires_key(&self) -> bool {
        match &self.source {
            ClientSource::Provider { provider, .. } => {
                ProviderType::parse(provider) != Some(ProviderType::Ollama)
            }
            ClientSource::Fixed(_) => true,
        }
    }

    /// Whether a summary will be attempted for this conversation.
    pub fn should_summarize(&self, messages: &[ChatMessage], api_key: Option<&str>) -> bool {
        let has_key = api_key.is_some_and(|k| !k.is_empty());
        self.enabled
            && !messages.is_empty()
            && messages.len() % SUMMARY_EVERY == 0
            && (has_key || !self.requires_key())
    }

    fn model_name(&self) -> String {
        match &self.source {
            ClientSource::Provider { provider, .. }
                if ProviderType::parse(provider) == Some(ProviderType::Ollama) =>
            {
                self.model.clone()
            }
            _ => sanitize_model(&self.model).to_string(),
        }
    }

    fn client(&self, api_key: Option<&str>) -> docroute_core::AppResult<Arc<dyn LlmClient>> {
        match &self.source {
            ClientSource::Provider { provider, endpoint } => {
                create_client(provider, endpoint.as_deref(), api_key)
            }
            ClientSource::Fixed(client) => Ok(client.clone()),
        }
    }

    /// Summarize the conversation, or return an empty string.
    pub async fn summarize(&self, messages: &[ChatMessage], api_key: Option<&str>) -> String {
        if !self.should_summarize(messages, api_key) {
            return String::new();
        }

        let client = match self.client(api_key) {
            Ok(c) => c,
            Err(e) => {
                warn!("Summary client unavailable: {}", e);
                return String::new();
            }
        };

        let request = LlmRequest::new(build_prompt(messages), self.model_name())
            .with_temperature(SUMMARY_TEMPERATURE);

        match client.complete(&request).await {
            Ok(response) => {
                debug!("Produced {} character summary", response.content.len());
                response.content
            }
            Err(e) => {
                warn!("Summarization failed: {}", e);
                String::new()
            }
        }
    }
}

/// Instruction followed by the last messages as `role: content` lines.
pub fn build_prompt(messages: &[ChatMessage]) -> String {
    let start = messages.len().saturating_sub(SUMMARY_WINDOW);
    let transcript = messages[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n\n{}", SUMMARY_INSTRUCTION, transcript)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docroute_core::{AppError, AppResult};
    use docroute_llm::{LlmResponse, LlmUsage};
    use std::sync::Mutex;

    /// Records requests and answers with a fixed reply or error.
    struct RecordingClient {
        reply: Option<String>,
        seen: Mutex<Vec<LlmRequest>>,
    }

    impl RecordingClient {
        fn new(reply: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(String::from),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for RecordingClient {
        fn provider_name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Some(text) => Ok(LlmResponse {
                    content: text.clone(),
                    model: request.model.clone(),
                    usage: LlmUsage::default(),
                }),
                None => Err(AppError::Llm("boom".to_string())),
            }
        }
    }

    fn messages(n: usize) -> Vec<ChatMessage> {
        (0..n)
            .map(|i| {
                let role = if i % 2 == 0 { "user" } else { "assistant" };
                ChatMessage::new(role, format!("message {}", i))
            })
            .collect()
    }

    #[tokio::test]
    async fn test_summarizes_on_sixth_message() {
        let client = RecordingClient::new(Some("short summary"));
        let summarizer = Summarizer::with_client(true, "gemini-1.5-flash-002", client.clone());

        let summary = summarizer.summarize(&messages(6), Some("key")).await;
        assert_eq!(summary, "short summary");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "gemini-1.5-flash");
        assert_eq!(seen[0].temperature, Some(0.3));
    }

    #[tokio::test]
    async fn test_skips_when_not_multiple_of_six() {
        let client = RecordingClient::new(Some("s"));
        let summarizer = Summarizer::with_client(true, "gemini-1.5-flash", client.clone());

        assert_eq!(summarizer.summarize(&messages(5), Some("key")).await, "");
        assert_eq!(summarizer.summarize(&messages(0), Some("key")).await, "");
        assert!(client.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_skips_when_disabled_or_no_key() {
        let client = RecordingClient::new(Some("s"));
        let disabled = Summarizer::with_client(false, "gemini-1.5-flash", client.clone());
        assert_eq!(disabled.summarize(&messages(6), Some("key")).await, "");

        let enabled = Summarizer::with_client(true, "gemini-1.5-flash", client.clone());
        assert_eq!(enabled.summarize(&messages(6), None).await, "");
        assert!(client.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_yields_empty() {
        let summarizer = Summarizer::with_client(true, "gemini-1.5-flash", RecordingClient::new(None));
        assert_eq!(summarizer.summarize(&messages(12), Some("key")).await, "");
    }

    #[test]
    fn test_prompt_uses_last_twenty() {
        let prompt = build_prompt(&messages(24));
        assert!(prompt.starts_with(SUMMARY_INSTRUCTION));
        assert!(!prompt.contains("message 3\n"));
        assert!(prompt.contains("user: message 4\n"));
        assert!(prompt.ends_with("assistant: message 23"));
        assert_eq!(prompt.lines().filter(|l| l.contains(": message")).count(), 20);
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let chat = ChatConfig {
            provider: "ollama".to_string(),
            model: "llama3".to_string(),
            endpoint: None,
        };
        let summarizer = Summarizer::new(true, &chat);
        assert!(summarizer.should_summarize(&messages(6), None));
        assert_eq!(summarizer.model_name(), "llama3");
    }
}
