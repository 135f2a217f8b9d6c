//! Chat model integration for Docroute.
//!
//! Provides a provider-agnostic completion client used by the conversation
//! summarizer.
//!
//! # Providers
//! - **Gemini**: Google Generative Language API (default, needs an API key)
//! - **Ollama**: local LLM runtime
//!
//! # Example
//! ```no_run
//! use docroute_llm::{create_client, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("gemini", None, Some("my-key"))?;
//! let request = LlmRequest::new("Summarize: ...", "gemini-1.5-flash");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{GeminiClient, OllamaClient};
pub use types::{sanitize_model, ProviderType};
