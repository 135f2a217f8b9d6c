//! JSON request/response boundary.
//!
//! Request:
//! ```json
//! { "messages": [{"role": "user", "content": "..."}], "query": "...", "apiKey": "..." }
//! ```
//! Response:
//! ```json
//! { "intent": "nec", "mode": "rag", "docs": [{"id": 1, "text": "...", "source": "...", "file": "...", "score": 0.9}], "memory_summary": "" }
//! ```
//! Failures produce `{"error": "..."}` with a non-200 status.

use crate::pipeline::RequestContext;
use crate::service::RagService;
use crate::types::{ChatMessage, Intent, Mode};
use docroute_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RagRequest {
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,

    #[serde(default)]
    pub query: Option<String>,

    /// Per-request credential override.
    #[serde(default, rename = "apiKey")]
    pub api_key: Option<String>,
}

impl RagRequest {
    /// Parse a request body; blank bodies are treated as `{}`.
    pub fn parse(body: &str) -> AppResult<Self> {
        let body = body.trim();
        if body.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(body).map_err(|e| AppError::Request(format!("Malformed request body: {}", e)))
    }

    /// Query text: the last message's content, else `query`, else "".
    pub fn query_text(&self) -> String {
        match self.messages.as_deref() {
            Some([.., last]) => last.content.clone(),
            _ => self.query.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocOut {
    /// 1-based rank.
    pub id: usize,
    pub text: String,
    pub source: String,
    pub file: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResponse {
    pub intent: Intent,
    pub mode: Mode,
    pub docs: Vec<DocOut>,
    pub memory_summary: String,
}

impl RagResponse {
    pub fn from_context(ctx: &RequestContext, memory_summary: String) -> Self {
        let docs = ctx
            .result
            .as_ref()
            .map(|result| {
                result
                    .chunks
                    .iter()
                    .enumerate()
                    .map(|(i, scored)| {
                        let chunk = &scored.chunk;
                        DocOut {
                            id: i + 1,
                            text: chunk.text.clone(),
                            source: chunk
                                .metadata_str("source")
                                .filter(|s| !s.is_empty())
                                .unwrap_or(chunk.source.as_str())
                                .to_string(),
                            file: chunk.metadata_str("file").unwrap_or_default().to_string(),
                            score: scored.score,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            intent: ctx.intent.unwrap_or(Intent::General),
            mode: ctx.mode(),
            docs,
            memory_summary,
        }
    }
}

/// Status code plus JSON body, independent of any transport.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryResponse {
    pub status: u16,
    pub body: Value,
}

impl BoundaryResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    fn error(err: &AppError) -> Self {
        let status = if err.is_client_error() { 400 } else { 500 };
        Self {
            status,
            body: serde_json::json!({ "error": err.to_string() }),
        }
    }
}

/// Handle one raw JSON request body.
///
/// The credential override lives only in this call's request context and
/// is dropped on every exit path.
pub async fn handle_request(service: &RagService, body: &str) -> BoundaryResponse {
    let result = async {
        let request = RagRequest::parse(body)?;
        let response = service.answer(request).await?;
        Ok::<Value, AppError>(serde_json::to_value(response)?)
    }
    .await;

    match result {
        Ok(body) => BoundaryResponse { status: 200, body },
        Err(e) => {
            tracing::warn!("Request failed: {}", e);
            BoundaryResponse::error(&e)
        }
    }
}
