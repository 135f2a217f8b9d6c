//! Error types for Docroute.
//!
//! A single enum covers configuration, I/O, model backends, the collection
//! store, the routing pipeline and the request boundary.

use thiserror::Error;

/// Unified error type for Docroute.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Chat model errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding backend errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A backend needs a credential and none was supplied
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Collection store (vector index) errors
    #[error("Store error: {0}")]
    Store(String),

    /// Routing pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Malformed or incomplete request at the boundary
    #[error("Invalid request: {0}")]
    Request(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the error was caused by the caller's input rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::Request(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(AppError::Request("no body".to_string()).is_client_error());

        let parse_err: AppError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(!parse_err.is_client_error());

        assert!(!AppError::Store("corrupt".to_string()).is_client_error());
        assert!(!AppError::Pipeline("stage".to_string()).is_client_error());
    }

    #[test]
    fn test_error_display() {
        let err = AppError::MissingCredential("gemini embeddings".to_string());
        assert_eq!(err.to_string(), "Missing credential: gemini embeddings");
    }
}
