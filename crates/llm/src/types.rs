//! Provider identifiers and model-name handling.

/// Chat provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Gemini,
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }
}

/// Gemini chat models the summarizer is allowed to call.
pub const ALLOWED_GEMINI_MODELS: [&str; 2] = ["gemini-1.5-flash", "gemini-1.5-pro"];

/// Fallback when the configured model is not allowed.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Normalize a Gemini chat model name.
///
/// A trailing pinned-version suffix (`-001`, `-002`, ...) is dropped, and any
/// model outside [`ALLOWED_GEMINI_MODELS`] falls back to [`DEFAULT_GEMINI_MODEL`].
pub fn sanitize_model(name: &str) -> &'static str {
    let base = strip_version_suffix(name);
    ALLOWED_GEMINI_MODELS
        .iter()
        .find(|allowed| **allowed == base)
        .copied()
        .unwrap_or(DEFAULT_GEMINI_MODEL)
}

fn strip_version_suffix(name: &str) -> &str {
    let bytes = name.as_bytes();
    let n = bytes.len();
    if n >= 4
        && bytes[n - 4] == b'-'
        && bytes[n - 3] == b'0'
        && bytes[n - 2] == b'0'
        && bytes[n - 1].is_ascii_digit()
    {
        &name[..n - 4]
    } else {
        name
    }
}
