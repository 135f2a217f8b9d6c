pub mod gemini;
pub mod ollama;
pub mod trigram;

pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use trigram::TrigramProvider;
