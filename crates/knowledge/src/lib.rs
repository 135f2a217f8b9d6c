//! Retrieval-and-routing core for Docroute.
//!
//! A query is classified into an [`Intent`], the collections routed for
//! that intent are searched, candidates are fused into one ranked list, and
//! a [`Mode`] decides whether a downstream answer should be grounded in the
//! retrieved text.
//!
//! ```no_run
//! use docroute_core::AppConfig;
//! use docroute_knowledge::{handle_request, RagService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let service = RagService::from_config(&config);
//! let response = handle_request(&service, r#"{"query": "What does NEC Article 250 cover?"}"#).await;
//! println!("{}", response.body);
//! # Ok(())
//! # }
//! ```

pub mod boundary;
pub mod build;
pub mod chunker;
pub mod embeddings;
pub mod intent;
pub mod mode;
pub mod parser;
pub mod pipeline;
pub mod retriever;
pub mod service;
pub mod store;
pub mod summarizer;
pub mod types;

#[cfg(test)]
mod tests;

pub use boundary::{handle_request, BoundaryResponse, DocOut, RagRequest, RagResponse};
pub use build::{read_manifest, BuildManifest, IndexBuilder};
pub use intent::classify;
pub use mode::decide_mode;
pub use pipeline::{Pipeline, RequestContext, Stage};
pub use retriever::{fuse, relevance_score, CollectionRoutes, Retriever};
pub use service::RagService;
pub use store::{Collection, CollectionLoad, CollectionStore, LanceStore, MemoryStore};
pub use summarizer::Summarizer;
pub use types::{
    ChatMessage, Chunk, CollectionState, CollectionStatus, Intent, Mode, RetrievalResult, ScoredChunk,
    Unavailable,
};
