//! Persisted, searchable collections of chunks.
//!
//! A [`CollectionStore`] resolves collection names to searchable handles.
//! Loading never fails: anything that prevents a search is reported as
//! [`Unavailable`] so retrieval can continue with the other collections.

pub mod lance;
pub mod memory;

pub use lance::LanceStore;
pub use memory::{MemoryCollection, MemoryStore};

pub use crate::types::Unavailable;

use crate::types::Chunk;
use async_trait::async_trait;
use docroute_core::AppResult;
use std::sync::Arc;

/// A searchable collection.
#[async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    /// Return up to `k` chunks nearest to `query`, ascending by distance.
    /// Distances are non-negative and smaller means more similar.
    async fn search(&self, query: &str, k: usize) -> AppResult<Vec<(Chunk, f32)>>;
}

/// Result of resolving a collection by name.
#[derive(Clone)]
pub enum CollectionLoad {
    Ready(Arc<dyn Collection>),
    Unavailable(Unavailable),
}

impl CollectionLoad {
    pub fn is_ready(&self) -> bool {
        matches!(self, CollectionLoad::Ready(_))
    }
}

impl std::fmt::Debug for CollectionLoad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionLoad::Ready(c) => f.debug_tuple("Ready").field(&c.name()).finish(),
            CollectionLoad::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

/// Resolves collection names to searchable handles.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Load a collection for one request.
    ///
    /// `api_key` is the credential in effect for this request; stores whose
    /// embedding backend needs one report [`Unavailable::MissingCredential`]
    /// when it is absent.
    async fn load(&self, name: &str, api_key: Option<&str>) -> CollectionLoad;
}

/// Squared Euclidean distance.
pub(crate) fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
