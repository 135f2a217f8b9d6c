//! In-memory collections with brute-force search.

use super::{squared_l2, Collection, CollectionLoad, CollectionStore, Unavailable};
use crate::embeddings::{embed_in_batches, EmbeddingProvider};
use crate::types::Chunk;
use async_trait::async_trait;
use docroute_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::Arc;

/// A collection held entirely in memory.
pub struct MemoryCollection {
    name: String,
    entries: Vec<(Chunk, Vec<f32>)>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl MemoryCollection {
    /// Embed `chunks` with `embedder` and keep them in memory.
    pub async fn from_chunks(
        name: impl Into<String>,
        chunks: Vec<Chunk>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embed_in_batches(embedder.as_ref(), &texts, 64).await?;
        Ok(Self {
            name: name.into(),
            entries: chunks.into_iter().zip(vectors).collect(),
            embedder,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str, k: usize) -> AppResult<Vec<(Chunk, f32)>> {
        let query_vec = self.embedder.embed(query).await?;
        if query_vec.len() != self.embedder.dimensions() {
            return Err(AppError::Store(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.embedder.dimensions(),
                query_vec.len()
            )));
        }

        let mut hits: Vec<(Chunk, f32)> = self
            .entries
            .iter()
            .map(|(chunk, vector)| (chunk.clone(), squared_l2(&query_vec, vector)))
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits.truncate(k);
        Ok(hits)
    }
}

/// Named in-memory collections.
#[derive(Default)]
pub struct MemoryStore {
    collections: HashMap<String, Arc<MemoryCollection>>,
    requires_credential: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report every collection as unavailable when no credential is given,
    /// as a hosted embedding backend would.
    pub fn requiring_credential(mut self) -> Self {
        self.requires_credential = true;
        self
    }

    pub fn insert(&mut self, collection: MemoryCollection) {
        self.collections
            .insert(collection.name.clone(), Arc::new(collection));
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn load(&self, name: &str, api_key: Option<&str>) -> CollectionLoad {
        let Some(collection) = self.collections.get(name) else {
            return CollectionLoad::Unavailable(Unavailable::Missing);
        };
        if self.requires_credential && api_key.map_or(true, str::is_empty) {
            return CollectionLoad::Unavailable(Unavailable::MissingCredential);
        }
        if collection.is_empty() {
            return CollectionLoad::Unavailable(Unavailable::Empty);
        }
        CollectionLoad::Ready(collection.clone())
    }
}
