//! Scenario tests for the routing core.


use crate::store::{Collection, CollectionLoad, CollectionStore};
use crate::types::{Chunk, Unavailable};
use async_trait::async_trait;
use docroute_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Collection returning preset distances regardless of the query.
pub(crate) struct FixedCollection {
    name: String,
    hits: Vec<(Chunk, f32)>,
    requested: Mutex<Vec<usize>>,
}

impl FixedCollection {
    pub(crate) fn new(name: &str, distances: &[(&str, f32)]) -> Arc<Self> {
        let mut hits: Vec<(Chunk, f32)> = distances
            .iter()
            .map(|(id, d)| {
                let chunk = Chunk::new(*id, format!("text of {}", id), format!("{}.pdf", name))
                    .with_metadata("file", format!("{}.pdf", name));
                (chunk, *d)
            })
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        Arc::new(Self {
            name: name.to_string(),
            hits,
            requested: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requested(&self) -> Vec<usize> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Collection for FixedCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, _query: &str, k: usize) -> AppResult<Vec<(Chunk, f32)>> {
        self.requested.lock().unwrap().push(k);
        Ok(self.hits.iter().take(k).cloned().collect())
    }
}

/// Collection whose searches always fail.
pub(crate) struct FailingCollection;

#[async_trait]
impl Collection for FailingCollection {
    fn name(&self) -> &str {
        "failing"
    }

    async fn search(&self, _query: &str, _k: usize) -> AppResult<Vec<(Chunk, f32)>> {
        Err(AppError::Store("index file truncated".to_string()))
    }
}

/// Store with fixed load outcomes per collection name.
#[derive(Default)]
pub(crate) struct StubStore {
    loads: HashMap<String, CollectionLoad>,
}

impl StubStore {
    pub(crate) fn with(mut self, name: &str, collection: Arc<dyn Collection>) -> Self {
        self.loads.insert(name.to_string(), CollectionLoad::Ready(collection));
        self
    }

    pub(crate) fn unavailable(mut self, name: &str, reason: Unavailable) -> Self {
        self.loads.insert(name.to_string(), CollectionLoad::Unavailable(reason));
        self
    }
}

#[async_trait]
impl CollectionStore for StubStore {
    async fn load(&self, name: &str, _api_key: Option<&str>) -> CollectionLoad {
        self.loads
            .get(name)
            .cloned()
            .unwrap_or(CollectionLoad::Unavailable(Unavailable::Missing))
    }
}
