//! Multi-collection retrieval with distance fusion.

use crate::mode::decide_mode;
use crate::store::{CollectionLoad, CollectionStore};
use crate::types::{Chunk, CollectionState, CollectionStatus, Intent, RetrievalResult, ScoredChunk};
use docroute_core::config::RetrievalConfig;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Map a non-negative distance to a relevance score in (0, 1].
pub fn relevance_score(distance: f32) -> f32 {
    1.0 / (1.0 + distance.max(0.0))
}

/// Merge candidates from several collections into the global top `k`.
///
/// Candidates are ordered by ascending distance. Ties keep their input
/// order, so earlier collections win. Non-finite distances are dropped.
pub fn fuse(mut candidates: Vec<(Chunk, f32)>, k: usize) -> Vec<ScoredChunk> {
    candidates.retain(|(chunk, distance)| {
        if distance.is_finite() {
            return true;
        }
        warn!("Dropping candidate '{}' with distance {}", chunk.id, distance);
        false
    });
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
    candidates
        .into_iter()
        .take(k)
        .map(|(chunk, distance)| ScoredChunk {
            chunk,
            score: relevance_score(distance),
        })
        .collect()
}

/// Collection names for each intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRoutes {
    pub regulatory: String,
    pub organization: String,
}

impl CollectionRoutes {
    /// Collections to search, in search order.
    pub fn for_intent(&self, intent: Intent) -> Vec<&str> {
        match intent {
            Intent::Regulatory => vec![self.regulatory.as_str()],
            Intent::Organization => vec![self.organization.as_str()],
            Intent::General => vec![self.regulatory.as_str(), self.organization.as_str()],
        }
    }
}

impl From<&RetrievalConfig> for CollectionRoutes {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            regulatory: config.regulatory_collection.clone(),
            organization: config.organization_collection.clone(),
        }
    }
}

impl Default for CollectionRoutes {
    fn default() -> Self {
        (&RetrievalConfig::default()).into()
    }
}

pub struct Retriever {
    store: Arc<dyn CollectionStore>,
    routes: CollectionRoutes,
}

impl Retriever {
    pub fn new(store: Arc<dyn CollectionStore>, routes: CollectionRoutes) -> Self {
        Self { store, routes }
    }

    pub fn routes(&self) -> &CollectionRoutes {
        &self.routes
    }

    /// Search the collections routed for `intent` and fuse the results.
    ///
    /// Each collection is asked for `2k` candidates. Unavailable or failing
    /// collections are recorded and skipped; this never returns an error.
    pub async fn retrieve(
        &self,
        query: &str,
        intent: Intent,
        k: usize,
        api_key: Option<&str>,
    ) -> RetrievalResult {
        let per_collection = k.saturating_mul(2);
        let mut candidates = Vec::new();
        let mut collections = Vec::new();

        for name in self.routes.for_intent(intent) {
            let state = match self.store.load(name, api_key).await {
                CollectionLoad::Ready(collection) => {
                    match collection.search(query, per_collection).await {
                        Ok(hits) => {
                            debug!("Collection '{}' gave {} candidates", name, hits.len());
                            let state = CollectionState::Searched {
                                candidates: hits.len(),
                            };
                            candidates.extend(hits);
                            state
                        }
                        Err(e) => {
                            warn!("Search failed on collection '{}': {}", name, e);
                            CollectionState::Failed(e.to_string())
                        }
                    }
                }
                CollectionLoad::Unavailable(reason) => {
                    info!("Collection '{}' unavailable: {}", name, reason);
                    CollectionState::Unavailable(reason)
                }
            };
            collections.push(CollectionStatus {
                name: name.to_string(),
                state,
            });
        }

        let chunks = fuse(candidates, k);
        let scores: Vec<f32> = chunks.iter().map(|c| c.score).collect();
        let mode = decide_mode(&scores, intent);

        debug!(intent = %intent, mode = %mode, hits = chunks.len(), "Retrieval complete");

        RetrievalResult {
            chunks,
            mode,
            collections,
        }
    }
}
