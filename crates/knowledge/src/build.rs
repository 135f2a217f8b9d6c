//! Offline collection build: parse, split, embed and persist.

use crate::chunker::split_documents;
use crate::embeddings::{embed_in_batches, EmbeddingProvider};
use crate::parser::{collect_files, parse_file, SourceDocument};
use crate::store::LanceStore;
use chrono::{DateTime, Utc};
use docroute_core::config::IndexConfig;
use docroute_core::AppResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Summary of a completed build, persisted beside the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildManifest {
    pub collection: String,
    pub sources_count: usize,
    pub chunks_count: usize,
    pub skipped_files: Vec<String>,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub dimensions: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub built_at: DateTime<Utc>,
}

/// Read a collection's manifest, if one was written.
pub fn read_manifest(collection_dir: &Path) -> AppResult<Option<BuildManifest>> {
    let path = collection_dir.join(MANIFEST_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

pub struct IndexBuilder<'a> {
    store: &'a LanceStore,
    embedder: Arc<dyn EmbeddingProvider>,
    config: IndexConfig,
    batch_size: usize,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(store: &'a LanceStore, embedder: Arc<dyn EmbeddingProvider>, config: IndexConfig) -> Self {
        let batch_size = store.embedding().batch_size;
        Self {
            store,
            embedder,
            config,
            batch_size,
        }
    }

    /// Rebuild `collection` from the files under `paths`.
    ///
    /// Unreadable files are skipped with a warning and listed in the manifest.
    pub async fn build(&self, collection: &str, paths: &[PathBuf]) -> AppResult<BuildManifest> {
        let files = collect_files(paths)?;
        info!("Building '{}' from {} files", collection, files.len());

        let mut documents: Vec<SourceDocument> = Vec::with_capacity(files.len());
        let mut skipped_files = Vec::new();
        for file in &files {
            match parse_file(file) {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    warn!("Skipping {:?}: {}", file, e);
                    skipped_files.push(file.to_string_lossy().to_string());
                }
            }
        }

        let chunks = split_documents(&documents, &self.config)?;
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embed_in_batches(self.embedder.as_ref(), &texts, self.batch_size).await?;

        self.store.write_collection(collection, &chunks, &embeddings).await?;

        let manifest = BuildManifest {
            collection: collection.to_string(),
            sources_count: documents.len(),
            chunks_count: chunks.len(),
            skipped_files,
            embedding_provider: self.embedder.provider_name().to_string(),
            embedding_model: self.embedder.model_name().to_string(),
            dimensions: self.embedder.dimensions(),
            chunk_size: self.config.chunk_size,
            chunk_overlap: self.config.chunk_overlap,
            built_at: Utc::now(),
        };

        let manifest_path = self.store.collection_dir(collection).join(MANIFEST_FILE);
        std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;

        info!(
            "Built '{}': {} sources, {} chunks",
            collection, manifest.sources_count, manifest.chunks_count
        );
        Ok(manifest)
    }
}
