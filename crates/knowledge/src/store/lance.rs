//! LanceDB-backed collections.
//!
//! Each collection lives in its own database directory under the store
//! root and holds a single `chunks` table. An empty collection is a
//! directory without that table.

use super::{Collection, CollectionLoad, CollectionStore, Unavailable};
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::types::{Chunk, Metadata};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use docroute_core::config::EmbeddingConfig;
use docroute_core::{AppError, AppResult};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Table;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, RwLock};
use tracing::{debug, info, warn};

/// Table name inside each collection database.
pub const CHUNKS_TABLE: &str = "chunks";

const DISTANCE_COLUMN: &str = "_distance";

/// Opened tables shared by every store in the process, keyed by
/// collection directory.
static TABLES: LazyLock<RwLock<HashMap<PathBuf, Table>>> = LazyLock::new(Default::default);

/// Directory-per-collection LanceDB store.
pub struct LanceStore {
    root: PathBuf,
    embedding: EmbeddingConfig,
}

impl LanceStore {
    pub fn new(root: impl Into<PathBuf>, embedding: EmbeddingConfig) -> Self {
        Self {
            root: root.into(),
            embedding,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn embedding(&self) -> &EmbeddingConfig {
        &self.embedding
    }

    pub fn collection_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Replace a collection with `chunks` and their `embeddings`.
    ///
    /// The new contents are written to a staging directory next to the
    /// collection and swapped in only once complete, so a failed rebuild
    /// leaves the previous collection in place. With no chunks, only the
    /// directory is created and later loads report it as empty.
    pub async fn write_collection(
        &self,
        name: &str,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> AppResult<()> {
        if chunks.len() != embeddings.len() {
            return Err(AppError::Store(format!(
                "Got {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }
        let batch = if chunks.is_empty() {
            None
        } else {
            Some(chunks_to_batch(chunks, embeddings, self.embedding.dimensions)?)
        };

        let dir = self.collection_dir(name);
        let staging = self.root.join(format!(".{}.staging", name));
        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }
        std::fs::create_dir_all(&staging)?;

        if let Some(batch) = batch {
            if let Err(e) = create_chunks_table(&staging, batch).await {
                if let Err(cleanup) = std::fs::remove_dir_all(&staging) {
                    warn!("Failed to remove staging directory {:?}: {}", staging, cleanup);
                }
                return Err(e);
            }
        }

        replace_dir(&staging, &dir, &self.root.join(format!(".{}.old", name)))?;
        invalidate(&dir);

        if chunks.is_empty() {
            info!("Collection '{}' has no chunks; wrote empty collection", name);
        } else {
            info!("Wrote {} chunks to collection '{}'", chunks.len(), name);
        }
        Ok(())
    }

    /// Number of stored chunks, or `None` when the collection was never built.
    pub async fn count(&self, name: &str) -> AppResult<Option<usize>> {
        let dir = self.collection_dir(name);
        if !dir.is_dir() {
            return Ok(None);
        }
        match self.open_table(name, &dir).await? {
            Some(table) => {
                let rows = table
                    .count_rows(None)
                    .await
                    .map_err(|e| AppError::Store(format!("Failed to count rows: {}", e)))?;
                Ok(Some(rows))
            }
            None => Ok(Some(0)),
        }
    }

    /// Open the chunks table, consulting the cache first. `None` means the
    /// collection exists but holds no table.
    async fn open_table(&self, name: &str, dir: &Path) -> AppResult<Option<Table>> {
        if let Some(table) = cached(dir) {
            return Ok(Some(table));
        }

        let conn = connect(dir).await?;
        let names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::Store(format!("Failed to list tables: {}", e)))?;
        if !names.iter().any(|n| n == CHUNKS_TABLE) {
            return Ok(None);
        }

        let table = conn
            .open_table(CHUNKS_TABLE)
            .execute()
            .await
            .map_err(|e| AppError::Store(format!("Failed to open table: {}", e)))?;

        // Concurrent loads may race here; the first insert wins.
        let mut tables = TABLES.write().unwrap_or_else(|p| p.into_inner());
        let table = tables.entry(dir.to_path_buf()).or_insert(table).clone();
        debug!("Opened collection '{}'", name);
        Ok(Some(table))
    }
}

#[async_trait]
impl CollectionStore for LanceStore {
    async fn load(&self, name: &str, api_key: Option<&str>) -> CollectionLoad {
        let dir = self.collection_dir(name);
        if !dir.is_dir() {
            return CollectionLoad::Unavailable(Unavailable::Missing);
        }

        let embedder = match create_provider(&self.embedding, api_key) {
            Ok(p) => p,
            Err(AppError::MissingCredential(_)) => {
                return CollectionLoad::Unavailable(Unavailable::MissingCredential)
            }
            Err(e) => return CollectionLoad::Unavailable(Unavailable::Backend(e.to_string())),
        };

        match self.open_table(name, &dir).await {
            Ok(Some(table)) => CollectionLoad::Ready(Arc::new(LanceCollection {
                name: name.to_string(),
                table,
                embedder,
            })),
            Ok(None) => CollectionLoad::Unavailable(Unavailable::Empty),
            Err(e) => CollectionLoad::Unavailable(Unavailable::Corrupt(e.to_string())),
        }
    }
}

/// A loaded LanceDB collection bound to the request's embedder.
pub struct LanceCollection {
    name: String,
    table: Table,
    embedder: Arc<dyn EmbeddingProvider>,
}

#[async_trait]
impl Collection for LanceCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str, k: usize) -> AppResult<Vec<(Chunk, f32)>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed(query).await?;
        if query_vec.len() != self.embedder.dimensions() {
            return Err(AppError::Store(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.embedder.dimensions(),
                query_vec.len()
            )));
        }

        let batches = self
            .table
            .query()
            .nearest_to(query_vec)
            .map_err(|e| AppError::Store(format!("Failed to create query: {}", e)))?
            .limit(k)
            .execute()
            .await
            .map_err(|e| AppError::Store(format!("Failed to execute search: {}", e)))?
            .try_collect::<Vec<RecordBatch>>()
            .await
            .map_err(|e| AppError::Store(format!("Failed to collect results: {}", e)))?;

        let mut hits = Vec::new();
        for batch in &batches {
            hits.extend(batch_rows(batch)?);
        }
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits.truncate(k);

        debug!("Collection '{}' returned {} hits", self.name, hits.len());
        Ok(hits)
    }
}

fn cached(dir: &Path) -> Option<Table> {
    let tables = TABLES.read().unwrap_or_else(|p| p.into_inner());
    tables.get(dir).cloned()
}

fn invalidate(dir: &Path) {
    let mut tables = TABLES.write().unwrap_or_else(|p| p.into_inner());
    tables.remove(dir);
}

/// Move `staging` into place at `dir`, parking any previous contents at
/// `parked` until the swap has succeeded.
fn replace_dir(staging: &Path, dir: &Path, parked: &Path) -> AppResult<()> {
    if parked.exists() {
        std::fs::remove_dir_all(parked)?;
    }
    let had_previous = dir.exists();
    if had_previous {
        std::fs::rename(dir, parked)?;
    }

    if let Err(e) = std::fs::rename(staging, dir) {
        if had_previous {
            std::fs::rename(parked, dir)?;
        }
        return Err(e.into());
    }

    if had_previous {
        if let Err(e) = std::fs::remove_dir_all(parked) {
            warn!("Failed to remove previous collection {:?}: {}", parked, e);
        }
    }
    Ok(())
}

async fn create_chunks_table(dir: &Path, batch: RecordBatch) -> AppResult<()> {
    let schema = batch.schema();
    let conn = connect(dir).await?;
    conn.create_table(
        CHUNKS_TABLE,
        RecordBatchIterator::new(vec![Ok(batch)], schema),
    )
    .execute()
    .await
    .map_err(|e| AppError::Store(format!("Failed to create table: {}", e)))?;
    Ok(())
}

async fn connect(dir: &Path) -> AppResult<lancedb::Connection> {
    let uri = dir.to_string_lossy().to_string();
    lancedb::connect(&uri)
        .execute()
        .await
        .map_err(|e| AppError::Store(format!("Failed to connect to LanceDB: {}", e)))
}

fn schema(dimensions: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("metadata", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dimensions as i32,
            ),
            false,
        ),
    ]))
}

fn chunks_to_batch(chunks: &[Chunk], embeddings: &[Vec<f32>], dimensions: usize) -> AppResult<RecordBatch> {
    if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
        return Err(AppError::Store(format!(
            "Embedding dimension mismatch: expected {}, got {}",
            dimensions,
            bad.len()
        )));
    }

    let metadata = chunks
        .iter()
        .map(|c| serde_json::to_string(&c.metadata))
        .collect::<Result<Vec<_>, _>>()?;

    let ids = StringArray::from_iter_values(chunks.iter().map(|c| c.id.as_str()));
    let texts = StringArray::from_iter_values(chunks.iter().map(|c| c.text.as_str()));
    let sources = StringArray::from_iter_values(chunks.iter().map(|c| c.source.as_str()));
    let metadata = StringArray::from_iter_values(metadata.iter().map(String::as_str));

    let values = Float32Array::from_iter_values(embeddings.iter().flatten().copied());
    let vectors = FixedSizeListArray::new(
        Arc::new(Field::new("item", DataType::Float32, true)),
        dimensions as i32,
        Arc::new(values),
        None,
    );

    RecordBatch::try_new(
        schema(dimensions),
        vec![
            Arc::new(ids),
            Arc::new(texts),
            Arc::new(sources),
            Arc::new(metadata),
            Arc::new(vectors),
        ],
    )
    .map_err(|e| AppError::Store(format!("Failed to create RecordBatch: {}", e)))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| AppError::Store(format!("Invalid {} column", name)))
}

fn batch_rows(batch: &RecordBatch) -> AppResult<Vec<(Chunk, f32)>> {
    let ids = string_column(batch, "id")?;
    let texts = string_column(batch, "text")?;
    let sources = string_column(batch, "source")?;
    let metadata = string_column(batch, "metadata")?;
    let distances = batch
        .column_by_name(DISTANCE_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| AppError::Store("Search result has no distance column".to_string()))?;

    let mut rows = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let meta: Metadata = match serde_json::from_str(metadata.value(i)) {
            Ok(m) => m,
            Err(e) => {
                warn!("Skipping row {} with unreadable metadata: {}", i, e);
                continue;
            }
        };
        if distances.is_null(i) || !distances.value(i).is_finite() {
            warn!("Skipping row {} without a usable distance", i);
            continue;
        }

        let chunk = Chunk {
            id: ids.value(i).to_string(),
            text: texts.value(i).to_string(),
            source: sources.value(i).to_string(),
            metadata: meta,
        };
        rows.push((chunk, distances.value(i).max(0.0)));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use tempfile::TempDir;

    fn trigram_config() -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 64,
            ..Default::default()
        }
    }

    async fn embed(texts: &[&str]) -> Vec<Vec<f32>> {
        let provider = TrigramProvider::new(64);
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        provider.embed_batch(&owned).await.unwrap()
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let dir = TempDir::new().unwrap();
        let store = LanceStore::new(dir.path(), trigram_config());

        assert!(matches!(
            store.load("nec", None).await,
            CollectionLoad::Unavailable(Unavailable::Missing)
        ));
        assert_eq!(store.count("nec").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let dir = TempDir::new().unwrap();
        let store = LanceStore::new(dir.path(), trigram_config());
        store.write_collection("nec", &[], &[]).await.unwrap();

        assert!(matches!(
            store.load("nec", None).await,
            CollectionLoad::Unavailable(Unavailable::Empty)
        ));
        assert_eq!(store.count("nec").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_gemini_without_key_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = LanceStore::new(dir.path(), EmbeddingConfig::default());
        std::fs::create_dir_all(store.collection_dir("nec")).unwrap();

        assert!(matches!(
            store.load("nec", None).await,
            CollectionLoad::Unavailable(Unavailable::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn test_write_and_search() {
        let dir = TempDir::new().unwrap();
        let store = LanceStore::new(dir.path(), trigram_config());

        let texts = [
            "Grounding electrode conductors shall be copper or aluminum.",
            "Branch circuit overcurrent protection ratings.",
        ];
        let chunks = vec![
            Chunk::new("a", texts[0], "nec.txt").with_metadata("file", "nec.txt"),
            Chunk::new("b", texts[1], "nec.txt").with_metadata("file", "nec.txt"),
        ];
        store
            .write_collection("nec", &chunks, &embed(&texts).await)
            .await
            .unwrap();

        let CollectionLoad::Ready(collection) = store.load("nec", None).await else {
            panic!("collection should load");
        };
        let hits = collection.search("grounding electrode", 2).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.id, "a");
        assert_eq!(hits[0].0.metadata_str("file"), Some("nec.txt"));
        assert!(hits[0].1 <= hits[1].1);
        assert_eq!(store.count("nec").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_rebuild_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let store = LanceStore::new(dir.path(), trigram_config());

        let first = vec![Chunk::new("old", "old text about meters", "a.txt")];
        store
            .write_collection("wattmonk", &first, &embed(&["old text about meters"]).await)
            .await
            .unwrap();
        assert!(store.load("wattmonk", None).await.is_ready());

        let second = vec![
            Chunk::new("n1", "permit plan sets", "b.txt"),
            Chunk::new("n2", "turnaround in two days", "b.txt"),
        ];
        store
            .write_collection(
                "wattmonk",
                &second,
                &embed(&["permit plan sets", "turnaround in two days"]).await,
            )
            .await
            .unwrap();

        assert_eq!(store.count("wattmonk").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        let store = LanceStore::new(dir.path(), trigram_config());
        let chunks = vec![Chunk::new("a", "text", "s")];

        let err = store
            .write_collection("nec", &chunks, &[vec![0.0; 3]])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"));
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_collection() {
        let dir = TempDir::new().unwrap();
        let store = LanceStore::new(dir.path(), trigram_config());

        let texts = ["Service conductors sizing.", "Panelboard working clearances."];
        let chunks = vec![
            Chunk::new("a", texts[0], "nec.txt"),
            Chunk::new("b", texts[1], "nec.txt"),
        ];
        store
            .write_collection("nec", &chunks, &embed(&texts).await)
            .await
            .unwrap();

        let bad = vec![Chunk::new("c", "replacement", "nec.txt")];
        assert!(store
            .write_collection("nec", &bad, &[vec![0.0; 3]])
            .await
            .is_err());

        assert!(store.load("nec", None).await.is_ready());
        assert_eq!(store.count("nec").await.unwrap(), Some(2));

        let entries: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["nec".to_string()]);
    }

    #[tokio::test]
    async fn test_table_cache_is_shared_between_stores() {
        let dir = TempDir::new().unwrap();
        let reader = LanceStore::new(dir.path(), trigram_config());
        let writer = LanceStore::new(dir.path(), trigram_config());

        let first = vec![Chunk::new("one", "inverter sizing", "w.txt")];
        writer
            .write_collection("wattmonk", &first, &embed(&["inverter sizing"]).await)
            .await
            .unwrap();
        assert_eq!(reader.count("wattmonk").await.unwrap(), Some(1));
        assert!(cached(&writer.collection_dir("wattmonk")).is_some());

        let second = vec![
            Chunk::new("one", "inverter sizing", "w.txt"),
            Chunk::new("two", "stamping turnaround", "w.txt"),
        ];
        writer
            .write_collection(
                "wattmonk",
                &second,
                &embed(&["inverter sizing", "stamping turnaround"]).await,
            )
            .await
            .unwrap();
        assert_eq!(reader.count("wattmonk").await.unwrap(), Some(2));
    }
}
