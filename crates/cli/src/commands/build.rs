//! Build command handler.

use clap::Args;
use docroute_core::{config::AppConfig, AppResult};
use docroute_knowledge::embeddings::create_provider;
use docroute_knowledge::{IndexBuilder, LanceStore};
use std::path::PathBuf;

/// Build (or rebuild) a collection from documents
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Collection name (e.g. nec, wattmonk)
    pub collection: String,

    /// Files or directories to index (.txt, .md, .html, .pdf)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Override the configured maximum chunk count
    #[arg(long)]
    pub max_chunks: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl BuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing build command for collection '{}'", self.collection);

        let embedder = create_provider(&config.embedding, config.api_key.as_deref())?;
        let store = LanceStore::new(config.data_dir(), config.embedding.clone());

        let mut index = config.index.clone();
        if self.max_chunks.is_some() {
            index.max_chunks = self.max_chunks;
        }

        let manifest = IndexBuilder::new(&store, embedder, index)
            .build(&self.collection, &self.paths)
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        } else {
            println!(
                "Built '{}' from {} sources ({} chunks) at {}",
                manifest.collection,
                manifest.sources_count,
                manifest.chunks_count,
                store.collection_dir(&self.collection).display()
            );
            for skipped in &manifest.skipped_files {
                println!("  skipped: {}", skipped);
            }
        }

        Ok(())
    }
}
