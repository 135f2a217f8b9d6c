//! Status command handler.

use clap::Args;
use docroute_core::{config::AppConfig, AppResult};
use docroute_knowledge::{read_manifest, CollectionLoad, CollectionRoutes, CollectionStore, LanceStore};
use serde_json::json;

/// Show collection availability and build manifests
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing status command");

        let store = LanceStore::new(config.data_dir(), config.embedding.clone());
        let routes = CollectionRoutes::from(&config.retrieval);
        let mut report = Vec::new();

        for name in [routes.regulatory.as_str(), routes.organization.as_str()] {
            let availability = match store.load(name, config.api_key.as_deref()).await {
                CollectionLoad::Ready(_) => "ready".to_string(),
                CollectionLoad::Unavailable(reason) => reason.to_string(),
            };
            let rows = store.count(name).await.unwrap_or_else(|e| {
                tracing::warn!("Cannot count rows in '{}': {}", name, e);
                None
            });
            let manifest = read_manifest(&store.collection_dir(name)).unwrap_or_else(|e| {
                tracing::warn!("Cannot read manifest for '{}': {}", name, e);
                None
            });

            if self.json {
                report.push(json!({
                    "collection": name,
                    "availability": availability,
                    "rows": rows,
                    "manifest": manifest,
                }));
                continue;
            }

            println!("{}: {}", name, availability);
            if let Some(rows) = rows {
                println!("  rows: {}", rows);
            }
            if let Some(m) = manifest {
                println!(
                    "  built: {} from {} sources ({} / {}, {} dims)",
                    m.built_at.to_rfc3339(),
                    m.sources_count,
                    m.embedding_provider,
                    m.embedding_model,
                    m.dimensions
                );
            }
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Ok(())
    }
}
