//! Eval command handler.
//!
//! Runs a fixed set of queries covering each intent and prints how they
//! were routed.

use clap::Args;
use docroute_core::{config::AppConfig, AppResult};
use docroute_knowledge::{RagRequest, RagService};

/// Canned queries: one regulatory, one organization, one general.
pub const EVAL_QUERIES: [&str; 3] = [
    "What is the NEC requirement for GFCI outlets in kitchens?",
    "What services does Wattmonk provide?",
    "Tell me a joke about electricity.",
];

/// Number of top documents shown per query.
const SHOWN_DOCS: usize = 3;

/// Run the canned evaluation queries
#[derive(Args, Debug)]
pub struct EvalCommand {
    /// Credential override for the evaluation requests
    #[arg(long, env = "DOCROUTE_REQUEST_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl EvalCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing eval command");

        let service = RagService::from_config(config);
        let mut results = Vec::with_capacity(EVAL_QUERIES.len());

        for query in EVAL_QUERIES {
            let request = RagRequest {
                query: Some(query.to_string()),
                api_key: self.api_key.clone(),
                ..Default::default()
            };
            let response = service.answer(request).await?;

            if self.json {
                results.push(serde_json::json!({
                    "query": query,
                    "intent": response.intent,
                    "mode": response.mode,
                    "docs": response.docs.len(),
                    "top": &response.docs[..response.docs.len().min(SHOWN_DOCS)],
                }));
                continue;
            }

            println!("Query: {}", query);
            println!(
                "  intent: {}  mode: {}  docs: {}",
                response.intent,
                response.mode,
                response.docs.len()
            );
            for doc in response.docs.iter().take(SHOWN_DOCS) {
                let preview: String = doc.text.chars().take(120).collect();
                println!(
                    "  [{}] {:.3} {} | {}",
                    doc.id,
                    doc.score,
                    if doc.file.is_empty() { &doc.source } else { &doc.file },
                    preview.replace('\n', " ")
                );
            }
            println!();
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }

        Ok(())
    }
}
