//! Query command handler.
//!
//! Reads a request body from stdin (or builds one from flags), routes it,
//! and prints the JSON response on stdout.

use clap::Args;
use docroute_core::{config::AppConfig, AppError, AppResult};
use docroute_knowledge::{handle_request, RagService};
use std::io::Read;

/// Route one request and print the JSON response
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// Query text; when omitted, a JSON request body is read from stdin
    #[arg(short, long)]
    pub query: Option<String>,

    /// Credential override for this request only
    #[arg(long, env = "DOCROUTE_REQUEST_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Pretty-print the response
    #[arg(long)]
    pub pretty: bool,
}

impl QueryCommand {
    fn request_body(&self, read_stdin: impl FnOnce() -> std::io::Result<String>) -> AppResult<String> {
        let body = match &self.query {
            Some(query) => serde_json::json!({ "query": query }).to_string(),
            None => read_stdin()?,
        };
        Ok(match &self.api_key {
            Some(key) => with_api_key(&body, key),
            None => body,
        })
    }

    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing query command");

        let body = self.request_body(|| {
            let mut body = String::new();
            std::io::stdin().read_to_string(&mut body)?;
            Ok(body)
        })?;
        let service = RagService::from_config(config);
        let response = handle_request(&service, &body).await;

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&response.body)?
        } else {
            response.body.to_string()
        };
        println!("{}", rendered);

        if response.is_success() {
            Ok(())
        } else {
            Err(AppError::Request(format!(
                "Request failed with status {}",
                response.status
            )))
        }
    }
}

/// Add `apiKey` to a JSON object body unless it already carries one.
///
/// Bodies that are not JSON objects are returned unchanged so the request
/// boundary reports them.
fn with_api_key(body: &str, key: &str) -> String {
    let parsed = if body.trim().is_empty() {
        Ok(serde_json::Value::Object(Default::default()))
    } else {
        serde_json::from_str::<serde_json::Value>(body)
    };
    match parsed {
        Ok(serde_json::Value::Object(mut map)) => {
            map.entry("apiKey")
                .or_insert_with(|| serde_json::Value::String(key.to_string()));
            serde_json::Value::Object(map).to_string()
        }
        _ => body.to_string(),
    }
}
