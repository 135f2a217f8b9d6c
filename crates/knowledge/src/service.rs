//! Request-level composition of pipeline and summarizer.

use crate::boundary::{RagRequest, RagResponse};
use crate::pipeline::{Pipeline, RequestContext};
use crate::retriever::{CollectionRoutes, Retriever};
use crate::store::{CollectionStore, LanceStore};
use crate::summarizer::Summarizer;
use docroute_core::{AppConfig, AppResult};
use std::sync::Arc;
use tracing::instrument;

/// Answers routing requests. Holds no per-request state.
pub struct RagService {
    pipeline: Pipeline,
    summarizer: Summarizer,
    default_api_key: Option<String>,
}

impl RagService {
    pub fn new(pipeline: Pipeline, summarizer: Summarizer, default_api_key: Option<String>) -> Self {
        Self {
            pipeline,
            summarizer,
            default_api_key,
        }
    }

    /// Service over `store` using the retrieval and summary settings in `config`.
    pub fn with_store(config: &AppConfig, store: Arc<dyn CollectionStore>) -> Self {
        let retriever = Retriever::new(store, CollectionRoutes::from(&config.retrieval));
        Self::new(
            Pipeline::new(retriever, config.retrieval.top_k),
            Summarizer::new(config.memory_summary, &config.chat),
            config.api_key.clone(),
        )
    }

    /// Service over the LanceDB collections under the configured data dir.
    pub fn from_config(config: &AppConfig) -> Self {
        let store = LanceStore::new(config.data_dir(), config.embedding.clone());
        Self::with_store(config, Arc::new(store))
    }

    /// Classify, retrieve and optionally summarize for one request.
    ///
    /// The request's `apiKey` overrides the configured credential for this
    /// call only.
    #[instrument(skip_all)]
    pub async fn answer(&self, request: RagRequest) -> AppResult<RagResponse> {
        let api_key = request
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| self.default_api_key.clone());

        let mut ctx = RequestContext::new(request.query_text(), api_key);
        self.pipeline.run(&mut ctx).await?;

        let messages = request.messages.unwrap_or_default();
        let memory_summary = self.summarizer.summarize(&messages, ctx.api_key()).await;

        Ok(RagResponse::from_context(&ctx, memory_summary))
    }
}
