//! Per-request stage pipeline: classify, then retrieve.

use crate::intent::classify;
use crate::retriever::Retriever;
use crate::types::{Intent, Mode, RetrievalResult};
use docroute_core::{AppError, AppResult};
use std::fmt;
use tracing::Instrument;

/// State carried through the stages of one request.
pub struct RequestContext {
    pub query: String,
    api_key: Option<String>,
    pub intent: Option<Intent>,
    pub result: Option<RetrievalResult>,
}

impl RequestContext {
    pub fn new(query: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            query: query.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
            intent: None,
            result: None,
        }
    }

    /// Credential in effect for this request only.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Routing decision, ungrounded until retrieval has run.
    pub fn mode(&self) -> Mode {
        self.result.as_ref().map_or(Mode::Ungrounded, |r| r.mode)
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("query", &self.query)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("intent", &self.intent)
            .field("result", &self.result)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Retrieve,
    End,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::Retrieve => "retrieve",
            Stage::End => "end",
        }
    }

    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Start => Some(Stage::Retrieve),
            Stage::Retrieve => Some(Stage::End),
            Stage::End => None,
        }
    }
}

pub struct Pipeline {
    retriever: Retriever,
    top_k: usize,
}

impl Pipeline {
    pub fn new(retriever: Retriever, top_k: usize) -> Self {
        Self { retriever, top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Run every stage in order on `ctx`.
    pub async fn run(&self, ctx: &mut RequestContext) -> AppResult<()> {
        let mut stage = Some(Stage::Start);
        while let Some(current) = stage {
            let span = tracing::info_span!("stage", stage = current.name());
            self.run_stage(current, ctx).instrument(span).await?;
            stage = current.next();
        }
        Ok(())
    }

    async fn run_stage(&self, stage: Stage, ctx: &mut RequestContext) -> AppResult<()> {
        match stage {
            Stage::Start => {
                let intent = classify(&ctx.query);
                tracing::debug!(intent = %intent, "Classified query");
                ctx.intent = Some(intent);
            }
            Stage::Retrieve => {
                let intent = ctx
                    .intent
                    .ok_or_else(|| AppError::Pipeline("Retrieve stage reached without an intent".to_string()))?;
                let result = self
                    .retriever
                    .retrieve(&ctx.query, intent, self.top_k, ctx.api_key())
                    .await;
                ctx.result = Some(result);
            }
            Stage::End => {
                tracing::debug!(mode = %ctx.mode(), "Request complete");
            }
        }
        Ok(())
    }
}
