/// Outbound collaborator abstractions
///
/// Every network dependency of the engine sits behind one of these traits so
/// the pipeline can be exercised against mocks. The reqwest-backed
/// implementations live in the sibling modules; all of them are constructed
/// with a bounded request timeout.
use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{AnalyticsEvent, Answer, CandidateMetadata, ScoredItem, SoftFilters},
};

pub mod metadata;
pub mod preference_llm;
pub mod vector_search;

/// Black-box similarity index. Returns up to `top_k` items ranked by
/// descending score; ranking and tie order are the index's own and are
/// never re-sorted by this engine. Filters are advisory.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SimilarityIndex: Send + Sync {
    async fn search(
        &self,
        text: &str,
        filters: &SoftFilters,
        top_k: usize,
    ) -> AppResult<Vec<ScoredItem>>;
}

/// Display-metadata lookup. Failures are non-fatal: callers degrade to
/// bare candidates.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, item_ids: &[String]) -> AppResult<HashMap<String, CandidateMetadata>>;
}

/// Optional LLM-backed preference-text collaborator. Best-effort: callers
/// fall back to a deterministic template when it is absent or failing.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PreferenceWriter: Send + Sync {
    async fn preference_text(&self, answers: &[Answer], domain: &str) -> AppResult<String>;
}

/// Fire-and-forget analytics. Errors are logged by the caller's spawn
/// wrapper and never reach the primary result.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn record(&self, event: AnalyticsEvent) -> AppResult<()>;
}

/// Default sink: structured log lines only
pub struct TracingSink;

#[async_trait::async_trait]
impl AnalyticsSink for TracingSink {
    async fn record(&self, event: AnalyticsEvent) -> AppResult<()> {
        tracing::info!(event = ?event, "analytics");
        Ok(())
    }
}
