use std::time::Duration;

use crate::catalog::Question;
use crate::models::{Answer, ScoredItem, SoftFilters};
use crate::services::providers::SimilarityIndex;

/// Derives soft filters from the answered options' hints. Purely a lookup:
/// an "era" answer maps to its fixed year range, a "flavor" answer to its
/// genre hint, a "commitment" answer to a runtime bound. Answers without
/// hints contribute nothing.
pub fn derive_filters(answers: &[Answer], questions: &[Question]) -> SoftFilters {
    let mut filters = SoftFilters::default();

    for question in questions {
        let Some(answer) = answers.iter().find(|a| a.question_id == question.id) else {
            continue;
        };
        let Some(option) = question.option(&answer.option_id) else {
            continue;
        };

        if let Some((min, max)) = option.year_range {
            filters.year_min = Some(min);
            filters.year_max = Some(max);
        }
        if let Some(genre) = &option.genre_hint {
            filters.genre_hint = Some(genre.clone());
        }
        if let Some(min) = option.min_runtime {
            filters.min_runtime = Some(min);
        }
        if let Some(max) = option.max_runtime {
            filters.max_runtime = Some(max);
        }
    }

    filters
}

/// Runs similarity search with a bounded timeout.
///
/// Upstream failure or timeout degrades to an empty candidate list: a
/// reduced-quality response, never a request failure. The index's own
/// ranking and tie order are preserved; a response longer than `top_k` is
/// truncated, a shorter one passed through.
pub async fn run_search(
    index: &dyn SimilarityIndex,
    text: &str,
    filters: &SoftFilters,
    top_k: usize,
    timeout: Duration,
) -> Vec<ScoredItem> {
    match tokio::time::timeout(timeout, index.search(text, filters, top_k)).await {
        Ok(Ok(mut hits)) => {
            hits.truncate(top_k);
            tracing::debug!(returned = hits.len(), requested = top_k, "Similarity search completed");
            hits
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Similarity search failed, degrading to empty result");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(
                timeout_ms = timeout.as_millis() as u64,
                "Similarity search timed out, degrading to empty result"
            );
            Vec::new()
        }
    }
}
