//! Structured observability hooks for Story Prompt requests.
//!
//! This module provides:
//! - Request-scoped tracing spans via the `RequestSpan` RAII guard
//! - Emission functions for each operation's outcome
//!
//! Events are emitted at `info!` level; failures at `warn!`.

use story_merge::{MergeStats, MergeSummary};
use tracing::info;

/// RAII guard that enters a request-scoped span for the duration of a request.
///
/// ```ignore
/// let _span = RequestSpan::enter("req-1", "merge_preview");
/// // every event below carries request_id = "req-1", op = "merge_preview"
/// ```
pub struct RequestSpan {
    _span: tracing::span::EnteredSpan,
}

impl RequestSpan {
    pub fn enter(request_id: &str, op: &str) -> Self {
        let span = tracing::info_span!("story_prompt.request", request_id = %request_id, op = %op);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: key matching finished.
pub fn emit_match_completed(text_len: usize, candidates: usize, matched: usize) {
    info!(
        event = "match.completed",
        text_len = text_len,
        candidates = candidates,
        matched = matched,
    );
}

/// Emit event: merge preview classified the incoming snapshot.
pub fn emit_merge_previewed(summary: &MergeSummary) {
    info!(
        event = "merge.previewed",
        new = summary.new,
        update = summary.update,
        skip = summary.skip,
    );
}

/// Emit event: merge applied.
pub fn emit_merge_applied(stats: &MergeStats, merged_len: usize) {
    info!(
        event = "merge.applied",
        added = stats.added,
        updated = stats.updated,
        skipped = stats.skipped,
        merged_len = merged_len,
    );
}

/// Emit event: a prompt of `kind` (`augmented` or `extraction`) was built.
pub fn emit_prompt_built(kind: &str, prompt_len: usize) {
    info!(event = "prompt.built", kind = %kind, prompt_len = prompt_len);
}

/// Emit event: a request was rejected (warning level).
pub fn emit_request_failed(op: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "request.failed", op = %op, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_span_create() {
        let _span = RequestSpan::enter("test-request", "match");
    }
}
