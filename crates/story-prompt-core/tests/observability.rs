//! Observability tests for Story Prompt request tracing.
//!
//! These verify that the emission helpers and the request span can be used
//! under a capturing subscriber and that dispatch logs its outcome.

use story_prompt_core::api::{handle_line, Request};
use story_prompt_core::obs::{
    emit_match_completed, emit_merge_applied, emit_merge_previewed, emit_prompt_built,
    emit_request_failed,
};
use story_prompt_core::{dispatch, MergeStats, MergeSummary, RequestSpan};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_match_completed_logs_counts() {
    emit_match_completed(120, 4, 2);
    assert!(logs_contain("match.completed"));
}

#[traced_test]
#[test]
fn test_emit_merge_events() {
    emit_merge_previewed(&MergeSummary {
        new: 1,
        update: 1,
        skip: 0,
    });
    emit_merge_applied(
        &MergeStats {
            added: 1,
            updated: 0,
            skipped: 1,
        },
        2,
    );
    assert!(logs_contain("merge.previewed"));
    assert!(logs_contain("merge.applied"));
}

#[traced_test]
#[test]
fn test_emit_prompt_built_logs_kind() {
    emit_prompt_built("extraction", 2048);
    assert!(logs_contain("prompt.built"));
    assert!(logs_contain("extraction"));
}

#[traced_test]
#[test]
fn test_emit_request_failed_logs_warning() {
    emit_request_failed("merge_preview", &"Invalid key");
    assert!(logs_contain("request.failed"));
}

#[traced_test]
#[test]
fn test_request_span_tags_events() {
    let span = RequestSpan::enter("req-span-1", "match");
    emit_match_completed(10, 1, 1);
    drop(span);
    assert!(logs_contain("req-span-1"));
}

#[traced_test]
#[test]
fn test_failed_dispatch_is_logged() {
    let request: Request = serde_json::from_value(serde_json::json!({
        "op": "merge_apply",
        "current": {},
        "incoming": {"": {"type": "item", "desc": "nameless"}},
    }))
    .unwrap();
    assert!(dispatch(request).is_err());
    assert!(logs_contain("merge_apply"));
}

#[traced_test]
#[test]
fn test_bad_line_is_logged() {
    let envelope = handle_line("not json", 1024).unwrap();
    assert!(!envelope.ok);
    assert!(logs_contain("request.failed"));
}
