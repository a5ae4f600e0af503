//! Typed request/response boundary.
//!
//! Every transport (CLI, request loop) deserializes into [`Request`] once,
//! hands it to [`dispatch`], and serializes the [`Response`]. This is the
//! only place raw incoming memory is run through the import gate.

use std::collections::HashSet;
use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use story_memory::{parse_import_data, Memory};
use story_merge::{analyze, apply_merge, MergeClassification, MergeResult, MergeSummary};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StoryPromptError};
use crate::matcher::find_matches;
use crate::metrics::METRICS;
use crate::obs::{self, RequestSpan};
use crate::prompt::{build_augmented_prompt, build_extraction_prompt};

/// Find memory keys mentioned in `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRequest {
    pub text: String,
    pub memory: Memory,
}

/// Classify an incoming snapshot against the current memory.
///
/// `incoming` stays untyped until it has passed the import gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergePreviewRequest {
    pub current: Memory,
    pub incoming: Value,
}

/// Apply the selected part of an incoming snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeApplyRequest {
    pub current: Memory,
    pub incoming: Value,
    #[serde(default)]
    pub selected_new_keys: Vec<String>,
    #[serde(default)]
    pub selected_update_keys: Vec<String>,
}

/// Build the augmented continuation prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildPromptRequest {
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub matched_keys: Vec<String>,
    #[serde(default)]
    pub memory: Memory,
    #[serde(default)]
    pub instruction: Option<String>,
}

/// Build the extraction prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractPromptRequest {
    pub story: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// One operation, tagged by `"op"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Match(MatchRequest),
    MergePreview(MergePreviewRequest),
    MergeApply(MergeApplyRequest),
    BuildPrompt(BuildPromptRequest),
    ExtractPrompt(ExtractPromptRequest),
    Health,
}

impl Request {
    /// Wire name of the operation.
    pub fn op(&self) -> &'static str {
        match self {
            Request::Match(_) => "match",
            Request::MergePreview(_) => "merge_preview",
            Request::MergeApply(_) => "merge_apply",
            Request::BuildPrompt(_) => "build_prompt",
            Request::ExtractPrompt(_) => "extract_prompt",
            Request::Health => "health",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResponse {
    pub matched_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergePreviewResponse {
    #[serde(flatten)]
    pub classification: MergeClassification,
    pub summary: MergeSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptResponse {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub app: String,
    pub storage: String,
    pub backend: String,
    pub version: String,
}

impl HealthResponse {
    fn current() -> Self {
        HealthResponse {
            status: "healthy".to_string(),
            app: "Story Prompt".to_string(),
            storage: "caller-owned".to_string(),
            backend: "stateless calculations only".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// Result of a dispatched request, serialized without a tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Match(MatchResponse),
    MergePreview(MergePreviewResponse),
    MergeApply(MergeResult),
    Prompt(PromptResponse),
    Health(HealthResponse),
}

/// Run one request through the matching component.
pub fn dispatch(request: Request) -> Result<Response> {
    let op = request.op();
    let result = match request {
        Request::Match(req) => Ok(run_match(&req)),
        Request::MergePreview(req) => run_merge_preview(&req),
        Request::MergeApply(req) => run_merge_apply(&req),
        Request::BuildPrompt(req) => Ok(run_build_prompt(&req)),
        Request::ExtractPrompt(req) => Ok(run_extract_prompt(&req)),
        Request::Health => Ok(Response::Health(HealthResponse::current())),
    };

    if let Err(err) = &result {
        if matches!(err, StoryPromptError::Validation(_)) {
            METRICS.inc_validation_failures();
        }
        obs::emit_request_failed(op, err);
    }
    result
}

fn run_match(req: &MatchRequest) -> Response {
    METRICS.inc_matches();
    let matched_keys = find_matches(&req.text, &req.memory);
    obs::emit_match_completed(req.text.len(), req.memory.len(), matched_keys.len());
    Response::Match(MatchResponse { matched_keys })
}

fn run_merge_preview(req: &MergePreviewRequest) -> Result<Response> {
    let incoming = parse_import_data(&req.incoming)?;
    METRICS.inc_merge_previews();

    let classification = analyze(&req.current, &incoming);
    let summary = classification.summary();
    obs::emit_merge_previewed(&summary);

    Ok(Response::MergePreview(MergePreviewResponse {
        classification,
        summary,
    }))
}

fn run_merge_apply(req: &MergeApplyRequest) -> Result<Response> {
    let incoming = parse_import_data(&req.incoming)?;
    METRICS.inc_merges_applied();

    let new_keys: HashSet<String> = req.selected_new_keys.iter().cloned().collect();
    let update_keys: HashSet<String> = req.selected_update_keys.iter().cloned().collect();

    let result = apply_merge(&req.current, &incoming, &new_keys, &update_keys);
    obs::emit_merge_applied(&result.stats, result.merged.len());
    Ok(Response::MergeApply(result))
}

fn run_build_prompt(req: &BuildPromptRequest) -> Response {
    METRICS.inc_prompts_built();
    let prompt = build_augmented_prompt(
        &req.story,
        &req.matched_keys,
        &req.memory,
        req.instruction.as_deref(),
    );
    obs::emit_prompt_built("augmented", prompt.len());
    Response::Prompt(PromptResponse { prompt })
}

fn run_extract_prompt(req: &ExtractPromptRequest) -> Response {
    METRICS.inc_prompts_built();
    let prompt = build_extraction_prompt(&req.story, &req.types);
    obs::emit_prompt_built("extraction", prompt.len());
    Response::Prompt(PromptResponse { prompt })
}

// ---------------------------------------------------------------------------
// Envelopes for line-oriented transports
// ---------------------------------------------------------------------------

/// A request plus an optional caller-chosen correlation id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub request: Request,
}

/// Outcome of one envelope. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    pub id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl ResponseEnvelope {
    pub fn success(id: String, response: Response) -> Self {
        ResponseEnvelope {
            id,
            ok: true,
            result: Some(response),
            error: None,
            error_kind: None,
        }
    }

    pub fn failure(id: String, err: &StoryPromptError) -> Self {
        ResponseEnvelope {
            id,
            ok: false,
            result: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
        }
    }
}

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Dispatch an envelope inside a request span.
pub fn handle_envelope(envelope: RequestEnvelope) -> ResponseEnvelope {
    let id = envelope.id.unwrap_or_else(new_request_id);
    let _span = RequestSpan::enter(&id, envelope.request.op());

    match dispatch(envelope.request) {
        Ok(response) => ResponseEnvelope::success(id, response),
        Err(err) => ResponseEnvelope::failure(id, &err),
    }
}

/// Handle one line of a JSON-lines stream.
///
/// Returns `None` for blank lines. Oversized and unparseable lines are
/// answered with a failure envelope under a fresh id.
pub fn handle_line(line: &str, max_request_bytes: usize) -> Option<ResponseEnvelope> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.len() > max_request_bytes {
        return Some(reject_oversized(trimmed.len(), max_request_bytes));
    }

    match serde_json::from_str::<RequestEnvelope>(trimmed) {
        Ok(envelope) => Some(handle_envelope(envelope)),
        Err(err) => {
            debug!(error = %err, "request line did not parse");
            Some(reject_line(StoryPromptError::from(err)))
        }
    }
}

/// Handle one raw line of a JSON-lines stream.
///
/// Lines that are not valid UTF-8 are answered with an `io` failure
/// envelope; everything else goes through [`handle_line`].
pub fn handle_raw_line(line: &[u8], max_request_bytes: usize) -> Option<ResponseEnvelope> {
    match std::str::from_utf8(line) {
        Ok(text) => handle_line(text, max_request_bytes),
        Err(err) => {
            debug!(error = %err, "request line is not valid UTF-8");
            let err = io::Error::new(io::ErrorKind::InvalidData, err);
            Some(reject_line(StoryPromptError::from(err)))
        }
    }
}

/// Failure envelope for a line of `size` bytes that exceeds `limit`.
pub fn reject_oversized(size: usize, limit: usize) -> ResponseEnvelope {
    reject_line(StoryPromptError::RequestTooLarge { size, limit })
}

fn reject_line(err: StoryPromptError) -> ResponseEnvelope {
    obs::emit_request_failed("unknown", &err);
    ResponseEnvelope::failure(new_request_id(), &err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_tag_round_trip() {
        let req: Request = serde_json::from_value(json!({
            "op": "extract_prompt",
            "story": "Once",
        }))
        .unwrap();
        assert_eq!(req.op(), "extract_prompt");
        assert_eq!(
            req,
            Request::ExtractPrompt(ExtractPromptRequest {
                story: "Once".to_string(),
                types: vec![],
            })
        );
    }

    #[test]
    fn test_build_prompt_request_defaults() {
        let req: Request = serde_json::from_value(json!({"op": "build_prompt"})).unwrap();
        assert_eq!(req, Request::BuildPrompt(BuildPromptRequest::default()));
    }

    #[test]
    fn test_health_is_healthy() {
        let response = dispatch(Request::Health).unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["version"], crate::VERSION);
    }

    #[test]
    fn test_blank_line_is_ignored() {
        assert!(handle_line("   \n", 1024).is_none());
    }

    #[test]
    fn test_oversized_line_rejected_before_parsing() {
        let envelope = handle_line("{not even json}", 4).unwrap();
        assert!(!envelope.ok);
        assert_eq!(envelope.error_kind.as_deref(), Some("request_too_large"));
    }

    #[test]
    fn test_invalid_utf8_answers_with_io_error() {
        let envelope = handle_raw_line(b"\xff\xfe{}", 1024).unwrap();
        assert!(!envelope.ok);
        assert_eq!(envelope.error_kind.as_deref(), Some("io"));
        assert!(envelope.error.unwrap().contains("utf-8"));
    }

    #[test]
    fn test_raw_line_delegates_to_text_handling() {
        assert!(handle_raw_line(b"  \r\n", 1024).is_none());
        let envelope = handle_raw_line(br#"{"id": "r", "op": "health"}"#, 1024).unwrap();
        assert!(envelope.ok);
        assert_eq!(envelope.id, "r");
    }

    #[test]
    fn test_reject_oversized_reports_size_and_limit() {
        let envelope = reject_oversized(4096, 1024);
        assert_eq!(envelope.error_kind.as_deref(), Some("request_too_large"));
        let msg = envelope.error.unwrap();
        assert!(msg.contains("4096") && msg.contains("1024"));
    }

    #[test]
    fn test_malformed_line_answers_with_error() {
        let envelope = handle_line("{\"op\": \"teleport\"}", 1024).unwrap();
        assert!(!envelope.ok);
        assert_eq!(envelope.error_kind.as_deref(), Some("serialization"));
        assert!(!envelope.id.is_empty());
    }

    #[test]
    fn test_envelope_id_is_echoed() {
        let envelope = handle_line(r#"{"id": "req-7", "op": "health"}"#, 1024).unwrap();
        assert!(envelope.ok);
        assert_eq!(envelope.id, "req-7");
    }
}
