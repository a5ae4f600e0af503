//! Story Prompt Core Library
//!
//! Re-exports the stateless building blocks of Story Prompt: the key
//! matcher, the merge classifier, and the prompt assembler, plus the typed
//! request boundary the binaries share.

pub mod api;
pub mod config;
pub mod error;
pub mod matcher;
pub mod metrics;
pub mod obs;
pub mod prompt;
pub mod reporting;
pub mod telemetry;

pub use api::{dispatch, Request, RequestEnvelope, Response, ResponseEnvelope};
pub use config::{LogFormat, ServiceConfig};
pub use error::{Result, StoryPromptError};
pub use matcher::find_matches;
pub use prompt::{
    build_augmented_prompt, build_extraction_prompt, DEFAULT_EXTRACT_TYPES, DEFAULT_INSTRUCTION,
};
pub use reporting::{render_merge_preview_text, render_merge_stats_text};

pub use story_memory::{
    parse_import_data, validate_import_data, ImportValidationError, Memory, MemoryEntry,
};
pub use story_merge::{
    analyze, apply_merge, MergeClassification, MergeItem, MergeResult, MergeStats, MergeSummary,
};

pub use metrics::METRICS;
pub use obs::RequestSpan;
pub use telemetry::init_tracing;

/// Story Prompt version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
