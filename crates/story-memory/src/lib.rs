//! Story-Memory: Data Model for Story Prompt
//!
//! This crate defines the caller-owned "memory" of a story world: a mapping
//! from entity name to a `{type, desc}` pair, plus the structural gate that
//! externally supplied memory must pass before it is merged.
//!
//! ## Layer 0 - Data
//!
//! Focus: one canonical entry type, normalized once at the boundary.
//!
//! ## Key Components
//!
//! - `MemoryEntry`: a single story entity (character, location, item, event)
//! - `Memory`: insertion-ordered mapping of entity name to `MemoryEntry`
//! - `validate_import_data` / `parse_import_data`: the import gate

mod error;
mod schema;
mod validation;

pub use error::ImportValidationError;
pub use schema::{Memory, MemoryEntry};
pub use validation::{parse_import_data, validate_import_data};

/// Result type for story-memory operations
pub type Result<T> = std::result::Result<T, ImportValidationError>;
