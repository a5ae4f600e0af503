//! Error types for story-memory

use thiserror::Error;

/// Structural problems found in externally supplied memory data.
///
/// The `Display` output is the human-readable message surfaced to the
/// caller as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportValidationError {
    /// The payload is not a JSON object
    #[error("Invalid format. Expected an object with keys.")]
    NotAnObject,

    /// A key is empty or whitespace-only
    #[error("Invalid key: keys must be non-empty strings.")]
    InvalidKey,

    /// The value stored under `key` is not an object
    #[error("Invalid entry for '{key}'. Each entry must be an object.")]
    EntryNotAnObject { key: String },

    /// The entry has no usable `type`
    #[error("Invalid entry '{key}'. Missing 'type' field.")]
    MissingType { key: String },

    /// The entry has no usable `desc`
    #[error("Invalid entry '{key}'. Missing 'desc' field.")]
    MissingDesc { key: String },
}

impl ImportValidationError {
    /// The offending key, when the error is tied to a single entry.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::EntryNotAnObject { key }
            | Self::MissingType { key }
            | Self::MissingDesc { key } => Some(key),
            Self::NotAnObject | Self::InvalidKey => None,
        }
    }
}
