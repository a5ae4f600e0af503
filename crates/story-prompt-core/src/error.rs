//! Error taxonomy for the Story Prompt boundary.

use story_memory::ImportValidationError;

/// Errors surfaced by the request boundary and the binaries' shared helpers.
#[derive(Debug, thiserror::Error)]
pub enum StoryPromptError {
    /// Incoming memory failed the import gate. Displays the gate's message
    /// unchanged so callers can show it directly.
    #[error(transparent)]
    Validation(#[from] ImportValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request too large: {size} bytes exceeds limit of {limit} bytes")]
    RequestTooLarge { size: usize, limit: usize },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StoryPromptError {
    /// Short machine-readable label for logs and error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
            Self::RequestTooLarge { .. } => "request_too_large",
            Self::Config(_) => "config",
        }
    }
}

/// Result type for Story Prompt operations.
pub type Result<T> = std::result::Result<T, StoryPromptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_is_transparent() {
        let err: StoryPromptError = ImportValidationError::MissingDesc {
            key: "Bob".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Invalid entry 'Bob'. Missing 'desc' field.");
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_request_too_large_display() {
        let err = StoryPromptError::RequestTooLarge {
            size: 2048,
            limit: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("2048"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn test_io_error_kind() {
        let err: StoryPromptError =
            std::io::Error::new(std::io::ErrorKind::InvalidData, "bad bytes").into();
        assert_eq!(err.kind(), "io");
        assert_eq!(err.to_string(), "io error: bad bytes");
    }

    #[test]
    fn test_config_error() {
        let err = StoryPromptError::Config("bad level".to_string());
        assert!(err.to_string().contains("invalid configuration"));
        assert_eq!(err.kind(), "config");
    }
}
