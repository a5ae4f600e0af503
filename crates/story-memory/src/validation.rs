//! Structural gate for externally supplied memory.
//!
//! Checks run in document order and stop at the first violation.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ImportValidationError;
use crate::schema::{Memory, MemoryEntry};
use crate::Result;

/// Check that `data` is an object of `key -> {type, desc}` with non-empty
/// keys, types and descriptions.
pub fn validate_import_data(data: &Value) -> Result<()> {
    let object = data.as_object().ok_or(ImportValidationError::NotAnObject)?;

    for (key, value) in object {
        if key.trim().is_empty() {
            return Err(ImportValidationError::InvalidKey);
        }

        let entry = value
            .as_object()
            .ok_or_else(|| ImportValidationError::EntryNotAnObject { key: key.clone() })?;

        if non_empty_str(entry, "type").is_none() {
            return Err(ImportValidationError::MissingType { key: key.clone() });
        }

        if non_empty_str(entry, "desc").is_none() {
            return Err(ImportValidationError::MissingDesc { key: key.clone() });
        }
    }

    debug!(entries = object.len(), "import data validated");
    Ok(())
}

/// Validate `data` and normalize it into a [`Memory`].
pub fn parse_import_data(data: &Value) -> Result<Memory> {
    validate_import_data(data)?;

    let mut memory = Memory::new();
    if let Some(object) = data.as_object() {
        for (key, value) in object {
            if let Some(entry) = value.as_object() {
                // Both fields were checked above.
                let entry_type = non_empty_str(entry, "type").unwrap_or_default();
                let desc = non_empty_str(entry, "desc").unwrap_or_default();
                memory.insert(key.clone(), MemoryEntry::new(entry_type, desc));
            }
        }
    }
    Ok(memory)
}

fn non_empty_str<'a>(entry: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    entry
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
