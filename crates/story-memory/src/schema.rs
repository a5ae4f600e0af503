//! Canonical memory types shared by every component.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single named story entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Category of the entity, e.g. `character` or `location`
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Narrative description
    pub desc: String,
}

impl MemoryEntry {
    /// Create a new memory entry
    pub fn new(entry_type: impl Into<String>, desc: impl Into<String>) -> Self {
        MemoryEntry {
            entry_type: entry_type.into(),
            desc: desc.into(),
        }
    }

    /// True when both `type` and `desc` equal the other entry's.
    pub fn same_content(&self, other: &MemoryEntry) -> bool {
        self.entry_type == other.entry_type && self.desc == other.desc
    }
}

/// Entity name to entry. Keys are case-sensitive and iterate in the order
/// they were inserted, which for deserialized memory is document order.
pub type Memory = IndexMap<String, MemoryEntry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serializes_type_field() {
        let entry = MemoryEntry::new("character", "A knight");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "character", "desc": "A knight"})
        );
    }

    #[test]
    fn test_entry_requires_both_fields() {
        let err = serde_json::from_str::<MemoryEntry>(r#"{"type": "item"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_same_content_compares_both_fields() {
        let a = MemoryEntry::new("character", "A knight");
        assert!(a.same_content(&MemoryEntry::new("character", "A knight")));
        assert!(!a.same_content(&MemoryEntry::new("location", "A knight")));
        assert!(!a.same_content(&MemoryEntry::new("character", "A tall knight")));
    }

    #[test]
    fn test_memory_keeps_document_order() {
        let memory: Memory = serde_json::from_str(
            r#"{"Zed": {"type": "character", "desc": "A bard"},
                "Anna": {"type": "character", "desc": "A smith"}}"#,
        )
        .unwrap();
        assert_eq!(memory.keys().collect::<Vec<_>>(), vec!["Zed", "Anna"]);

        let round_trip = serde_json::to_string(&memory).unwrap();
        assert!(round_trip.find("Zed").unwrap() < round_trip.find("Anna").unwrap());
    }
}
