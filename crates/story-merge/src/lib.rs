//! Story-Merge: Classifying and Applying Memory Imports
//!
//! Compares an incoming memory snapshot against the current one and applies
//! a caller-approved subset of the differences.
//!
//! ## Layer 1 - Merge Logic
//!
//! Focus: one-directional diff ("what does incoming bring") and
//! copy-on-merge application. Neither input is ever mutated.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use story_memory::{Memory, MemoryEntry};
use tracing::debug;

/// One incoming entry in a merge preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeItem {
    /// Memory key
    pub key: String,
    /// Incoming type
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Incoming description
    pub desc: String,
    /// Current type, set only for updates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_type: Option<String>,
    /// Current description, set only for updates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_desc: Option<String>,
}

impl MergeItem {
    fn incoming(key: &str, entry: &MemoryEntry) -> Self {
        MergeItem {
            key: key.to_string(),
            entry_type: entry.entry_type.clone(),
            desc: entry.desc.clone(),
            old_type: None,
            old_desc: None,
        }
    }

    fn replacing(key: &str, entry: &MemoryEntry, current: &MemoryEntry) -> Self {
        MergeItem {
            old_type: Some(current.entry_type.clone()),
            old_desc: Some(current.desc.clone()),
            ..Self::incoming(key, entry)
        }
    }
}

/// Per-category counts of a [`MergeClassification`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    pub new: usize,
    pub update: usize,
    pub skip: usize,
}

/// Incoming entries split into new, changed and identical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeClassification {
    /// Keys absent from current memory
    pub new: Vec<MergeItem>,
    /// Keys present in current memory with a different type or desc
    pub update: Vec<MergeItem>,
    /// Keys present in current memory with identical content
    pub skip: Vec<MergeItem>,
}

impl MergeClassification {
    /// Counts derived from the list lengths.
    pub fn summary(&self) -> MergeSummary {
        MergeSummary {
            new: self.new.len(),
            update: self.update.len(),
            skip: self.skip.len(),
        }
    }

    /// Total number of classified incoming entries.
    pub fn len(&self) -> usize {
        self.new.len() + self.update.len() + self.skip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Counters reported by [`apply_merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub added: usize,
    pub updated: usize,
    /// Every incoming entry that was neither added nor updated
    pub skipped: usize,
}

/// A freshly built memory snapshot plus what happened to build it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    pub merged: Memory,
    #[serde(flatten)]
    pub stats: MergeStats,
}

/// Classify every incoming entry against the current memory.
///
/// Each list follows the iteration order of `incoming`. Entries that exist
/// only in `current` are not reported.
pub fn analyze(current: &Memory, incoming: &Memory) -> MergeClassification {
    let mut classification = MergeClassification::default();

    for (key, entry) in incoming {
        match current.get(key) {
            None => classification.new.push(MergeItem::incoming(key, entry)),
            Some(existing) if existing.same_content(entry) => {
                classification.skip.push(MergeItem::incoming(key, entry))
            }
            Some(existing) => classification
                .update
                .push(MergeItem::replacing(key, entry, existing)),
        }
    }

    let summary = classification.summary();
    debug!(
        new = summary.new,
        update = summary.update,
        skip = summary.skip,
        "merge analyzed"
    );
    classification
}

/// Build a new memory from `current` plus the selected incoming entries.
///
/// Updated keys keep their position in `current`; added keys are appended in
/// the order they appear in `incoming`.
///
/// A key is added only if it is absent from `current` and listed in
/// `selected_new_keys`; it is overwritten only if it is present in `current`
/// and listed in `selected_update_keys`. Selections are not checked against
/// [`analyze`]; anything that matches neither rule counts as skipped, so
/// `added + updated + skipped == incoming.len()` always holds.
pub fn apply_merge(
    current: &Memory,
    incoming: &Memory,
    selected_new_keys: &HashSet<String>,
    selected_update_keys: &HashSet<String>,
) -> MergeResult {
    let mut merged = current.clone();
    let mut added = 0;
    let mut updated = 0;

    for (key, entry) in incoming {
        let exists = current.contains_key(key);
        if !exists && selected_new_keys.contains(key) {
            merged.insert(key.clone(), entry.clone());
            added += 1;
        } else if exists && selected_update_keys.contains(key) {
            merged.insert(key.clone(), entry.clone());
            updated += 1;
        }
    }

    let stats = MergeStats {
        added,
        updated,
        skipped: incoming.len() - added - updated,
    };
    debug!(
        added = stats.added,
        updated = stats.updated,
        skipped = stats.skipped,
        "merge applied"
    );

    MergeResult { merged, stats }
}
