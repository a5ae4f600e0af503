//! Key matching over free text.
//!
//! A memory key matches when it appears verbatim (case-sensitive, no word
//! boundaries) anywhere in the text. Results are ordered by where each key
//! first appears.

use story_memory::Memory;
use tracing::debug;

/// Return every memory key found in `text`, ordered by first occurrence.
///
/// An empty key is contained in any non-empty text and matches at offset 0.
/// Byte offsets are used for ordering, which for UTF-8 text is the same order
/// as character offsets.
pub fn find_matches(text: &str, memory: &Memory) -> Vec<String> {
    if text.is_empty() || memory.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<(usize, &String)> = memory
        .keys()
        .filter_map(|key| text.find(key.as_str()).map(|offset| (offset, key)))
        .collect();

    // Equal offsets only arise for keys sharing a prefix. The sort is stable,
    // so those keep their memory order.
    hits.sort_by_key(|(offset, _)| *offset);

    debug!(
        candidates = memory.len(),
        matched = hits.len(),
        "keys matched"
    );
    hits.into_iter().map(|(_, key)| key.clone()).collect()
}
