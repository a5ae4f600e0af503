//! Human-readable renderings of merge previews and results for the CLI.

use story_merge::{MergeClassification, MergeItem, MergeStats};

fn push_items(out: &mut String, title: &str, items: &[MergeItem], show_old: bool) {
    out.push_str(&format!("{} ({})\n", title, items.len()));
    for item in items {
        out.push_str(&format!("  + {} [{}]: {}\n", item.key, item.entry_type, item.desc));
        if show_old {
            if let (Some(old_type), Some(old_desc)) = (&item.old_type, &item.old_desc) {
                out.push_str(&format!("    was [{}]: {}\n", old_type, old_desc));
            }
        }
    }
}

/// Render a merge preview as plain text, one section per category.
pub fn render_merge_preview_text(classification: &MergeClassification) -> String {
    let summary = classification.summary();
    let mut out = String::new();
    out.push_str(&format!(
        "Merge preview: {} new, {} update, {} unchanged\n\n",
        summary.new, summary.update, summary.skip
    ));

    push_items(&mut out, "New", &classification.new, false);
    out.push('\n');
    push_items(&mut out, "Update", &classification.update, true);
    out.push('\n');
    push_items(&mut out, "Unchanged", &classification.skip, false);
    out
}

/// One-line summary of an applied merge.
pub fn render_merge_stats_text(stats: &MergeStats) -> String {
    format!(
        "Merged: {} added, {} updated, {} skipped",
        stats.added, stats.updated, stats.skipped
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_memory::{Memory, MemoryEntry};
    use story_merge::analyze;

    #[test]
    fn test_preview_text_lists_old_values_for_updates() {
        let mut current = Memory::new();
        current.insert("Bob".to_string(), MemoryEntry::new("character", "A knight"));
        let mut incoming = Memory::new();
        incoming.insert(
            "Bob".to_string(),
            MemoryEntry::new("character", "A tall knight"),
        );
        incoming.insert(
            "Castle".to_string(),
            MemoryEntry::new("location", "A stone fortress"),
        );

        let text = render_merge_preview_text(&analyze(&current, &incoming));

        assert!(text.starts_with("Merge preview: 1 new, 1 update, 0 unchanged"));
        assert!(text.contains("  + Castle [location]: A stone fortress"));
        assert!(text.contains("    was [character]: A knight"));
        assert!(text.contains("Unchanged (0)"));
    }

    #[test]
    fn test_stats_text() {
        let stats = MergeStats {
            added: 1,
            updated: 0,
            skipped: 1,
        };
        assert_eq!(
            render_merge_stats_text(&stats),
            "Merged: 1 added, 0 updated, 1 skipped"
        );
    }
}
