//! Prompt assembly for the external language model.
//!
//! Two prompts are produced: an augmented continuation prompt carrying the
//! matched memory as JSON, and an extraction prompt asking the model to
//! turn a story into memory entries. Both are plain strings; nothing here
//! talks to a model.

use serde::ser::{Serialize, SerializeMap, Serializer};
use story_memory::{Memory, MemoryEntry};
use tracing::{debug, warn};

/// Instruction used when the caller supplies none.
pub const DEFAULT_INSTRUCTION: &str = "Continue this story. Maintain consistency with the characters, \
locations, and details provided in MEMORY CONTEXT.";

/// Entity categories requested when the caller supplies none.
pub const DEFAULT_EXTRACT_TYPES: [&str; 4] = ["character", "location", "item", "event"];

const MEMORY_CONTEXT_HEADER: &str = "[MEMORY CONTEXT]";
const STORY_INPUT_HEADER: &str = "[STORY INPUT]";
const INSTRUCTION_HEADER: &str = "[INSTRUCTION]";

/// Extraction prompt template.
///
/// Placeholders:
/// - `{types}` - comma-separated entity categories
///
/// The story is appended verbatim after the final `Story:` line.
const EXTRACTION_PROMPT: &str = r#"Analyze the following story and extract all {types}.

Return the data as a JSON object with this exact format:
{
  "Name of Entity": {"type": "category", "desc": "Summarized narrative description"},
  "Another Entity": {"type": "category", "desc": "Summarized narrative description"}
}

Rules:
- Use the actual name as the key
- "type" should be one of: {types}
- "desc" should be a summarized narrative of EVERYTHING related to the entity:

  For CHARACTERS/PERSONS:
  - Physical appearance (face, hair, eyes, body type, height, distinguishing features)
  - Clothing and accessories typically worn
  - Personality traits and temperament
  - Background and history
  - Objectives, goals, and motivations
  - Relationships with other characters
  - Skills, abilities, or powers
  - Current status or situation

  For LOCATIONS/PLACES:
  - Where it is located (geography, region, relative position)
  - What it looks like (architecture, landscape, atmosphere, colors, lighting)
  - What it is used for (purpose, function)
  - Who owns or controls it
  - Notable features or landmarks within
  - History or significance
  - Current condition or state
  - Mood or feeling it evokes

  For ITEMS/OBJECTS:
  - What it is (type of object)
  - What it looks like (size, shape, color, material, markings)
  - What makes it special or unique
  - What it does or how it functions
  - Who owns or created it
  - History or origin
  - Current location or status

  For EVENTS:
  - What happened
  - When and where it occurred
  - Who was involved
  - Why it happened (causes)
  - What were the consequences
  - Significance to the story

- Write descriptions as flowing narrative paragraphs, not bullet points
- Include ALL details mentioned in the story about each entity
- If information is not provided in the story, do not invent it
- Extract ALL relevant {types} mentioned in the story
- Do not include any markdown formatting, only return valid JSON

IMPORTANT: Output MUST be in the SAME LANGUAGE as the input story. 
If the story is in Thai, output in Thai.
If the story is in Japanese, output in Japanese.
If the story is in English, output in English.
Match the language of the story exactly.

Story:
"#;

/// Memory entries serialized as a JSON object in caller-chosen key order.
struct OrderedEntries<'a>(Vec<(&'a str, &'a MemoryEntry)>);

impl Serialize for OrderedEntries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, entry) in &self.0 {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

/// Pick the entries named in `matched_keys`, first mention first. Unknown
/// and repeated keys are dropped.
fn select_entries<'a>(matched_keys: &'a [String], memory: &'a Memory) -> OrderedEntries<'a> {
    let mut selected: Vec<(&str, &MemoryEntry)> = Vec::new();
    for key in matched_keys {
        if selected.iter().any(|(seen, _)| *seen == key.as_str()) {
            continue;
        }
        if let Some(entry) = memory.get(key) {
            selected.push((key.as_str(), entry));
        }
    }
    OrderedEntries(selected)
}

/// Build the augmented continuation prompt.
///
/// Sections appear in a fixed order and each is omitted when it has
/// nothing to say; only `[INSTRUCTION]` is always present.
pub fn build_augmented_prompt(
    story: &str,
    matched_keys: &[String],
    memory: &Memory,
    instruction: Option<&str>,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    let entries = select_entries(matched_keys, memory);
    let context_entries = entries.0.len();
    if context_entries > 0 {
        // Non-ASCII text is kept as-is by serde_json.
        let context = serde_json::to_string_pretty(&entries).unwrap_or_else(|err| {
            warn!(error = %err, "failed to render memory context");
            String::from("{}")
        });
        parts.push(MEMORY_CONTEXT_HEADER.to_string());
        parts.push(context);
        parts.push(String::new());
    }

    let story = story.trim();
    if !story.is_empty() {
        parts.push(STORY_INPUT_HEADER.to_string());
        parts.push(story.to_string());
        parts.push(String::new());
    }

    let instruction = instruction
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_INSTRUCTION);
    parts.push(INSTRUCTION_HEADER.to_string());
    parts.push(instruction.to_string());

    debug!(
        context_entries,
        has_story = !story.is_empty(),
        "augmented prompt built"
    );
    parts.join("\n")
}

/// Build the extraction prompt for `story`, asking for the given `types`
/// (or [`DEFAULT_EXTRACT_TYPES`] when empty).
///
/// The story is embedded verbatim at the end, untrimmed and unescaped.
pub fn build_extraction_prompt(story: &str, types: &[String]) -> String {
    let types_list = if types.is_empty() {
        DEFAULT_EXTRACT_TYPES.join(", ")
    } else {
        types.join(", ")
    };

    let mut prompt = EXTRACTION_PROMPT.replace("{types}", &types_list);
    prompt.push_str(story);

    debug!(types = %types_list, story_len = story.len(), "extraction prompt built");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knight_memory() -> Memory {
        let mut memory = Memory::new();
        memory.insert("Bob".to_string(), MemoryEntry::new("character", "A knight"));
        memory.insert(
            "Castle".to_string(),
            MemoryEntry::new("location", "A stone fortress"),
        );
        memory
    }

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_full_augmented_prompt_layout() {
        let prompt = build_augmented_prompt(
            "  He drew his sword.\n",
            &keys(&["Bob"]),
            &knight_memory(),
            None,
        );

        let expected = format!(
            "[MEMORY CONTEXT]\n{{\n  \"Bob\": {{\n    \"type\": \"character\",\n    \"desc\": \"A knight\"\n  }}\n}}\n\n[STORY INPUT]\nHe drew his sword.\n\n[INSTRUCTION]\n{}",
            DEFAULT_INSTRUCTION
        );
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_only_instruction_when_nothing_else() {
        let prompt = build_augmented_prompt("   ", &[], &Memory::new(), Some("  Write a poem.  "));
        assert_eq!(prompt, "[INSTRUCTION]\nWrite a poem.");
    }

    #[test]
    fn test_blank_instruction_falls_back_to_default() {
        let prompt = build_augmented_prompt("", &[], &Memory::new(), Some(" \n "));
        assert!(prompt.ends_with(DEFAULT_INSTRUCTION));
    }

    #[test]
    fn test_unknown_keys_are_skipped() {
        let prompt =
            build_augmented_prompt("story", &keys(&["Nobody"]), &knight_memory(), None);
        assert!(!prompt.contains("[MEMORY CONTEXT]"));
        assert!(prompt.starts_with("[STORY INPUT]"));
    }

    #[test]
    fn test_context_follows_matched_key_order() {
        let prompt = build_augmented_prompt(
            "",
            &keys(&["Castle", "Nobody", "Bob", "Castle"]),
            &knight_memory(),
            None,
        );
        let castle = prompt.find("\"Castle\"").unwrap();
        let bob = prompt.find("\"Bob\"").unwrap();
        assert!(castle < bob);
        assert_eq!(prompt.matches("\"Castle\"").count(), 1);
    }

    #[test]
    fn test_non_ascii_is_not_escaped() {
        let mut memory = Memory::new();
        memory.insert("สมชาย".to_string(), MemoryEntry::new("character", "นักดาบ"));
        let prompt = build_augmented_prompt("", &keys(&["สมชาย"]), &memory, None);
        assert!(prompt.contains("\"สมชาย\""));
        assert!(prompt.contains("นักดาบ"));
        assert!(!prompt.contains("\\u"));
    }

    #[test]
    fn test_extraction_defaults_to_four_categories() {
        let prompt = build_extraction_prompt("Once upon a time.", &[]);
        assert!(prompt.starts_with(
            "Analyze the following story and extract all character, location, item, event."
        ));
        assert!(prompt.contains("- \"type\" should be one of: character, location, item, event"));
        assert!(prompt.ends_with("Story:\nOnce upon a time."));
    }

    #[test]
    fn test_extraction_uses_custom_types_and_keeps_story_verbatim() {
        let story = "  {types} stays literal \n";
        let prompt = build_extraction_prompt(story, &keys(&["faction", "spell"]));
        assert!(prompt.contains("extract all faction, spell."));
        assert!(prompt.ends_with(story));
        assert!(!prompt[..prompt.len() - story.len()].contains("{types}"));
    }

    #[test]
    fn test_extraction_carries_guidance_sections() {
        let prompt = build_extraction_prompt("x", &[]);
        for section in [
            "For CHARACTERS/PERSONS:",
            "For LOCATIONS/PLACES:",
            "For ITEMS/OBJECTS:",
            "For EVENTS:",
            "do not invent it",
            "Do not include any markdown formatting",
            "SAME LANGUAGE as the input story",
        ] {
            assert!(prompt.contains(section), "missing {section}");
        }
    }
}
