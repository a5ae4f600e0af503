//! Story Prompt CLI
//!
//! The `story-prompt` command runs the stateless memory operations over
//! JSON files so they can be scripted without a server.
//!
//! ## Commands
//!
//! - `match`: list memory keys mentioned in a piece of text
//! - `merge preview`: classify an import against the current memory
//! - `merge apply`: merge the selected part of an import
//! - `prompt build`: assemble the augmented continuation prompt
//! - `prompt extract`: assemble the entity extraction prompt
//! - `request`: run one raw JSON request envelope
//! - `health`: report service status

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use story_prompt_core::api::{
    BuildPromptRequest, ExtractPromptRequest, MatchRequest, MergeApplyRequest,
    MergePreviewRequest, RequestEnvelope,
};
use story_prompt_core::reporting::render_merge_stats_text;
use story_prompt_core::telemetry::init_from_config;
use story_prompt_core::{
    analyze, dispatch, find_matches, parse_import_data, render_merge_preview_text, Memory,
    Request, Response, ServiceConfig,
};

#[derive(Parser)]
#[command(name = "story-prompt")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Memory matching, merging and prompt assembly for novel writing", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List memory keys that appear in a text, in order of appearance
    Match {
        /// Text to search
        #[arg(short, long, conflicts_with = "text_file")]
        text: Option<String>,

        /// Read the text from a file (stdin when neither is given)
        #[arg(long)]
        text_file: Option<PathBuf>,

        /// Memory file (JSON object of key -> {type, desc})
        #[arg(short, long)]
        memory: PathBuf,
    },

    /// Compare and merge memory snapshots
    Merge {
        #[command(subcommand)]
        action: MergeAction,
    },

    /// Assemble prompts for a language model
    Prompt {
        #[command(subcommand)]
        action: PromptAction,
    },

    /// Run one JSON request envelope ({"op": ..., ...}) from a file or stdin
    Request {
        /// Request file (default: stdin)
        path: Option<PathBuf>,
    },

    /// Show service status
    Health,
}

#[derive(Subcommand)]
enum MergeAction {
    /// Classify incoming entries as new, update or unchanged
    Preview {
        /// Current memory file
        #[arg(short, long)]
        current: PathBuf,

        /// Incoming memory file to import
        #[arg(short, long)]
        incoming: PathBuf,

        /// Print a readable summary instead of JSON
        #[arg(long)]
        text: bool,
    },

    /// Merge the selected incoming entries into the current memory
    Apply {
        /// Current memory file
        #[arg(short, long)]
        current: PathBuf,

        /// Incoming memory file to import
        #[arg(short, long)]
        incoming: PathBuf,

        /// New key to add (repeatable)
        #[arg(long = "new", value_name = "KEY")]
        new_keys: Vec<String>,

        /// Existing key to overwrite (repeatable)
        #[arg(long = "update", value_name = "KEY")]
        update_keys: Vec<String>,

        /// Add every new key
        #[arg(long)]
        all_new: bool,

        /// Overwrite every changed key
        #[arg(long)]
        all_updates: bool,

        /// Write the merged memory to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PromptAction {
    /// Build the continuation prompt with matched memory as context
    Build {
        /// Memory file
        #[arg(short, long)]
        memory: Option<PathBuf>,

        /// Story text
        #[arg(short, long, conflicts_with = "story_file")]
        story: Option<String>,

        /// Read the story from a file
        #[arg(long)]
        story_file: Option<PathBuf>,

        /// Memory key to include (repeatable)
        #[arg(short, long = "key", value_name = "KEY")]
        keys: Vec<String>,

        /// Include every memory key found in the story
        #[arg(long)]
        auto_match: bool,

        /// Custom instruction (default: continue the story)
        #[arg(short, long)]
        instruction: Option<String>,
    },

    /// Build the prompt that asks a model to extract memory from a story
    Extract {
        /// Story text
        #[arg(short, long, conflicts_with = "story_file")]
        story: Option<String>,

        /// Read the story from a file (stdin when neither is given)
        #[arg(long)]
        story_file: Option<PathBuf>,

        /// Entity category to extract (repeatable; default: character, location, item, event)
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        types: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let config = ServiceConfig::from_env()
        .context("Failed to read configuration")?
        .with_overrides(cli.json, cli.verbose);
    init_from_config(&config);

    match cli.command {
        Commands::Match {
            text,
            text_file,
            memory,
        } => cmd_match(text, text_file.as_deref(), &memory),
        Commands::Merge { action } => match action {
            MergeAction::Preview {
                current,
                incoming,
                text,
            } => cmd_merge_preview(&current, &incoming, text),
            MergeAction::Apply {
                current,
                incoming,
                new_keys,
                update_keys,
                all_new,
                all_updates,
                output,
            } => cmd_merge_apply(
                &current,
                &incoming,
                Selection {
                    new_keys,
                    update_keys,
                    all_new,
                    all_updates,
                },
                output.as_deref(),
            ),
        },
        Commands::Prompt { action } => match action {
            PromptAction::Build {
                memory,
                story,
                story_file,
                keys,
                auto_match,
                instruction,
            } => cmd_prompt_build(
                memory.as_deref(),
                story,
                story_file.as_deref(),
                keys,
                auto_match,
                instruction,
            ),
            PromptAction::Extract {
                story,
                story_file,
                types,
            } => cmd_prompt_extract(story, story_file.as_deref(), types),
        },
        Commands::Request { path } => cmd_request(path.as_deref()),
        Commands::Health => print_json(&dispatch(Request::Health)?),
    }
}

fn cmd_match(text: Option<String>, text_file: Option<&Path>, memory: &Path) -> Result<()> {
    let text = read_text_input(text, text_file, true)?;
    let memory: Memory = read_json_file(memory)?;

    let response = dispatch(Request::Match(MatchRequest { text, memory }))?;
    print_json(&response)
}

fn cmd_merge_preview(current: &Path, incoming: &Path, text: bool) -> Result<()> {
    let current: Memory = read_json_file(current)?;
    let incoming: Value = read_json_file(incoming)?;

    let response = dispatch(Request::MergePreview(MergePreviewRequest { current, incoming }))?;
    match (&response, text) {
        (Response::MergePreview(preview), true) => {
            print!("{}", render_merge_preview_text(&preview.classification));
            Ok(())
        }
        _ => print_json(&response),
    }
}

/// Keys chosen on the command line for `merge apply`.
#[derive(Debug, Default)]
struct Selection {
    new_keys: Vec<String>,
    update_keys: Vec<String>,
    all_new: bool,
    all_updates: bool,
}

impl Selection {
    /// Expand `--all-new` / `--all-updates` against the preview of this
    /// import. Explicit keys are kept as given.
    fn resolve(self, current: &Memory, incoming: &Value) -> Result<(Vec<String>, Vec<String>)> {
        let mut new_keys = self.new_keys;
        let mut update_keys = self.update_keys;

        if self.all_new || self.all_updates {
            let parsed = parse_import_data(incoming)?;
            let preview = analyze(current, &parsed);
            if self.all_new {
                new_keys.extend(preview.new.into_iter().map(|item| item.key));
            }
            if self.all_updates {
                update_keys.extend(preview.update.into_iter().map(|item| item.key));
            }
        }

        Ok((dedup(new_keys), dedup(update_keys)))
    }
}

fn dedup(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter()
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

fn cmd_merge_apply(
    current: &Path,
    incoming: &Path,
    selection: Selection,
    output: Option<&Path>,
) -> Result<()> {
    let current: Memory = read_json_file(current)?;
    let incoming: Value = read_json_file(incoming)?;
    let (selected_new_keys, selected_update_keys) = selection.resolve(&current, &incoming)?;
    debug!(
        new = selected_new_keys.len(),
        update = selected_update_keys.len(),
        "merge selection resolved"
    );

    let response = dispatch(Request::MergeApply(MergeApplyRequest {
        current,
        incoming,
        selected_new_keys,
        selected_update_keys,
    }))?;

    match (&response, output) {
        (Response::MergeApply(result), Some(path)) => {
            let content = serde_json::to_string_pretty(&result.merged)?;
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write merged memory: {:?}", path))?;
            info!(path = %path.display(), "merged memory written");
            println!("{}", render_merge_stats_text(&result.stats));
            Ok(())
        }
        _ => print_json(&response),
    }
}

fn cmd_prompt_build(
    memory: Option<&Path>,
    story: Option<String>,
    story_file: Option<&Path>,
    keys: Vec<String>,
    auto_match: bool,
    instruction: Option<String>,
) -> Result<()> {
    let memory: Memory = match memory {
        Some(path) => read_json_file(path)?,
        None => Memory::new(),
    };
    let story = read_text_input(story, story_file, false)?;

    let mut matched_keys = keys;
    if auto_match {
        matched_keys.extend(find_matches(&story, &memory));
    }

    let response = dispatch(Request::BuildPrompt(BuildPromptRequest {
        story,
        matched_keys,
        memory,
        instruction,
    }))?;
    print_prompt(&response)
}

fn cmd_prompt_extract(
    story: Option<String>,
    story_file: Option<&Path>,
    types: Vec<String>,
) -> Result<()> {
    let story = read_text_input(story, story_file, true)?;

    let response = dispatch(Request::ExtractPrompt(ExtractPromptRequest { story, types }))?;
    print_prompt(&response)
}

fn cmd_request(path: Option<&Path>) -> Result<()> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {:?}", path))?,
        None => read_stdin()?,
    };
    let envelope: RequestEnvelope =
        serde_json::from_str(&raw).context("Invalid request envelope")?;

    let response = story_prompt_core::api::handle_envelope(envelope);
    print_json(&response)?;
    if !response.ok {
        bail!(response.error.unwrap_or_else(|| "request failed".to_string()));
    }
    Ok(())
}

/// Resolve a text argument: inline value, file, or (when `stdin_fallback`)
/// standard input. Without a fallback a missing text is empty.
fn read_text_input(
    inline: Option<String>,
    file: Option<&Path>,
    stdin_fallback: bool,
) -> Result<String> {
    match (inline, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read text file: {:?}", path)),
        (None, None) if stdin_fallback => read_stdin(),
        (None, None) => Ok(String::new()),
    }
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read stdin")?;
    Ok(buf)
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prompts are printed raw so they can be piped straight to a model.
fn print_prompt(response: &Response) -> Result<()> {
    match response {
        Response::Prompt(prompt) => {
            println!("{}", prompt.prompt);
            Ok(())
        }
        other => print_json(other),
    }
}
