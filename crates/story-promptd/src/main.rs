//! Story Prompt request loop.
//!
//! Reads one JSON request envelope per line from stdin and answers each
//! with one JSON response envelope per line on stdout, until EOF.
//!
//! ```text
//! {"id": "1", "op": "match", "text": "Bob rode in", "memory": {...}}
//! {"id":"1","ok":true,"result":{"matched_keys":["Bob"]}}
//! ```

mod framing;

use anyhow::{Context, Result};
use framing::{read_frame, Frame};
use story_prompt_core::api::{handle_raw_line, reject_oversized};
use story_prompt_core::telemetry::init_from_config;
use story_prompt_core::{ServiceConfig, METRICS};
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Counts for one run of the loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ServeSummary {
    answered: u64,
    failed: u64,
}

async fn serve<R, W>(mut reader: R, mut writer: W, max_request_bytes: usize) -> Result<ServeSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = ServeSummary::default();

    loop {
        let frame = read_frame(&mut reader, max_request_bytes)
            .await
            .context("Failed to read request")?;
        let response = match frame {
            Frame::Eof => break,
            Frame::Oversized { size } => reject_oversized(size, max_request_bytes),
            Frame::Line(line) => match handle_raw_line(&line, max_request_bytes) {
                Some(response) => response,
                None => continue,
            },
        };

        summary.answered += 1;
        if !response.ok {
            summary.failed += 1;
        }

        let mut encoded = serde_json::to_vec(&response).context("Failed to encode response")?;
        encoded.push(b'\n');
        writer
            .write_all(&encoded)
            .await
            .context("Failed to write response")?;
        writer.flush().await.context("Failed to flush response")?;
    }

    Ok(summary)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::from_env().context("Failed to read configuration")?;
    init_from_config(&config);

    tracing::info!(
        max_request_bytes = config.max_request_bytes,
        version = story_prompt_core::VERSION,
        "story-promptd started"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let summary = serve(stdin, tokio::io::stdout(), config.max_request_bytes).await?;

    tracing::info!(
        answered = summary.answered,
        failed = summary.failed,
        "story-promptd stopped"
    );
    METRICS.flush();
    Ok(())
}
