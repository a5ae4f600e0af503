//! Bounded line framing for the request stream.
//!
//! At most `limit + 1` bytes of a line are ever buffered. The rest of an
//! oversized line is consumed and dropped so the next line starts clean.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// One unit read from the request stream.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame {
    /// A line of at most `limit` bytes, trailing newline included if present.
    Line(Vec<u8>),
    /// A line longer than `limit`; `size` excludes the newline.
    Oversized { size: usize },
    Eof,
}

/// Read the next line from `reader` without buffering more than `limit + 1`
/// bytes of it.
pub async fn read_frame<R>(reader: &mut R, limit: usize) -> io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let mut line = Vec::new();
    let read = (&mut *reader).take(cap).read_until(b'\n', &mut line).await?;
    if read == 0 {
        return Ok(Frame::Eof);
    }

    let terminated = line.last() == Some(&b'\n');
    let content = if terminated { line.len() - 1 } else { line.len() };
    if content <= limit {
        return Ok(Frame::Line(line));
    }

    // Only an unterminated read can exceed the limit, so the line continues.
    let size = content + discard_line(reader).await?;
    Ok(Frame::Oversized { size })
}

/// Consume bytes up to and including the next newline. Returns how many
/// bytes were dropped, not counting the newline.
async fn discard_line<R>(reader: &mut R) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut dropped = 0;
    loop {
        let (consumed, done) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(dropped);
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (available.len(), false),
            }
        };
        reader.consume(consumed);
        if done {
            return Ok(dropped + consumed - 1);
        }
        dropped += consumed;
    }
}
