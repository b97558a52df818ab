//! Incremental line-protocol decoder
//!
//! `POST /api/generate` answers with one JSON object per line. Bytes arrive
//! in arbitrary slices, so complete lines are cut out of an accumulation
//! buffer and decoded one at a time:
//! - Blank or whitespace-only lines are skipped
//! - A non-empty line that is not a valid record fails the whole sequence
//! - Lines are decoded in arrival order, never reordered

use crate::errors::{ClientError, Result};
use crate::types::GenerationChunk;
use tracing::trace;

/// Maximum size of a single buffered line (1MB)
pub const MAX_LINE_SIZE: usize = 1_048_576;

/// Splits a byte stream into complete text lines
#[derive(Debug)]
pub struct LineDecoder {
    /// Bytes of the current, not yet terminated line
    buffer: Vec<u8>,

    /// Maximum size of one line
    max_line_size: usize,
}

impl LineDecoder {
    /// Create new decoder with default settings
    pub fn new() -> Self {
        Self::with_capacity(MAX_LINE_SIZE)
    }

    /// Create decoder with custom maximum line size
    pub fn with_capacity(max_line_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            max_line_size,
        }
    }

    /// Add bytes and return every line they complete, in order
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        let mut rest = bytes;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.append(&rest[..pos])?;
            lines.push(self.take_line()?);
            rest = &rest[pos + 1..];
        }
        self.append(rest)?;

        Ok(lines)
    }

    /// Flush the final line when the stream ended without a newline
    pub fn finish(&mut self) -> Result<Option<String>> {
        if self.buffer.is_empty() {
            return Ok(None);
        }
        self.take_line().map(Some)
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        if self.buffer.len() + bytes.len() > self.max_line_size {
            let size = self.buffer.len() + bytes.len();
            self.buffer.clear();
            return Err(ClientError::invalid_response(format!(
                "Line overflow: {} bytes exceeds maximum {}",
                size, self.max_line_size
            )));
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn take_line(&mut self) -> Result<String> {
        let mut raw = std::mem::take(&mut self.buffer);
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        String::from_utf8(raw).map_err(|e| {
            ClientError::invalid_response(format!("Invalid UTF-8 in streaming response: {}", e))
        })
    }

    /// Get current buffer size
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode one protocol line; `None` for blank lines
pub fn decode_line(line: &str) -> Result<Option<GenerationChunk>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let chunk: GenerationChunk = serde_json::from_str(line).map_err(|e| {
        ClientError::invalid_response(format!("Invalid JSON in streaming response: {}", e))
    })?;
    trace!(done = chunk.done, fragment_len = chunk.fragment().len(), "decoded chunk");

    Ok(Some(chunk))
}

/// Decode a sequence of already-split lines lazily
///
/// Yields one item per non-blank line; after the first error the iterator
/// is exhausted.
pub fn decode_lines<I>(lines: I) -> DecodeLines<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    DecodeLines {
        lines: lines.into_iter(),
        failed: false,
    }
}

/// Iterator returned by [`decode_lines`]
#[derive(Debug)]
pub struct DecodeLines<I> {
    lines: I,
    failed: bool,
}

impl<I> Iterator for DecodeLines<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Result<GenerationChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        for line in self.lines.by_ref() {
            match decode_line(line.as_ref()) {
                Ok(Some(chunk)) => return Some(Ok(chunk)),
                Ok(None) => continue,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
