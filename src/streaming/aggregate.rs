//! Streaming aggregation
//!
//! Folds a chunk sequence into one `GenerationResult`. Text fragments are
//! concatenated in arrival order; every other field is taken from the last
//! chunk observed. Metadata carried only by earlier chunks is dropped, which
//! is correct as long as the server keeps putting it on the terminal line.

use crate::errors::{ClientError, Result};
use crate::types::{GenerationChunk, GenerationResult};
use futures_util::stream::{Stream, StreamExt};

/// Running fold over a chunk sequence
#[derive(Debug, Default)]
pub struct Aggregator {
    text: String,
    last: Option<GenerationChunk>,
    chunks: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in the next chunk
    pub fn push(&mut self, chunk: GenerationChunk) {
        self.text.push_str(chunk.fragment());
        self.chunks += 1;
        self.last = Some(chunk);
    }

    /// Text accumulated so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of chunks folded in
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Produce the final result; fails if no chunk was ever pushed
    pub fn finish(self) -> Result<GenerationResult> {
        match self.last {
            Some(last) => Ok(GenerationResult::from_terminal(self.text, last)),
            None => Err(ClientError::invalid_response("No response received from API")),
        }
    }
}

/// Aggregate an in-memory chunk sequence
pub fn aggregate_chunks<I>(chunks: I) -> Result<GenerationResult>
where
    I: IntoIterator<Item = GenerationChunk>,
{
    let mut aggregator = Aggregator::new();
    for chunk in chunks {
        aggregator.push(chunk);
    }
    aggregator.finish()
}

/// Drain a chunk stream into one result, propagating the first error
pub async fn aggregate<S>(mut chunks: S) -> Result<GenerationResult>
where
    S: Stream<Item = Result<GenerationChunk>> + Unpin,
{
    let mut aggregator = Aggregator::new();
    while let Some(chunk) = chunks.next().await {
        aggregator.push(chunk?);
    }
    aggregator.finish()
}

/// Concatenate only the text fragments of a chunk sequence
pub fn aggregate_text<'a, I>(chunks: I) -> String
where
    I: IntoIterator<Item = &'a GenerationChunk>,
{
    chunks.into_iter().map(GenerationChunk::fragment).collect()
}
