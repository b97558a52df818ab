//! Pull-based chunk stream
//!
//! Wraps a response body byte stream and yields decoded chunks on demand.
//! The stream owns the body: dropping it, whether after the terminal chunk,
//! after an error, or early, releases the underlying connection.

use crate::errors::{ClientError, Result};
use crate::streaming::parser::{decode_line, LineDecoder};
use crate::types::GenerationChunk;
use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::timeout;

/// Stream of decoded generation chunks
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<GenerationChunk>> + Send>>;

struct DecodeState<S> {
    bytes: Pin<Box<S>>,
    decoder: LineDecoder,
    pending: VecDeque<GenerationChunk>,
    error: Option<ClientError>,
    finished: bool,
    read_timeout: Option<Duration>,
}

impl<S> DecodeState<S>
where
    S: Stream<Item = Result<Bytes>>,
{
    /// Decode lines in order, keeping good chunks ahead of the first failure
    fn absorb<I: IntoIterator<Item = String>>(&mut self, lines: I) {
        for line in lines {
            match decode_line(&line) {
                Ok(Some(chunk)) => self.pending.push_back(chunk),
                Ok(None) => {}
                Err(e) => {
                    self.fail(e);
                    return;
                }
            }
        }
    }

    fn fail(&mut self, error: ClientError) {
        self.error = Some(error);
        self.finished = true;
    }

    async fn read(&mut self) -> Option<Result<Bytes>> {
        match self.read_timeout {
            Some(limit) => match timeout(limit, self.bytes.next()).await {
                Ok(next) => next,
                Err(_) => Some(Err(ClientError::timeout(format!(
                    "no data received for {}s while streaming",
                    limit.as_secs_f64()
                )))),
            },
            None => self.bytes.next().await,
        }
    }
}

/// Turn a body byte stream into a chunk stream
///
/// `read_timeout` bounds the wait for each individual read, not the whole
/// generation.
pub fn chunk_stream<S>(bytes: S, read_timeout: Option<Duration>) -> ChunkStream
where
    S: Stream<Item = Result<Bytes>> + Send + 'static,
{
    let state = DecodeState {
        bytes: Box::pin(bytes),
        decoder: LineDecoder::new(),
        pending: VecDeque::new(),
        error: None,
        finished: false,
        read_timeout,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(chunk) = state.pending.pop_front() {
                return Some((Ok(chunk), state));
            }
            if let Some(error) = state.error.take() {
                return Some((Err(error), state));
            }
            if state.finished {
                return None;
            }

            match state.read().await {
                Some(Ok(bytes)) => match state.decoder.push(&bytes) {
                    Ok(lines) => state.absorb(lines),
                    Err(e) => state.fail(e),
                },
                Some(Err(e)) => state.fail(e),
                None => {
                    state.finished = true;
                    match state.decoder.finish() {
                        Ok(tail) => state.absorb(tail),
                        Err(e) => state.fail(e),
                    }
                }
            }
        }
    }))
}
