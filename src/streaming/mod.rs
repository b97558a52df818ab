//! Streaming generation module
//!
//! Provides the Ollama API client, the incremental line decoder, the chunk
//! stream built on top of it, and the aggregator that folds a stream into
//! one result.

pub mod aggregate;
pub mod client;
pub mod parser;
pub mod stream;

// Re-export commonly used types
pub use aggregate::{aggregate, aggregate_chunks, aggregate_text, Aggregator};
pub use client::{Generation, OllamaClient, GENERATE_ENDPOINT, HEALTH_CHECK_TIMEOUT, TAGS_ENDPOINT};
pub use parser::{decode_line, decode_lines, DecodeLines, LineDecoder, MAX_LINE_SIZE};
pub use stream::{chunk_stream, ChunkStream};
