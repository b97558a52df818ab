//! ollamapipe - Ollama generation client
//!
//! Talks to a local Ollama server over HTTP: model listing, a liveness
//! probe, and text generation in two modes.
//!
//! # Architecture
//!
//! - **Request executor**: `OllamaClient` with bounded retry/backoff
//! - **Line decoder**: newline-delimited JSON into `GenerationChunk`s
//! - **Aggregator**: chunk stream folded into one `GenerationResult`
//! - **Utilities**: throughput metrics and parameter validation
//!
//! ```no_run
//! use futures_util::StreamExt;
//! use ollamapipe::{ClientConfig, GenerationParameters, OllamaClient};
//!
//! # async fn run() -> ollamapipe::Result<()> {
//! let client = OllamaClient::with_config(ClientConfig::from_env()?)?;
//! let params = GenerationParameters::new().with_temperature(0.7);
//!
//! let mut stream = client.generate_stream("llama2", "Why is the sky blue?", Some(&params)).await?;
//! while let Some(chunk) = stream.next().await {
//!     print!("{}", chunk?.fragment());
//! }
//!
//! let result = client.generate_complete("llama2", "Say hi", None).await?;
//! println!("{} ({:?} tok/s)", result.text, result.tokens_per_second());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod retry;
pub mod streaming;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::ClientConfig;
pub use errors::{ClientError, Result};
pub use metrics::tokens_per_second;
pub use models::{ModelEntry, ModelListing};
pub use retry::RetryPolicy;
pub use streaming::{aggregate, aggregate_chunks, ChunkStream, Generation, OllamaClient};
pub use types::{GenerationChunk, GenerationParameters, GenerationResult, GenerationTimings, ParamValue};
pub use validation::validate_parameters;
