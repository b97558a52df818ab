//! Type definitions module
//!
//! Wire records of the generation protocol and the parameters sent with them.

pub mod generation;
pub mod params;

// Re-export commonly used types
pub use generation::{GenerationChunk, GenerationResult, GenerationTimings};
pub use params::{GenerationParameters, ParamValue};
