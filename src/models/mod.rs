//! Installed model listing
//!
//! Types returned by `OllamaClient::list_models`.

pub mod types;

// Re-export key types for convenience
pub use types::{ModelDetails, ModelEntry, ModelListing};
