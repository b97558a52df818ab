//! Model listing types
//!
//! Shape of the `GET /api/tags` response.

use serde::{Deserialize, Serialize};
use std::fmt;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One installed model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Model name (e.g., "llama3.1:8b")
    pub name: String,

    /// Model size in bytes
    #[serde(default)]
    pub size: u64,

    /// Last modification time, as reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,

    /// Model digest/hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ModelDetails>,
}

/// Detailed model information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDetails {
    /// Model format (e.g., "gguf")
    #[serde(default)]
    pub format: Option<String>,

    /// Model family (e.g., "llama", "qwen2")
    #[serde(default)]
    pub family: Option<String>,

    /// Parameter size (e.g., "7B", "13B")
    #[serde(default)]
    pub parameter_size: Option<String>,

    /// Quantization level (e.g., "Q4_0", "Q4_K_M")
    #[serde(default)]
    pub quantization_level: Option<String>,
}

/// Response from `/api/tags`, in server order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelListing {
    pub models: Vec<ModelEntry>,
}

impl ModelEntry {
    /// Size in mebibytes
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / BYTES_PER_MB
    }
}

impl fmt::Display for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1} MB)", self.name, self.size_mb())
    }
}

impl ModelListing {
    /// Model names in server order
    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    /// Find a model by exact name
    pub fn find(&self, name: &str) -> Option<&ModelEntry> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Human-readable listing for terminal output
    pub fn summary(&self) -> String {
        if self.models.is_empty() {
            return "No models available".to_string();
        }

        let mut out = String::from("Available Models:");
        for model in &self.models {
            out.push_str(&format!("\n  - {}", model));
        }
        out
    }
}
