//! Generation records
//!
//! `GenerationChunk` is one decoded line of `POST /api/generate` output.
//! `GenerationResult` is the complete outcome of one generation call.

use crate::errors::{ClientError, Result};
use crate::metrics::tokens_per_second;
use serde::{Deserialize, Serialize};

/// Timing and counter fields reported by the server
///
/// Durations are nanoseconds. Every field is optional: a field missing from
/// the record stays `None` and is never coerced to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTimings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_duration: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_duration: Option<u64>,
}

impl GenerationTimings {
    /// Generated tokens per second
    pub fn tokens_per_second(&self) -> Option<f64> {
        tokens_per_second(self.eval_count, self.eval_duration)
    }

    /// Prompt evaluation tokens per second
    pub fn prompt_tokens_per_second(&self) -> Option<f64> {
        tokens_per_second(self.prompt_eval_count, self.prompt_eval_duration)
    }
}

/// One decoded line of the streaming protocol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationChunk {
    /// Text fragment carried by this line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    /// Set on the terminal chunk
    #[serde(default)]
    pub done: bool,

    /// Model name, reliably present only on the terminal chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,

    #[serde(flatten)]
    pub timings: GenerationTimings,

    /// Opaque model state, passed through unmodified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<i64>>,
}

impl GenerationChunk {
    /// Text fragment, empty when the line carried none
    pub fn fragment(&self) -> &str {
        self.response.as_deref().unwrap_or("")
    }

    /// Whether this is the terminal chunk
    pub fn is_final(&self) -> bool {
        self.done
    }
}

/// Complete outcome of a generation call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Full generated text
    pub text: String,

    /// Model that produced the text (empty when the server did not say)
    pub model: String,

    /// Whether the server reported completion
    pub done: bool,

    pub created_at: Option<String>,

    pub done_reason: Option<String>,

    #[serde(flatten)]
    pub timings: GenerationTimings,

    pub context: Option<Vec<i64>>,
}

impl GenerationResult {
    /// Build a result from aggregated text and the last chunk observed.
    ///
    /// Every non-text field comes from `last`; nothing is merged from
    /// earlier chunks.
    pub fn from_terminal(text: String, last: GenerationChunk) -> Self {
        Self {
            text,
            model: last.model.unwrap_or_default(),
            done: last.done,
            created_at: last.created_at,
            done_reason: last.done_reason,
            timings: last.timings,
            context: last.context,
        }
    }

    /// Parse a single non-streamed generation record
    pub fn from_json(json: &str) -> Result<Self> {
        let chunk: GenerationChunk = serde_json::from_str(json)
            .map_err(|e| ClientError::invalid_response(format!("Invalid generation record: {}", e)))?;
        Ok(Self::from(chunk))
    }

    /// Whether the server reported completion
    pub fn is_complete(&self) -> bool {
        self.done
    }

    /// Generated tokens per second, when the server reported enough timing data
    pub fn tokens_per_second(&self) -> Option<f64> {
        self.timings.tokens_per_second()
    }

    /// Prompt evaluation tokens per second
    pub fn prompt_tokens_per_second(&self) -> Option<f64> {
        self.timings.prompt_tokens_per_second()
    }
}

impl From<GenerationChunk> for GenerationResult {
    fn from(chunk: GenerationChunk) -> Self {
        let text = chunk.fragment().to_string();
        Self::from_terminal(text, chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_absent_fields_stay_absent() {
        let chunk: GenerationChunk =
            serde_json::from_str(r#"{"response":"Hi","done":false}"#).unwrap();

        assert_eq!(chunk.fragment(), "Hi");
        assert!(!chunk.is_final());
        assert_eq!(chunk.model, None);
        assert_eq!(chunk.timings, GenerationTimings::default());
        assert_eq!(chunk.context, None);
    }

    #[test]
    fn test_chunk_explicit_zero_is_not_absent() {
        let chunk: GenerationChunk =
            serde_json::from_str(r#"{"done":true,"eval_count":0}"#).unwrap();

        assert_eq!(chunk.timings.eval_count, Some(0));
        assert_eq!(chunk.timings.eval_duration, None);
        assert_eq!(chunk.fragment(), "");
    }

    #[test]
    fn test_from_json_complete() {
        let json = r#"{
            "response": "Hello world",
            "model": "llama2",
            "done": true,
            "context": [1, 2, 3],
            "total_duration": 1000000000,
            "load_duration": 500000000,
            "eval_count": 10,
            "eval_duration": 200000000
        }"#;

        let result = GenerationResult::from_json(json).unwrap();

        assert_eq!(result.text, "Hello world");
        assert_eq!(result.model, "llama2");
        assert!(result.is_complete());
        assert_eq!(result.context, Some(vec![1, 2, 3]));
        assert_eq!(result.timings.total_duration, Some(1_000_000_000));
        assert_eq!(result.timings.eval_count, Some(10));
        assert_eq!(result.tokens_per_second(), Some(50.0));
    }

    #[test]
    fn test_from_json_minimal() {
        let result = GenerationResult::from_json(r#"{"response":"Hi","model":"test","done":false}"#).unwrap();

        assert_eq!(result.text, "Hi");
        assert_eq!(result.model, "test");
        assert!(!result.is_complete());
        assert_eq!(result.context, None);
        assert_eq!(result.timings.total_duration, None);
    }

    #[test]
    fn test_from_json_empty_object() {
        let result = GenerationResult::from_json("{}").unwrap();

        assert_eq!(result.text, "");
        assert_eq!(result.model, "");
        assert!(!result.done);
        assert_eq!(result.tokens_per_second(), None);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = GenerationResult::from_json("not json").unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse { .. }));
    }
}
