//! Generation parameters
//!
//! A typed set of well-known sampling fields plus one pass-through bag for
//! everything else. Values are flattened into the top level of the
//! `/api/generate` request body.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Pass-through parameter value
///
/// Only scalars and flat lists of scalars are representable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<ParamValue>),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<u64> for ParamValue {
    fn from(v: u64) -> Self {
        ParamValue::UInt(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// Parameters attached to a generation request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u64>,

    #[serde(flatten)]
    extra: BTreeMap<String, ParamValue>,
}

impl GenerationParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sampling temperature, valid in [0, 2]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Nucleus sampling threshold, valid in [0, 1]
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Top-k sampling, at least 1
    pub fn with_top_k(mut self, top_k: u64) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Maximum number of tokens to generate (`num_predict` on the wire)
    pub fn with_max_tokens(self, max_tokens: i64) -> Self {
        self.with("num_predict", max_tokens)
    }

    /// Stop sequences
    pub fn with_stop<I, S>(self, stop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = stop.into_iter().map(|s| ParamValue::Str(s.into())).collect();
        self.with("stop", ParamValue::List(list))
    }

    /// Any other parameter, passed through as-is
    pub fn with<K: Into<String>, V: Into<ParamValue>>(mut self, key: K, value: V) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn top_p(&self) -> Option<f64> {
        self.top_p
    }

    pub fn top_k(&self) -> Option<u64> {
        self.top_k
    }

    /// Look up a pass-through parameter
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.extra.get(key)
    }

    /// Number of parameters set, typed and pass-through
    pub fn len(&self) -> usize {
        [self.temperature.is_some(), self.top_p.is_some(), self.top_k.is_some()]
            .iter()
            .filter(|set| **set)
            .count()
            + self.extra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into the JSON object merged into the request body
    pub fn to_json_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub(crate) fn from_parts(
        temperature: Option<f64>,
        top_p: Option<f64>,
        top_k: Option<u64>,
        extra: BTreeMap<String, ParamValue>,
    ) -> Self {
        Self {
            temperature,
            top_p,
            top_k,
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_serializes_flat() {
        let params = GenerationParameters::new()
            .with_temperature(0.7)
            .with_top_k(40)
            .with_max_tokens(128)
            .with_stop(["\n\n"]);

        let map = params.to_json_map();
        assert_eq!(map.get("temperature"), Some(&json!(0.7)));
        assert_eq!(map.get("top_k"), Some(&json!(40)));
        assert_eq!(map.get("num_predict"), Some(&json!(128)));
        assert_eq!(map.get("stop"), Some(&json!(["\n\n"])));
        assert!(!map.contains_key("top_p"));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_empty() {
        let params = GenerationParameters::new();
        assert!(params.is_empty());
        assert!(params.to_json_map().is_empty());
    }
}
