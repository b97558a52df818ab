//! Generation parameter validator
//!
//! Checks a raw JSON parameter map field by field and produces a typed
//! `GenerationParameters`. The first invalid field aborts validation.

use crate::errors::{ClientError, Result};
use crate::types::{GenerationParameters, ParamValue};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Temperature bounds (inclusive)
pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);

/// Nucleus sampling bounds (inclusive)
pub const TOP_P_RANGE: (f64, f64) = (0.0, 1.0);

/// Keys owned by the request body itself
pub const RESERVED_KEYS: [&str; 3] = ["model", "prompt", "stream"];

/// Validate and normalize a raw parameter map
///
/// - `temperature`: number in [0, 2], normalized to float
/// - `top_p`: number in [0, 1], normalized to float
/// - `top_k`: integer >= 1
/// - anything else: string, integer, float, boolean, or a list of those
pub fn validate_parameters(raw: &Map<String, Value>) -> Result<GenerationParameters> {
    let temperature = match raw.get("temperature") {
        Some(value) => Some(bounded_float("temperature", value, TEMPERATURE_RANGE)?),
        None => None,
    };

    let top_p = match raw.get("top_p") {
        Some(value) => Some(bounded_float("top_p", value, TOP_P_RANGE)?),
        None => None,
    };

    let top_k = match raw.get("top_k") {
        Some(value) => Some(positive_integer("top_k", value)?),
        None => None,
    };

    let mut extra = BTreeMap::new();
    for (key, value) in raw {
        if matches!(key.as_str(), "temperature" | "top_p" | "top_k") {
            continue;
        }
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(ClientError::validation(
                key.as_str(),
                "reserved request field cannot be passed as a parameter",
            ));
        }
        extra.insert(key.clone(), pass_through(key, value)?);
    }

    Ok(GenerationParameters::from_parts(temperature, top_p, top_k, extra))
}

fn bounded_float(field: &str, value: &Value, (min, max): (f64, f64)) -> Result<f64> {
    match value.as_f64() {
        Some(v) if v >= min && v <= max => Ok(v),
        _ => Err(ClientError::validation(
            field,
            format!("must be a number between {} and {}", min, max),
        )),
    }
}

fn positive_integer(field: &str, value: &Value) -> Result<u64> {
    value
        .as_u64()
        .filter(|v| *v >= 1)
        .ok_or_else(|| ClientError::validation(field, "must be a positive integer"))
}

fn pass_through(field: &str, value: &Value) -> Result<ParamValue> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| scalar(item).ok_or_else(|| invalid_type(field, item)))
            .collect::<Result<Vec<_>>>()
            .map(ParamValue::List),
        other => scalar(other).ok_or_else(|| invalid_type(field, other)),
    }
}

fn scalar(value: &Value) -> Option<ParamValue> {
    match value {
        Value::Bool(b) => Some(ParamValue::Bool(*b)),
        Value::String(s) => Some(ParamValue::Str(s.clone())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(ParamValue::Int(i))
            } else if let Some(u) = n.as_u64() {
                Some(ParamValue::UInt(u))
            } else {
                n.as_f64().map(ParamValue::Float)
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn invalid_type(field: &str, value: &Value) -> ClientError {
    let kind = match value {
        Value::Null => "null",
        Value::Array(_) => "nested list",
        Value::Object(_) => "object",
        _ => "value",
    };
    ClientError::validation(field, format!("invalid parameter type: {}", kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn rejected_field(value: Value) -> String {
        match validate_parameters(&map(value)).unwrap_err() {
            ClientError::Validation { field, .. } => field,
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_valid_sampling_fields() {
        let params =
            validate_parameters(&map(json!({"temperature": 0.8, "top_p": 0.9, "top_k": 40})))
                .unwrap();

        assert_eq!(params.temperature(), Some(0.8));
        assert_eq!(params.top_p(), Some(0.9));
        assert_eq!(params.top_k(), Some(40));
        assert_eq!(
            Value::Object(params.to_json_map()),
            json!({"temperature": 0.8, "top_p": 0.9, "top_k": 40})
        );
    }

    #[test]
    fn test_integer_temperature_normalized_to_float() {
        let params = validate_parameters(&map(json!({"temperature": 1, "top_p": 1}))).unwrap();
        assert_eq!(params.temperature(), Some(1.0));
        assert!(params.to_json_map()["temperature"].is_f64());
        assert!(params.to_json_map()["top_p"].is_f64());
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(rejected_field(json!({"temperature": 5.0})), "temperature");
        assert_eq!(rejected_field(json!({"temperature": -0.1})), "temperature");
        assert_eq!(rejected_field(json!({"top_p": 1.5})), "top_p");
        assert_eq!(rejected_field(json!({"top_k": -1})), "top_k");
        assert_eq!(rejected_field(json!({"top_k": 0})), "top_k");
    }

    #[test]
    fn test_wrong_types_for_known_fields() {
        assert_eq!(rejected_field(json!({"temperature": "hot"})), "temperature");
        assert_eq!(rejected_field(json!({"top_k": 40.5})), "top_k");
        assert_eq!(rejected_field(json!({"top_k": true})), "top_k");
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let params =
            validate_parameters(&map(json!({"temperature": 2.0, "top_p": 0.0, "top_k": 1})))
                .unwrap();
        assert_eq!(params.temperature(), Some(2.0));
        assert_eq!(params.top_p(), Some(0.0));
        assert_eq!(params.top_k(), Some(1));
    }

    #[test]
    fn test_pass_through_scalars_and_lists() {
        let params = validate_parameters(&map(json!({
            "num_predict": 100,
            "seed": 42,
            "repeat_penalty": 1.1,
            "raw": false,
            "system": "be brief",
            "stop": ["\n", "###"]
        })))
        .unwrap();

        assert_eq!(params.get("num_predict"), Some(&ParamValue::Int(100)));
        assert_eq!(params.get("repeat_penalty"), Some(&ParamValue::Float(1.1)));
        assert_eq!(params.get("raw"), Some(&ParamValue::Bool(false)));
        assert_eq!(params.get("system"), Some(&ParamValue::Str("be brief".into())));
        assert_eq!(
            params.get("stop"),
            Some(&ParamValue::List(vec![
                ParamValue::Str("\n".into()),
                ParamValue::Str("###".into())
            ]))
        );
        assert_eq!(params.len(), 6);
    }

    #[test]
    fn test_large_integers_keep_their_value() {
        let params = validate_parameters(&map(json!({
            "seed": u64::MAX,
            "stop": [u64::MAX, -1]
        })))
        .unwrap();

        assert_eq!(params.get("seed"), Some(&ParamValue::UInt(u64::MAX)));
        let body = params.to_json_map();
        assert_eq!(body["seed"], json!(18446744073709551615u64));
        assert_eq!(body["stop"], json!([18446744073709551615u64, -1]));
    }

    #[test]
    fn test_top_k_accepts_wide_integers() {
        let params = validate_parameters(&map(json!({"top_k": 5_000_000_000u64}))).unwrap();
        assert_eq!(params.top_k(), Some(5_000_000_000));
        assert_eq!(params.to_json_map()["top_k"], json!(5_000_000_000u64));
    }

    #[test]
    fn test_rejects_objects_and_nesting() {
        assert_eq!(rejected_field(json!({"options": {"num_ctx": 4096}})), "options");
        assert_eq!(rejected_field(json!({"stop": [["a"]]})), "stop");
        assert_eq!(rejected_field(json!({"format": null})), "format");
    }

    #[test]
    fn test_rejects_reserved_keys() {
        assert_eq!(rejected_field(json!({"stream": false})), "stream");
        assert_eq!(rejected_field(json!({"model": "other"})), "model");
    }

    #[test]
    fn test_empty_map() {
        assert!(validate_parameters(&Map::new()).unwrap().is_empty());
    }
}
