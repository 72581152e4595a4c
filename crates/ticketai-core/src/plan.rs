//! Query plan decoding
//!
//! A plan is the model's proposal: one view name and one predicate fragment.
//! Decoding is deliberately forgiving. Keys match case-insensitively and any
//! missing or non-string field becomes an empty string, so a model answer of
//! `{}` decodes to an empty plan instead of an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::DecodeError;

/// Untrusted view + fragment pair as proposed by the model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub view: String,
    pub fragment: String,
}

impl QueryPlan {
    pub fn new(view: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            view: view.into(),
            fragment: fragment.into(),
        }
    }

    /// No view was proposed
    pub fn is_empty(&self) -> bool {
        self.view.trim().is_empty()
    }
}

/// Decode extracted model output into a plan
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] when the text is not JSON and
/// [`DecodeError::NotAnObject`] when it is JSON of another type.
pub fn decode_plan(json: &str) -> Result<QueryPlan, DecodeError> {
    let map = decode_object(json)?;
    Ok(QueryPlan {
        view: string_field(&map, "view"),
        fragment: string_field(&map, "fragment"),
    })
}

/// Parse text into a JSON object with lower-cased keys
///
/// On key collisions after lower-casing, the first occurrence wins.
///
/// # Errors
///
/// Same as [`decode_plan`].
pub fn decode_object(json: &str) -> Result<Map<String, Value>, DecodeError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    match value {
        Value::Object(obj) => {
            let mut folded = Map::with_capacity(obj.len());
            for (key, value) in obj {
                folded.entry(key.to_lowercase()).or_insert(value);
            }
            Ok(folded)
        }
        other => Err(DecodeError::NotAnObject(json_type_name(&other))),
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_plan() {
        let plan =
            decode_plan(r#"{"view":"vw_Users_AI_Safe","fragment":"WHERE IsActive = 1"}"#).unwrap();
        assert_eq!(plan, QueryPlan::new("vw_Users_AI_Safe", "WHERE IsActive = 1"));
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let plan = decode_plan(r#"{"View":"v","FRAGMENT":"ORDER BY Id"}"#).unwrap();
        assert_eq!(plan.view, "v");
        assert_eq!(plan.fragment, "ORDER BY Id");
    }

    #[test]
    fn test_missing_and_mistyped_fields_default_to_empty() {
        let plan = decode_plan(r#"{"fragment": 12}"#).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.fragment, "");

        assert_eq!(decode_plan("{}").unwrap(), QueryPlan::default());
    }

    #[test]
    fn test_non_object_is_an_error() {
        assert_eq!(
            decode_plan("[1,2]").unwrap_err(),
            DecodeError::NotAnObject("array")
        );
        assert!(matches!(
            decode_plan("{view: nope").unwrap_err(),
            DecodeError::Malformed(_)
        ));
    }
}
