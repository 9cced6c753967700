//! Caller values and their coercion into engine text.
//!
//! The engine only accepts strings. Booleans map onto the checkbox
//! sentinels `"Yes"` / `"Off"`, numbers onto their decimal text, and
//! lists or maps onto compact JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Limits;
use crate::error::ProcessError;

/// Checkbox sentinel written for `true`.
pub const CHECKED: &str = "Yes";
/// Checkbox sentinel written for `false`.
pub const UNCHECKED: &str = "Off";

/// Field name to engine text, ready for [`crate::FormEngine::fill_form`].
pub type CoercedMapping = BTreeMap<String, String>;

/// A caller-supplied field value, as it arrives in `fieldMappings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Whether this value counts toward `filledFieldCount`.
    pub fn counts_as_filled(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Text(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Returns a human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Integer(_) | FieldValue::Unsigned(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "string",
            FieldValue::List(_) => "list",
            FieldValue::Map(_) => "map",
        }
    }

    fn has_non_finite(&self) -> bool {
        match self {
            FieldValue::Float(f) => !f.is_finite(),
            FieldValue::List(items) => items.iter().any(FieldValue::has_non_finite),
            FieldValue::Map(entries) => entries.values().any(FieldValue::has_non_finite),
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

/// Number of characters in `s`, as counted by the value-length ceiling.
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

pub(crate) fn too_long_message(field: &str, limits: &Limits) -> String {
    format!(
        "Value for field '{}' is too long (>{} characters)",
        field, limits.max_value_chars
    )
}

fn conversion_error(field: &str, reason: impl std::fmt::Display) -> ProcessError {
    ProcessError::data(format!("Field conversion error for '{}': {}", field, reason))
}

fn float_text(f: f64) -> String {
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

/// Coerce one value. `Ok(None)` means the field is left unchanged.
pub fn coerce_value(
    field: &str,
    value: &FieldValue,
    limits: &Limits,
) -> Result<Option<String>, ProcessError> {
    let text = match value {
        FieldValue::Null => return Ok(None),
        FieldValue::Bool(true) => CHECKED.to_string(),
        FieldValue::Bool(false) => UNCHECKED.to_string(),
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Unsigned(u) => u.to_string(),
        FieldValue::Float(f) if f.is_nan() => {
            return Err(conversion_error(
                field,
                format!("Invalid numeric value (NaN) for field '{}'", field),
            ));
        }
        FieldValue::Float(f) => float_text(*f),
        FieldValue::Text(s) => {
            if char_len(s) > limits.max_value_chars {
                return Err(conversion_error(field, too_long_message(field, limits)));
            }
            s.clone()
        }
        FieldValue::List(_) | FieldValue::Map(_) => {
            if value.has_non_finite() {
                return Err(conversion_error(
                    field,
                    format!(
                        "Cannot convert complex value for field '{}' to string: non-finite number",
                        field
                    ),
                ));
            }
            serde_json::to_string(value).map_err(|e| {
                conversion_error(
                    field,
                    format!(
                        "Cannot convert complex value for field '{}' to string: {}",
                        field, e
                    ),
                )
            })?
        }
    };
    Ok(Some(text))
}

/// Coerce every mapping entry, dropping nulls.
///
/// Fails when nothing is left to write: an all-null mapping is rejected
/// rather than treated as an empty fill.
pub fn coerce_mappings(
    mappings: &BTreeMap<String, FieldValue>,
    limits: &Limits,
) -> Result<CoercedMapping, ProcessError> {
    let mut coerced = CoercedMapping::new();
    for (field, value) in mappings {
        if let Some(text) = coerce_value(field, value, limits)? {
            coerced.insert(field.clone(), text);
        }
    }

    if coerced.is_empty() {
        return Err(ProcessError::data(
            "No valid field mappings found after conversion",
        ));
    }

    tracing::debug!(
        supplied = mappings.len(),
        coerced = coerced.len(),
        "coerced field mappings"
    );
    Ok(coerced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;
    use serde_json::json;

    fn coerce(value: FieldValue) -> Result<Option<String>, ProcessError> {
        coerce_value("Field", &value, &Limits::default())
    }

    #[test]
    fn deserializes_every_json_shape() {
        let raw = json!({
            "a": null, "b": true, "c": 7, "d": 2.5, "e": "x",
            "f": [1, "two"], "g": {"k": false}, "h": 18446744073709551615u64
        });
        let parsed: BTreeMap<String, FieldValue> = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed["a"], FieldValue::Null);
        assert_eq!(parsed["b"], FieldValue::Bool(true));
        assert_eq!(parsed["c"], FieldValue::Integer(7));
        assert_eq!(parsed["d"], FieldValue::Float(2.5));
        assert_eq!(parsed["e"], FieldValue::Text("x".into()));
        assert_eq!(parsed["h"], FieldValue::Unsigned(u64::MAX));
        assert!(matches!(parsed["f"], FieldValue::List(_)));
        assert!(matches!(parsed["g"], FieldValue::Map(_)));
    }

    #[test]
    fn null_is_dropped() {
        assert_eq!(coerce(FieldValue::Null).unwrap(), None);
    }

    #[test]
    fn booleans_use_checkbox_sentinels() {
        assert_eq!(coerce(true.into()).unwrap().as_deref(), Some("Yes"));
        assert_eq!(coerce(false.into()).unwrap().as_deref(), Some("Off"));
    }

    #[test]
    fn numbers_render_as_decimal_text() {
        assert_eq!(coerce(FieldValue::Integer(-42)).unwrap().as_deref(), Some("-42"));
        assert_eq!(coerce(FieldValue::Float(3.0)).unwrap().as_deref(), Some("3.0"));
        assert_eq!(coerce(FieldValue::Float(0.25)).unwrap().as_deref(), Some("0.25"));
        assert_eq!(
            coerce(FieldValue::Float(f64::INFINITY)).unwrap().as_deref(),
            Some("inf")
        );
    }

    #[test]
    fn nan_is_a_data_error_naming_the_field() {
        let err = coerce_value("Age", &FieldValue::Float(f64::NAN), &Limits::default())
            .unwrap_err();
        assert_eq!(err.declared_kind(), Some(ErrorKind::Data));
        assert!(err.to_string().contains("'Age'"));
        assert!(err.to_string().contains("NaN"));
    }

    #[test]
    fn long_strings_are_rejected() {
        let long = "x".repeat(10_001);
        let err = coerce(FieldValue::Text(long)).unwrap_err();
        assert_eq!(err.declared_kind(), Some(ErrorKind::Data));
        assert!(err.to_string().contains(">10000 characters"));

        let exact = "x".repeat(10_000);
        assert_eq!(coerce(FieldValue::Text(exact.clone())).unwrap(), Some(exact));
    }

    #[test]
    fn ceiling_counts_characters_not_bytes() {
        let accented = "é".repeat(10_000);
        assert!(coerce(FieldValue::Text(accented)).is_ok());
    }

    #[test]
    fn structured_values_become_compact_json() {
        let value: FieldValue = serde_json::from_value(json!({"b": [1, 2], "a": "x"})).unwrap();
        assert_eq!(
            coerce(value).unwrap().as_deref(),
            Some(r#"{"a":"x","b":[1,2]}"#)
        );
    }

    #[test]
    fn nested_nan_fails_serialization() {
        let value = FieldValue::List(vec![FieldValue::Float(f64::NAN)]);
        let err = coerce(value).unwrap_err();
        assert_eq!(err.declared_kind(), Some(ErrorKind::Data));
        assert!(err.to_string().contains("Cannot convert complex value"));
    }

    #[test]
    fn all_null_mapping_fails() {
        let mut mappings = BTreeMap::new();
        mappings.insert("A".to_string(), FieldValue::Null);
        mappings.insert("B".to_string(), FieldValue::Null);
        let err = coerce_mappings(&mappings, &Limits::default()).unwrap_err();
        assert_eq!(err.declared_kind(), Some(ErrorKind::Data));
        assert_eq!(err.to_string(), "No valid field mappings found after conversion");
    }

    #[test]
    fn mapping_keeps_non_null_entries() {
        let mut mappings = BTreeMap::new();
        mappings.insert("Name".to_string(), FieldValue::from("Ann"));
        mappings.insert("Skip".to_string(), FieldValue::Null);
        mappings.insert("Subscribe".to_string(), FieldValue::from(true));
        let coerced = coerce_mappings(&mappings, &Limits::default()).unwrap();
        assert_eq!(coerced.len(), 2);
        assert_eq!(coerced["Name"], "Ann");
        assert_eq!(coerced["Subscribe"], "Yes");
    }

    #[test]
    fn filled_count_excludes_null_and_empty_text() {
        assert!(!FieldValue::Null.counts_as_filled());
        assert!(!FieldValue::from("").counts_as_filled());
        assert!(FieldValue::from(false).counts_as_filled());
        assert!(FieldValue::Integer(0).counts_as_filled());
    }

    proptest! {
        #[test]
        fn string_coercion_is_identity(s in "\\PC{0,200}") {
            let out = coerce(FieldValue::Text(s.clone())).unwrap();
            prop_assert_eq!(out, Some(s));
        }

        #[test]
        fn bool_coercion_is_fixed(b in any::<bool>()) {
            let out = coerce(FieldValue::Bool(b)).unwrap().unwrap();
            prop_assert_eq!(out, if b { "Yes" } else { "Off" });
        }

        #[test]
        fn finite_floats_never_render_as_nan(f in proptest::num::f64::NORMAL) {
            let out = coerce(FieldValue::Float(f)).unwrap().unwrap();
            prop_assert!(!out.to_lowercase().contains("nan"));
        }
    }
}
