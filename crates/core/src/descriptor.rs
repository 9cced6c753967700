//! Field descriptor normalization.
//!
//! Engines report per-field metadata in whatever shape the document
//! happens to produce. This module resolves that shape once, at
//! [`RawFieldShape::of`], and turns it into a stable [`FieldDescriptor`].
//! Normalization never aborts an inspection: a field that cannot be read
//! still yields a descriptor with defaults and a `parseError` note.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::engine::RawField;

/// Name used when the engine reports a field without one.
pub const UNKNOWN_FIELD_NAME: &str = "unknown";

/// The kinds of form field exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Checkbox,
    Radio,
    Dropdown,
}

impl FieldKind {
    /// Match a free-form engine type hint, case-insensitively.
    pub fn from_hint(hint: &str) -> FieldKind {
        let hint = hint.to_lowercase();
        if hint.contains("checkbox") || hint.contains("check") {
            FieldKind::Checkbox
        } else if hint.contains("radio") {
            FieldKind::Radio
        } else if hint.contains("dropdown") || hint.contains("choice") {
            FieldKind::Dropdown
        } else {
            FieldKind::Text
        }
    }
}

/// Normalized metadata for one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub required: bool,
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl FieldDescriptor {
    /// A plain text field with every optional attribute unset.
    pub fn text(name: impl Into<String>) -> Self {
        FieldDescriptor {
            name: name.into(),
            kind: FieldKind::Text,
            required: false,
            default_value: None,
            options: None,
            max_length: None,
            parse_error: None,
        }
    }
}

/// The shapes raw engine metadata can take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawFieldShape<'a> {
    Record(&'a serde_json::Map<String, serde_json::Value>),
    Sequence(&'a [serde_json::Value]),
    Absent,
    Other(&'a serde_json::Value),
}

impl<'a> RawFieldShape<'a> {
    pub fn of(metadata: &'a serde_json::Value) -> Self {
        match metadata {
            serde_json::Value::Object(map) => RawFieldShape::Record(map),
            serde_json::Value::Array(items) => RawFieldShape::Sequence(items),
            serde_json::Value::Null => RawFieldShape::Absent,
            other => RawFieldShape::Other(other),
        }
    }
}

// ── Value casts ──────────────────────────────────────────────────────

fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "record",
    }
}

/// Strings pass through unquoted; anything else becomes its JSON text.
fn cast_str(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truthy(v: &serde_json::Value) -> bool {
    match v {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}

/// A positive integer from a number or numeric string, else `None`.
fn positive_int(v: &serde_json::Value) -> Option<u32> {
    let n = match v {
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64()?;
                if !f.is_finite() {
                    return None;
                }
                f.trunc() as i64
            }
        },
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    if n > 0 {
        u32::try_from(n).ok()
    } else {
        None
    }
}

fn option_list(v: Option<&serde_json::Value>) -> Option<Vec<String>> {
    v.and_then(|o| o.as_array())
        .map(|arr| arr.iter().map(cast_str).collect())
}

// ── Normalization ────────────────────────────────────────────────────

fn read_record(
    mut descriptor: FieldDescriptor,
    record: &serde_json::Map<String, serde_json::Value>,
) -> FieldDescriptor {
    let hint = record
        .get("type")
        .map(cast_str)
        .unwrap_or_else(|| "text".to_string());

    descriptor.kind = FieldKind::from_hint(&hint);
    match descriptor.kind {
        FieldKind::Radio | FieldKind::Dropdown => {
            descriptor.options = option_list(record.get("options"));
        }
        FieldKind::Text => {
            descriptor.max_length = record.get("maxLength").and_then(positive_int);
        }
        FieldKind::Checkbox => {}
    }

    if let Some(required) = record.get("required") {
        descriptor.required = truthy(required);
    }

    descriptor.default_value = record
        .get("defaultValue")
        .filter(|v| !v.is_null())
        .map(cast_str);

    descriptor
}

fn try_normalize(name: &str, metadata: &serde_json::Value) -> Result<FieldDescriptor, String> {
    if name.is_empty() {
        return Err("Invalid field name".to_string());
    }

    let descriptor = FieldDescriptor::text(name);
    match RawFieldShape::of(metadata) {
        RawFieldShape::Record(record) => Ok(read_record(descriptor, record)),
        RawFieldShape::Sequence(items) if items.is_empty() => Ok(descriptor),
        RawFieldShape::Sequence(items) => Ok(FieldDescriptor {
            kind: FieldKind::Dropdown,
            options: Some(
                items
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(cast_str)
                    .collect(),
            ),
            ..descriptor
        }),
        RawFieldShape::Absent => Ok(descriptor),
        RawFieldShape::Other(other) => Err(format!(
            "unsupported field metadata shape: {}",
            json_type_name(other)
        )),
    }
}

/// Normalize one field. Always produces a usable descriptor.
pub fn normalize_field(name: &str, metadata: &serde_json::Value) -> FieldDescriptor {
    match try_normalize(name, metadata) {
        Ok(descriptor) => descriptor,
        Err(reason) => {
            tracing::warn!(field = name, %reason, "field metadata could not be normalized");
            let fallback_name = if name.is_empty() {
                UNKNOWN_FIELD_NAME
            } else {
                name
            };
            FieldDescriptor {
                parse_error: Some(reason),
                ..FieldDescriptor::text(fallback_name)
            }
        }
    }
}

/// Normalize an engine listing, preserving its order.
///
/// A repeated name keeps its first occurrence so descriptor names stay
/// unique within a document.
pub fn normalize_fields(raw: &[RawField]) -> Vec<FieldDescriptor> {
    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(raw.len());
    for field in raw {
        if !seen.insert(field.name.as_str()) {
            tracing::debug!(field = %field.name, "skipping repeated field name");
            continue;
        }
        fields.push(normalize_field(&field.name, &field.metadata));
    }
    fields
}
