//! Field mapping precondition check.
//!
//! Runs before any fill is attempted and never touches the document.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::Limits;
use crate::error::ProcessError;
use crate::value::{char_len, too_long_message, FieldValue};

/// Check proposed mappings against the field names a document really has.
///
/// Rejects (data-kind) a document without fields, any mapped name the
/// document does not contain, and any string value over the length
/// ceiling.
pub fn validate_mappings(
    field_names: &[String],
    mappings: &BTreeMap<String, FieldValue>,
    limits: &Limits,
) -> Result<(), ProcessError> {
    if field_names.is_empty() {
        return Err(ProcessError::data(
            "PDF contains no fillable fields. Please ensure the PDF has form fields.",
        ));
    }

    let available: BTreeSet<&str> = field_names.iter().map(String::as_str).collect();
    let unknown: Vec<&str> = mappings
        .keys()
        .map(String::as_str)
        .filter(|name| !available.contains(name))
        .collect();

    if !unknown.is_empty() {
        return Err(ProcessError::data(format!(
            "Fields not found in PDF: {}. Available fields: {}",
            unknown.join(", "),
            preview(&available, limits.field_preview)
        )));
    }

    for (name, value) in mappings {
        if let FieldValue::Text(s) = value {
            if char_len(s) > limits.max_value_chars {
                return Err(ProcessError::data(too_long_message(name, limits)));
            }
        }
    }

    Ok(())
}

/// First `limit` names in sorted order, with a count of the rest.
fn preview(names: &BTreeSet<&str>, limit: usize) -> String {
    let mut shown = names.iter().take(limit).copied().collect::<Vec<_>>().join(", ");
    if names.len() > limit {
        shown.push_str(&format!(" (and {} more)", names.len() - limit));
    }
    shown
}
