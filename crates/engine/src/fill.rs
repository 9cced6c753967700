//! Writing values into AcroForm fields.

use std::collections::BTreeMap;

use formfill_core::EngineError;
use lopdf::{Document, Object, ObjectId};

use crate::acroform::{self, FieldNode, FieldType, FLAG_READ_ONLY, OFF_STATE};
use crate::text;

/// Caller text that turns a checkbox off.
const OFF_WORDS: &[&str] = &["", "off", "false", "no", "0"];

fn object_error(id: ObjectId, e: lopdf::Error) -> EngineError {
    EngineError::new(format!("cannot update object {} {}: {}", id.0, id.1, e))
}

fn set_entry(doc: &mut Document, id: ObjectId, key: &str, value: Object) -> Result<(), EngineError> {
    doc.get_object_mut(id)
        .and_then(Object::as_dict_mut)
        .map(|dict| {
            dict.set(key, value);
        })
        .map_err(|e| object_error(id, e))
}

/// The appearance state a button widget switches to for `state`.
fn widget_state(doc: &Document, widget: ObjectId, state: &[u8]) -> Vec<u8> {
    if state != OFF_STATE && acroform::on_states(doc, widget).iter().any(|s| s == state) {
        state.to_vec()
    } else {
        OFF_STATE.to_vec()
    }
}

fn write_button(doc: &mut Document, field: &FieldNode, state: Vec<u8>) -> Result<(), EngineError> {
    let widget_states: Vec<(ObjectId, Vec<u8>)> = field
        .widgets
        .iter()
        .map(|&w| (w, widget_state(doc, w, &state)))
        .collect();

    set_entry(doc, field.id, "V", Object::Name(state))?;
    for (widget, appearance) in widget_states {
        set_entry(doc, widget, "AS", Object::Name(appearance))?;
    }
    Ok(())
}

fn checkbox_state(doc: &Document, field: &FieldNode, value: &str) -> Vec<u8> {
    if OFF_WORDS.contains(&value.to_lowercase().as_str()) {
        return OFF_STATE.to_vec();
    }
    field
        .widgets
        .iter()
        .flat_map(|&w| acroform::on_states(doc, w))
        .next()
        .unwrap_or_else(|| value.as_bytes().to_vec())
}

fn radio_state(field: &FieldNode, value: &str) -> Result<Vec<u8>, EngineError> {
    if value.is_empty() || value.as_bytes() == OFF_STATE {
        return Ok(OFF_STATE.to_vec());
    }
    if field.options.iter().any(|o| o == value) {
        Ok(value.as_bytes().to_vec())
    } else {
        Err(EngineError::new(format!(
            "field '{}' has no option '{}' (options: {})",
            field.name,
            value,
            field.options.join(", ")
        )))
    }
}

fn write_value(doc: &mut Document, field: &FieldNode, value: &str) -> Result<(), EngineError> {
    match field.kind {
        FieldType::Text | FieldType::Combo | FieldType::ListBox => {
            set_entry(doc, field.id, "V", text::encode(value))
        }
        FieldType::Checkbox => {
            let state = checkbox_state(doc, field, value);
            write_button(doc, field, state)
        }
        FieldType::Radio => {
            let state = radio_state(field, value)?;
            write_button(doc, field, state)
        }
        FieldType::PushButton | FieldType::Signature => Err(EngineError::new(format!(
            "field '{}' of type {} cannot hold a value",
            field.name,
            field.kind.hint()
        ))),
    }
}

/// Ask viewers to regenerate widget appearances from the new values.
fn request_appearances(doc: &mut Document) -> Result<(), EngineError> {
    let root = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| EngineError::new(format!("document catalog is corrupt: {}", e)))?;

    let form_ref = doc
        .get_dictionary(root)
        .and_then(|catalog| catalog.get(b"AcroForm"))
        .and_then(Object::as_reference);

    match form_ref {
        Ok(form_id) => set_entry(doc, form_id, "NeedAppearances", Object::Boolean(true)),
        // Inline AcroForm dictionary inside the catalog.
        Err(_) => doc
            .get_object_mut(root)
            .and_then(Object::as_dict_mut)
            .and_then(|catalog| catalog.get_mut(b"AcroForm"))
            .and_then(Object::as_dict_mut)
            .map(|form| {
                form.set("NeedAppearances", Object::Boolean(true));
            })
            .map_err(|e| object_error(root, e)),
    }
}

fn lock(doc: &mut Document, field: &FieldNode) -> Result<(), EngineError> {
    set_entry(doc, field.id, "Ff", Object::Integer(field.flags | FLAG_READ_ONLY))
}

/// Apply `values` to the document's fields, in place.
pub(crate) fn apply(
    doc: &mut Document,
    values: &BTreeMap<String, String>,
    flatten: bool,
) -> Result<(), EngineError> {
    let fields = acroform::collect_fields(doc)
        .map_err(|e| EngineError::new(format!("document structure is corrupt: {}", e)))?;

    for (name, value) in values {
        let field = fields
            .iter()
            .find(|f| &f.name == name)
            .ok_or_else(|| EngineError::new(format!("field '{}' does not exist", name)))?;
        write_value(doc, field, value)?;
        tracing::trace!(field = %name, kind = field.kind.hint(), "wrote field value");
    }

    request_appearances(doc)?;

    if flatten {
        for field in &fields {
            lock(doc, field)?;
        }
        tracing::debug!(fields = fields.len(), "locked all fields");
    }
    Ok(())
}
