//! AcroForm field tree walking.
//!
//! Fields hang off `/Root /AcroForm /Fields`. Intermediate nodes carry a
//! partial name `/T` and pass inheritable attributes (`FT`, `Ff`, `V`,
//! `DV`, `MaxLen`, `Opt`) down to their kids. A node whose kids carry no
//! `/T` is a terminal field and those kids are its widget annotations.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::text;

const MAX_DEPTH: usize = 32;

// Ff bit positions, PDF 32000-1 tables 221, 226, 228.
pub(crate) const FLAG_READ_ONLY: i64 = 1;
pub(crate) const FLAG_REQUIRED: i64 = 1 << 1;
const FLAG_RADIO: i64 = 1 << 15;
const FLAG_PUSH_BUTTON: i64 = 1 << 16;
const FLAG_COMBO: i64 = 1 << 17;

/// Off state shared by checkboxes and radio buttons.
pub(crate) const OFF_STATE: &[u8] = b"Off";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldType {
    Text,
    Checkbox,
    Radio,
    Combo,
    ListBox,
    PushButton,
    Signature,
}

impl FieldType {
    fn resolve(ft: Option<&[u8]>, flags: i64) -> Option<FieldType> {
        match ft? {
            b"Tx" => Some(FieldType::Text),
            b"Btn" if flags & FLAG_PUSH_BUTTON != 0 => Some(FieldType::PushButton),
            b"Btn" if flags & FLAG_RADIO != 0 => Some(FieldType::Radio),
            b"Btn" => Some(FieldType::Checkbox),
            b"Ch" if flags & FLAG_COMBO != 0 => Some(FieldType::Combo),
            b"Ch" => Some(FieldType::ListBox),
            b"Sig" => Some(FieldType::Signature),
            _ => None,
        }
    }

    /// Type hint reported in the raw metadata record.
    pub(crate) fn hint(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Combo => "dropdown",
            FieldType::ListBox => "choice",
            FieldType::PushButton => "button",
            FieldType::Signature => "signature",
        }
    }

    /// Push buttons and signatures hold no fillable value.
    pub(crate) fn is_fillable(&self) -> bool {
        !matches!(self, FieldType::PushButton | FieldType::Signature)
    }
}

/// One terminal field.
#[derive(Debug, Clone)]
pub(crate) struct FieldNode {
    pub id: ObjectId,
    pub name: String,
    pub kind: FieldType,
    pub flags: i64,
    pub max_len: Option<i64>,
    pub options: Vec<String>,
    pub default_value: Option<String>,
    pub widgets: Vec<ObjectId>,
}

impl FieldNode {
    /// The raw metadata record handed to the normalizer.
    pub(crate) fn metadata(&self) -> serde_json::Value {
        let mut record = serde_json::json!({
            "type": self.kind.hint(),
            "required": self.flags & FLAG_REQUIRED != 0,
            "readOnly": self.flags & FLAG_READ_ONLY != 0,
            "defaultValue": self.default_value,
        });
        if let Some(max_len) = self.max_len {
            record["maxLength"] = serde_json::json!(max_len);
        }
        if !self.options.is_empty() {
            record["options"] = serde_json::json!(self.options);
        }
        record
    }
}

#[derive(Debug, Clone, Default)]
struct Inherited {
    name: Option<String>,
    ft: Option<Vec<u8>>,
    flags: i64,
    max_len: Option<i64>,
    value: Option<Object>,
    default_value: Option<Object>,
    opt: Option<Object>,
}

impl Inherited {
    fn descend(&self, dict: &Dictionary) -> Inherited {
        let partial = dict
            .get(b"T")
            .ok()
            .and_then(|t| t.as_str().ok())
            .map(text::decode);
        let name = match (&self.name, partial) {
            (Some(parent), Some(part)) => Some(format!("{}.{}", parent, part)),
            (None, Some(part)) => Some(part),
            (parent, None) => parent.clone(),
        };

        Inherited {
            name,
            ft: dict
                .get(b"FT")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(<[u8]>::to_vec)
                .or_else(|| self.ft.clone()),
            flags: dict
                .get(b"Ff")
                .ok()
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(self.flags),
            max_len: dict
                .get(b"MaxLen")
                .ok()
                .and_then(|o| o.as_i64().ok())
                .or(self.max_len),
            value: dict.get(b"V").ok().cloned().or_else(|| self.value.clone()),
            default_value: dict
                .get(b"DV")
                .ok()
                .cloned()
                .or_else(|| self.default_value.clone()),
            opt: dict.get(b"Opt").ok().cloned().or_else(|| self.opt.clone()),
        }
    }
}

/// The `/AcroForm` dictionary, if the document has one.
pub(crate) fn acroform(doc: &Document) -> Result<Option<&Dictionary>, lopdf::Error> {
    let root = doc.trailer.get(b"Root")?.as_reference()?;
    let catalog = doc.get_dictionary(root)?;
    let form = match catalog.get(b"AcroForm") {
        Ok(obj) => obj,
        Err(_) => return Ok(None),
    };
    let (_, form) = doc.dereference(form)?;
    Ok(form.as_dict().ok())
}

/// Every terminal field in document order.
pub(crate) fn collect_fields(doc: &Document) -> Result<Vec<FieldNode>, lopdf::Error> {
    let form = match acroform(doc)? {
        Some(form) => form,
        None => {
            tracing::debug!("document has no AcroForm");
            return Ok(Vec::new());
        }
    };
    let roots = match form.get(b"Fields") {
        Ok(obj) => doc.dereference(obj)?.1.as_array()?.clone(),
        Err(_) => return Ok(Vec::new()),
    };

    let mut walker = Walker {
        doc,
        visited: HashSet::new(),
        fields: Vec::new(),
    };
    let top = Inherited::default();
    for field in &roots {
        walker.visit(field, &top, 0);
    }
    Ok(walker.fields)
}

struct Walker<'a> {
    doc: &'a Document,
    visited: HashSet<ObjectId>,
    fields: Vec<FieldNode>,
}

impl<'a> Walker<'a> {
    fn visit(&mut self, obj: &Object, parent: &Inherited, depth: usize) {
        let doc = self.doc;
        if depth > MAX_DEPTH {
            tracing::warn!(depth, "field tree too deep, skipping subtree");
            return;
        }
        let id = match obj.as_reference() {
            Ok(id) => id,
            Err(_) => {
                tracing::debug!("skipping inline field dictionary");
                return;
            }
        };
        if !self.visited.insert(id) {
            return;
        }
        let dict = match doc.get_dictionary(id) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(object = ?id, error = %e, "unreadable field object");
                return;
            }
        };

        let here = parent.descend(dict);
        let kids: Vec<Object> = dict
            .get(b"Kids")
            .ok()
            .and_then(|k| doc.dereference(k).ok())
            .and_then(|(_, k)| k.as_array().ok().cloned())
            .unwrap_or_default();

        let has_field_kids = kids.iter().any(|kid| {
            kid.as_reference()
                .ok()
                .and_then(|kid_id| doc.get_dictionary(kid_id).ok())
                .map_or(false, |kid| kid.has(b"T"))
        });

        if has_field_kids {
            for kid in &kids {
                self.visit(kid, &here, depth + 1);
            }
            return;
        }

        let widgets = if kids.is_empty() {
            vec![id]
        } else {
            kids.iter().filter_map(|k| k.as_reference().ok()).collect()
        };
        self.push_terminal(id, here, widgets);
    }

    fn push_terminal(&mut self, id: ObjectId, attrs: Inherited, widgets: Vec<ObjectId>) {
        let kind = match FieldType::resolve(attrs.ft.as_deref(), attrs.flags) {
            Some(kind) => kind,
            None => {
                tracing::debug!(object = ?id, "field without a known FT, skipping");
                return;
            }
        };
        if !kind.is_fillable() {
            return;
        }

        let options = match kind {
            FieldType::Radio => widget_states(self.doc, &widgets),
            FieldType::Combo | FieldType::ListBox => {
                choice_options(self.doc, attrs.opt.as_ref())
            }
            _ => Vec::new(),
        };
        let default_value = attrs
            .default_value
            .as_ref()
            .or(attrs.value.as_ref())
            .and_then(|v| value_text(self.doc, v));

        self.fields.push(FieldNode {
            id,
            name: attrs.name.unwrap_or_default(),
            kind,
            flags: attrs.flags,
            max_len: if kind == FieldType::Text { attrs.max_len } else { None },
            options,
            default_value,
            widgets,
        });
    }
}

/// Appearance state names of one widget other than `Off`.
pub(crate) fn on_states(doc: &Document, widget: ObjectId) -> Vec<Vec<u8>> {
    let normal = doc
        .get_dictionary(widget)
        .ok()
        .and_then(|w| w.get(b"AP").ok())
        .and_then(|ap| doc.dereference(ap).ok())
        .and_then(|(_, ap)| ap.as_dict().ok())
        .and_then(|ap| ap.get(b"N").ok())
        .and_then(|n| doc.dereference(n).ok())
        .and_then(|(_, n)| n.as_dict().ok());

    match normal {
        Some(states) => states
            .iter()
            .map(|(k, _)| k.clone())
            .filter(|k| k.as_slice() != OFF_STATE)
            .collect(),
        None => Vec::new(),
    }
}

fn widget_states(doc: &Document, widgets: &[ObjectId]) -> Vec<String> {
    let mut states: Vec<String> = Vec::new();
    for &widget in widgets {
        for state in on_states(doc, widget) {
            let state = text::name(&state);
            if !states.contains(&state) {
                states.push(state);
            }
        }
    }
    states
}

/// Export values of a choice field's `/Opt` array.
fn choice_options(doc: &Document, opt: Option<&Object>) -> Vec<String> {
    let entries = match opt
        .and_then(|o| doc.dereference(o).ok())
        .and_then(|(_, o)| o.as_array().ok())
    {
        Some(entries) => entries,
        None => return Vec::new(),
    };

    entries
        .iter()
        .filter_map(|entry| {
            let (_, entry) = doc.dereference(entry).ok()?;
            match entry {
                // [export display] pairs
                Object::Array(pair) => pair.first().and_then(|e| value_text(doc, e)),
                other => value_text(doc, other),
            }
        })
        .collect()
}

/// Text form of a field value object.
pub(crate) fn value_text(doc: &Document, obj: &Object) -> Option<String> {
    let (_, obj) = doc.dereference(obj).ok()?;
    match obj {
        Object::String(bytes, _) => Some(text::decode(bytes)),
        Object::Name(bytes) => Some(text::name(bytes)),
        Object::Integer(i) => Some(i.to_string()),
        Object::Real(r) => Some(r.to_string()),
        Object::Boolean(b) => Some(b.to_string()),
        Object::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(|i| value_text(doc, i)).collect();
            Some(parts.join(", "))
        }
        _ => None,
    }
}
