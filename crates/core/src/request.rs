//! Request shape validation.
//!
//! [`validate_request`] checks the decoded JSON object before anything
//! else happens and produces a typed [`Request`]. Every violation is a
//! config-kind error naming the offending key. The document itself is
//! only checked for being well-formed base64 here; its bytes are not
//! inspected.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::config::Limits;
use crate::error::ProcessError;
use crate::value::FieldValue;

/// Caller field assignments, keyed by field name.
pub type FieldMappings = BTreeMap<String, FieldValue>;

/// Key carrying the base64 document.
pub const DOCUMENT_KEY: &str = "document";
/// Older name for [`DOCUMENT_KEY`], still accepted.
pub const LEGACY_DOCUMENT_KEY: &str = "pdfData";

/// The two supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Inspect,
    Fill,
}

impl Action {
    pub const ALL: [Action; 2] = [Action::Inspect, Action::Fill];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Inspect => "inspect",
            Action::Fill => "fill",
        }
    }

    /// Prefix for failures that were not classified where they were raised.
    pub fn context_label(&self) -> &'static str {
        match self {
            Action::Inspect => "PDF inspection",
            Action::Fill => "PDF filling",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Action::ALL.iter().map(Action::as_str).collect();
                ProcessError::config(format!(
                    "Invalid action '{}'. Must be one of: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

/// Options for the fill operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FillOptions {
    pub flatten: bool,
}

/// A validated request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Inspect {
        document: String,
    },
    Fill {
        document: String,
        field_mappings: FieldMappings,
        options: FillOptions,
    },
}

impl Request {
    pub fn action(&self) -> Action {
        match self {
            Request::Inspect { .. } => Action::Inspect,
            Request::Fill { .. } => Action::Fill,
        }
    }

    pub fn document(&self) -> &str {
        match self {
            Request::Inspect { document } | Request::Fill { document, .. } => document,
        }
    }
}

type JsonObject = serde_json::Map<String, serde_json::Value>;

fn document_value(obj: &JsonObject) -> Option<&serde_json::Value> {
    obj.get(DOCUMENT_KEY).or_else(|| obj.get(LEGACY_DOCUMENT_KEY))
}

fn parse_document(value: &serde_json::Value, limits: &Limits) -> Result<String, ProcessError> {
    let text = value.as_str().ok_or_else(|| {
        ProcessError::config(format!("{} must be a base64 string", DOCUMENT_KEY))
    })?;

    if text.is_empty() {
        return Err(ProcessError::config("Document data cannot be empty"));
    }

    // Line-wrapped base64 is accepted.
    let text: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    // Oversized input is rejected later as a data error, before decoding.
    if text.len() <= limits.max_document_len && BASE64.decode(&text).is_err() {
        return Err(ProcessError::config("Invalid base64 encoded document data"));
    }

    Ok(text)
}

fn parse_options(obj: &JsonObject) -> Result<FillOptions, ProcessError> {
    let options = match obj.get("options") {
        None | Some(serde_json::Value::Null) => return Ok(FillOptions::default()),
        Some(serde_json::Value::Object(o)) => o,
        Some(_) => return Err(ProcessError::config("options must be an object")),
    };

    let flatten = match options.get("flatten") {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::Bool(b)) => *b,
        Some(_) => return Err(ProcessError::config("options.flatten must be a boolean")),
    };

    Ok(FillOptions { flatten })
}

fn parse_field_mappings(obj: &JsonObject) -> Result<FieldMappings, ProcessError> {
    let raw = obj
        .get("fieldMappings")
        .ok_or_else(|| ProcessError::config("Field mappings required for fill action"))?;

    if !raw.is_object() {
        return Err(ProcessError::config(
            "Field mappings must be a mapping of field names to values",
        ));
    }

    serde_json::from_value(raw.clone()).map_err(|e| {
        ProcessError::config(format!("Field mappings could not be read: {}", e))
    })
}

/// Validate a decoded request object.
///
/// Checks, in order: required keys present, known action, non-empty
/// base64 document, and for `fill` a `fieldMappings` object.
pub fn validate_request(raw: &serde_json::Value, limits: &Limits) -> Result<Request, ProcessError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ProcessError::config("Request must be a JSON object"))?;

    let action_value = obj
        .get("action")
        .ok_or_else(|| ProcessError::config("Missing required field: action"))?;
    let document_value = document_value(obj)
        .ok_or_else(|| ProcessError::config(format!("Missing required field: {}", DOCUMENT_KEY)))?;

    let action = match action_value.as_str() {
        Some(s) => s.parse::<Action>()?,
        None => {
            return Err(ProcessError::config(format!(
                "Invalid action '{}'. Must be one of: inspect, fill",
                action_value
            )))
        }
    };

    let document = parse_document(document_value, limits)?;

    match action {
        Action::Inspect => Ok(Request::Inspect { document }),
        Action::Fill => {
            let field_mappings = parse_field_mappings(obj)?;
            let options = parse_options(obj)?;
            Ok(Request::Fill {
                document,
                field_mappings,
                options,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    const DOC: &str = "JVBERi0xLjQK"; // "%PDF-1.4\n"

    fn check(raw: serde_json::Value) -> Result<Request, ProcessError> {
        validate_request(&raw, &Limits::default())
    }

    fn config_message(raw: serde_json::Value) -> String {
        let err = check(raw).unwrap_err();
        assert_eq!(err.declared_kind(), Some(ErrorKind::Config));
        err.to_string()
    }

    #[test]
    fn valid_inspect() {
        let req = check(json!({"action": "inspect", "document": DOC})).unwrap();
        assert_eq!(req.action(), Action::Inspect);
        assert_eq!(req.document(), DOC);
    }

    #[test]
    fn valid_fill_with_options() {
        let req = check(json!({
            "action": "fill",
            "document": DOC,
            "fieldMappings": {"Name": "Ann", "Subscribe": true},
            "options": {"flatten": true}
        }))
        .unwrap();
        match req {
            Request::Fill {
                field_mappings,
                options,
                ..
            } => {
                assert_eq!(field_mappings.len(), 2);
                assert_eq!(field_mappings["Subscribe"], FieldValue::Bool(true));
                assert!(options.flatten);
            }
            other => panic!("expected Fill, got {:?}", other),
        }
    }

    #[test]
    fn legacy_document_key_is_accepted() {
        let req = check(json!({"action": "inspect", "pdfData": DOC})).unwrap();
        assert_eq!(req.document(), DOC);
    }

    #[test]
    fn missing_action() {
        assert_eq!(
            config_message(json!({"document": DOC})),
            "Missing required field: action"
        );
    }

    #[test]
    fn missing_document() {
        assert_eq!(
            config_message(json!({"action": "inspect"})),
            "Missing required field: document"
        );
    }

    #[test]
    fn unknown_action() {
        assert_eq!(
            config_message(json!({"action": "merge", "document": DOC})),
            "Invalid action 'merge'. Must be one of: inspect, fill"
        );
        assert!(config_message(json!({"action": 3, "document": DOC})).starts_with("Invalid action"));
    }

    #[test]
    fn empty_or_non_string_document() {
        assert_eq!(
            config_message(json!({"action": "inspect", "document": ""})),
            "Document data cannot be empty"
        );
        assert_eq!(
            config_message(json!({"action": "inspect", "document": 5})),
            "document must be a base64 string"
        );
    }

    #[test]
    fn invalid_base64() {
        assert_eq!(
            config_message(json!({"action": "inspect", "document": "not base64!!"})),
            "Invalid base64 encoded document data"
        );
    }

    #[test]
    fn wrapped_base64_is_accepted() {
        let req = check(json!({"action": "inspect", "document": "JVBERi0x\nLjQK\r\n"})).unwrap();
        assert_eq!(req.document(), "JVBERi0xLjQK");
    }

    #[test]
    fn oversized_document_is_left_for_the_size_check() {
        let limits = Limits {
            max_document_len: 4,
            ..Limits::default()
        };
        let req = validate_request(
            &json!({"action": "inspect", "document": "@@@@@@@@"}),
            &limits,
        )
        .unwrap();
        assert_eq!(req.document(), "@@@@@@@@");
    }

    #[test]
    fn fill_requires_mapping_object() {
        assert_eq!(
            config_message(json!({"action": "fill", "document": DOC})),
            "Field mappings required for fill action"
        );
        for bad in [json!(["Name"]), json!("Name=Ann"), json!(3)] {
            assert_eq!(
                config_message(json!({"action": "fill", "document": DOC, "fieldMappings": bad})),
                "Field mappings must be a mapping of field names to values"
            );
        }
    }

    #[test]
    fn inspect_ignores_field_mappings() {
        let req = check(json!({"action": "inspect", "document": DOC, "fieldMappings": []})).unwrap();
        assert_eq!(req.action(), Action::Inspect);
    }

    #[test]
    fn bad_options() {
        assert_eq!(
            config_message(json!({
                "action": "fill", "document": DOC, "fieldMappings": {}, "options": []
            })),
            "options must be an object"
        );
        assert_eq!(
            config_message(json!({
                "action": "fill", "document": DOC, "fieldMappings": {},
                "options": {"flatten": "yes"}
            })),
            "options.flatten must be a boolean"
        );
    }

    #[test]
    fn non_object_request() {
        assert_eq!(config_message(json!([1, 2])), "Request must be a JSON object");
    }
}
