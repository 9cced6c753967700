//! The document engine seam.
//!
//! The core never parses document bytes itself. Everything it needs from
//! the binary format goes through [`FormEngine`], which any document
//! library can implement as long as it reports per-field metadata in the
//! loosely shaped form that [`crate::descriptor`] understands.

use std::collections::BTreeMap;

/// One form field as reported by the engine, before normalization.
///
/// `metadata` is deliberately untyped: depending on the document, it may
/// be a structured record (`{"type": "...", "options": [...]}`), a bare
/// list of choice values, null, or something else entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    pub name: String,
    pub metadata: serde_json::Value,
}

impl RawField {
    pub fn new(name: impl Into<String>, metadata: serde_json::Value) -> Self {
        RawField {
            name: name.into(),
            metadata,
        }
    }
}

/// An opaque engine failure.
///
/// The core only inspects the message text (for "corrupt", "encrypted",
/// "permission", "field" and similar markers), so engines should put the
/// relevant wording into it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        EngineError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Case-insensitive check for any of `markers` in the message.
    pub fn mentions(&self, markers: &[&str]) -> bool {
        let lowered = self.message.to_lowercase();
        markers.iter().any(|m| lowered.contains(m))
    }
}

/// The two operations the core needs from a document form engine.
pub trait FormEngine {
    /// List every fillable field in document order.
    ///
    /// Fails on corrupt, encrypted, or structurally invalid input.
    fn list_fields(&self, document: &[u8]) -> Result<Vec<RawField>, EngineError>;

    /// Write `values` into the named fields and return the new document.
    ///
    /// With `flatten`, the filled values are baked in and the fields stop
    /// being editable.
    fn fill_form(
        &self,
        document: &[u8],
        values: &BTreeMap<String, String>,
        flatten: bool,
    ) -> Result<Vec<u8>, EngineError>;
}

impl<E: FormEngine + ?Sized> FormEngine for &E {
    fn list_fields(&self, document: &[u8]) -> Result<Vec<RawField>, EngineError> {
        (**self).list_fields(document)
    }

    fn fill_form(
        &self,
        document: &[u8],
        values: &BTreeMap<String, String>,
        flatten: bool,
    ) -> Result<Vec<u8>, EngineError> {
        (**self).fill_form(document, values, flatten)
    }
}
