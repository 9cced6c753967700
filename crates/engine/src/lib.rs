//! formfill-engine: AcroForm support over the `lopdf` object model.
//!
//! [`AcroFormEngine`] implements [`formfill_core::FormEngine`]: it lists
//! the interactive form fields of a document and writes string values
//! back into them.

mod acroform;
mod fill;
mod text;

#[cfg(feature = "fixtures")]
pub mod fixtures;

use std::collections::BTreeMap;

use formfill_core::{EngineError, FormEngine, RawField};
use lopdf::Document;

/// Form engine backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcroFormEngine;

impl AcroFormEngine {
    pub fn new() -> Self {
        AcroFormEngine
    }
}

fn structure_error(e: lopdf::Error) -> EngineError {
    EngineError::new(format!("document structure is corrupt: {}", e))
}

/// Parse `bytes`, refusing encrypted documents.
fn load(bytes: &[u8]) -> Result<Document, EngineError> {
    let doc = Document::load_mem(bytes).map_err(|e| {
        let text = e.to_string();
        if text.to_lowercase().contains("encrypt") || text.to_lowercase().contains("decrypt") {
            EngineError::new(format!("document is encrypted: {}", text))
        } else {
            structure_error(e)
        }
    })?;

    if doc.is_encrypted() {
        return Err(EngineError::new("document is encrypted"));
    }
    Ok(doc)
}

impl FormEngine for AcroFormEngine {
    fn list_fields(&self, document: &[u8]) -> Result<Vec<RawField>, EngineError> {
        let doc = load(document)?;
        let fields = acroform::collect_fields(&doc).map_err(structure_error)?;
        tracing::debug!(fields = fields.len(), "listed AcroForm fields");

        Ok(fields
            .iter()
            .map(|f| RawField::new(f.name.clone(), f.metadata()))
            .collect())
    }

    fn fill_form(
        &self,
        document: &[u8],
        values: &BTreeMap<String, String>,
        flatten: bool,
    ) -> Result<Vec<u8>, EngineError> {
        let mut doc = load(document)?;
        fill::apply(&mut doc, values, flatten)?;

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| EngineError::new(format!("failed to write document: {}", e)))?;
        Ok(out)
    }
}
