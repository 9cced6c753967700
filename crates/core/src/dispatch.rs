//! Operation dispatch: one request in, one [`Response`] out.

use std::time::Instant;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::classify::{classify, Failure};
use crate::config::Limits;
use crate::descriptor::{normalize_fields, FieldDescriptor};
use crate::engine::{EngineError, FormEngine};
use crate::error::{ErrorKind, ProcessError};
use crate::mapping::validate_mappings;
use crate::request::{validate_request, FieldMappings, FillOptions, Request};
use crate::value::coerce_mappings;
use crate::DOCUMENT_MAGIC;

// ──────────────────────────────────────────────
// Outcomes
// ──────────────────────────────────────────────

/// Result of a successful inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectOutcome {
    pub fields: Vec<FieldDescriptor>,
    /// Seconds since the request started.
    pub processing_time: f64,
}

/// Result of a successful fill.
#[derive(Debug, Clone, PartialEq)]
pub struct FillOutcome {
    /// The filled document, base64-encoded.
    pub data: String,
    pub field_count: usize,
    pub filled_field_count: usize,
    /// Seconds since the request started.
    pub processing_time: f64,
}

/// The response envelope for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Inspected(InspectOutcome),
    Filled(FillOutcome),
    Failed(Failure),
}

impl Response {
    pub fn is_success(&self) -> bool {
        !matches!(self, Response::Failed(_))
    }

    /// The failure kind, for failed responses.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Response::Failed(f) => Some(f.kind),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Response::Inspected(outcome) => serde_json::json!({
                "success": true,
                "fields": outcome.fields,
                "metadata": {
                    "fieldCount": outcome.fields.len(),
                    "processingTime": outcome.processing_time,
                }
            }),
            Response::Filled(outcome) => serde_json::json!({
                "success": true,
                "data": outcome.data,
                "metadata": {
                    "fieldCount": outcome.field_count,
                    "filledFieldCount": outcome.filled_field_count,
                    "processingTime": outcome.processing_time,
                }
            }),
            Response::Failed(failure) => failure.to_json(),
        }
    }
}

// ──────────────────────────────────────────────
// Engine failure wording
// ──────────────────────────────────────────────

const CORRUPT_MARKERS: &[&str] = &["corrupt", "damaged"];
const LOCKED_MARKERS: &[&str] = &["password", "encrypted"];
const CORRUPT_MESSAGE: &str = "PDF file appears to be corrupted or damaged";

fn listing_failure(err: EngineError) -> ProcessError {
    if err.mentions(CORRUPT_MARKERS) {
        ProcessError::data(CORRUPT_MESSAGE)
    } else if err.mentions(LOCKED_MARKERS) {
        ProcessError::data(
            "PDF file is password protected or encrypted. Please provide an unprotected PDF.",
        )
    } else {
        ProcessError::runtime(format!("Failed to read PDF form fields: {}", err))
    }
}

/// Listing failures while checking mappings are data rejections.
fn precondition_failure(err: EngineError) -> ProcessError {
    if err.mentions(CORRUPT_MARKERS) {
        ProcessError::data(CORRUPT_MESSAGE)
    } else if err.mentions(LOCKED_MARKERS) {
        ProcessError::data("PDF file is password protected. Please provide an unprotected PDF.")
    } else {
        ProcessError::data(format!("Failed to read PDF fields: {}", err))
    }
}

fn fill_failure(err: EngineError) -> ProcessError {
    if err.mentions(CORRUPT_MARKERS) {
        ProcessError::data(CORRUPT_MESSAGE)
    } else if err.mentions(LOCKED_MARKERS) {
        ProcessError::data("PDF file is password protected. Please provide an unprotected PDF.")
    } else if err.mentions(&["permission"]) {
        ProcessError::data("PDF file has restrictions that prevent form filling")
    } else if err.mentions(&["field"]) {
        ProcessError::data(format!("Field mapping error: {}", err))
    } else {
        ProcessError::runtime(format!("PDF filling operation failed: {}", err))
    }
}

// ──────────────────────────────────────────────
// Processor
// ──────────────────────────────────────────────

/// Runs requests against a [`FormEngine`].
///
/// Holds no per-request state; every call to [`Processor::handle`] is
/// independent.
#[derive(Debug, Clone)]
pub struct Processor<E> {
    engine: E,
    limits: Limits,
}

impl<E: FormEngine> Processor<E> {
    pub fn new(engine: E) -> Self {
        Processor::with_limits(engine, Limits::default())
    }

    pub fn with_limits(engine: E, limits: Limits) -> Self {
        Processor { engine, limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Validate, dispatch and classify one raw request.
    pub fn handle(&self, raw: &serde_json::Value) -> Response {
        let started = Instant::now();

        let request = match validate_request(raw, &self.limits) {
            Ok(r) => r,
            Err(e) => return Response::Failed(classify(&e, None)),
        };
        let action = request.action();
        tracing::debug!(%action, "dispatching request");

        let result = match &request {
            Request::Inspect { document } => self.inspect(document, started).map(Response::Inspected),
            Request::Fill {
                document,
                field_mappings,
                options,
            } => self
                .fill(document, field_mappings, *options, started)
                .map(Response::Filled),
        };

        result.unwrap_or_else(|e| {
            let context = match e.declared_kind() {
                Some(_) => None,
                None => Some(action.context_label()),
            };
            let failure = classify(&e, context);
            tracing::warn!(%action, kind = %failure.kind, error = %failure.error, "request failed");
            Response::Failed(failure)
        })
    }

    /// Size check, base64 decode and magic header check.
    fn decode_document(&self, document: &str) -> Result<Vec<u8>, ProcessError> {
        if document.len() > self.limits.max_document_len {
            return Err(ProcessError::data(format!(
                "PDF file too large (>{}). Please use a smaller file.",
                self.limits.document_ceiling_label()
            )));
        }

        let mut bytes = Vec::new();
        bytes.try_reserve(document.len() / 4 * 3 + 3)?;
        BASE64
            .decode_vec(document, &mut bytes)
            .map_err(|_| ProcessError::data("Invalid base64 PDF data encoding"))?;

        if !bytes.starts_with(DOCUMENT_MAGIC) {
            return Err(ProcessError::data(
                "Invalid PDF file format. File does not appear to be a valid PDF.",
            ));
        }
        Ok(bytes)
    }

    /// List and normalize the form fields of a base64 document.
    pub fn inspect(&self, document: &str, started: Instant) -> Result<InspectOutcome, ProcessError> {
        let bytes = self.decode_document(document)?;
        let raw = self.engine.list_fields(&bytes).map_err(listing_failure)?;
        let fields = normalize_fields(&raw);

        tracing::info!(field_count = fields.len(), "inspected document");
        Ok(InspectOutcome {
            fields,
            processing_time: started.elapsed().as_secs_f64(),
        })
    }

    /// Fill a base64 document and return the result, base64-encoded.
    pub fn fill(
        &self,
        document: &str,
        field_mappings: &FieldMappings,
        options: FillOptions,
        started: Instant,
    ) -> Result<FillOutcome, ProcessError> {
        let bytes = self.decode_document(document)?;

        if field_mappings.is_empty() {
            return Err(ProcessError::config(
                "No field mappings provided. At least one field must be mapped.",
            ));
        }

        let raw = self.engine.list_fields(&bytes).map_err(precondition_failure)?;
        let names: Vec<String> = raw.into_iter().map(|f| f.name).collect();
        validate_mappings(&names, field_mappings, &self.limits)?;

        let coerced = coerce_mappings(field_mappings, &self.limits)?;
        let filled = self
            .engine
            .fill_form(&bytes, &coerced, options.flatten)
            .map_err(fill_failure)?;

        if filled.is_empty() {
            return Err(ProcessError::runtime("PDF filling produced empty output"));
        }

        let filled_field_count = field_mappings
            .values()
            .filter(|v| v.counts_as_filled())
            .count();

        tracing::info!(
            field_count = field_mappings.len(),
            filled_field_count,
            flatten = options.flatten,
            output_bytes = filled.len(),
            "filled document"
        );
        Ok(FillOutcome {
            data: BASE64.encode(&filled),
            field_count: field_mappings.len(),
            filled_field_count,
            processing_time: started.elapsed().as_secs_f64(),
        })
    }
}
