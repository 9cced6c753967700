//! formfill-core: form field contract layer.
//!
//! Sits between a raw JSON request and a document form engine. It
//! validates the request shape, normalizes the engine's field metadata
//! into stable descriptors, checks and coerces caller values, and
//! classifies every failure into one of three error kinds.
//!
//! # Public API
//!
//! - [`Processor`] -- runs one request end to end and returns a [`Response`]
//! - [`FormEngine`] -- the two-operation document engine seam
//! - [`validate_request`] -- request shape checks, producing a typed [`Request`]
//! - [`normalize_field`] / [`normalize_fields`] -- field descriptor normalization
//! - [`validate_mappings`] -- mapping precondition check against a document
//! - [`coerce_mappings`] -- caller value coercion
//! - [`classify`] -- failure to `{error, errorType, details}` mapping

pub mod classify;
pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod request;
pub mod value;

// ── Convenience re-exports ───────────────────────────────────────────

pub use classify::{classify, Failure};
pub use config::Limits;
pub use descriptor::{normalize_field, normalize_fields, FieldDescriptor, FieldKind, RawFieldShape};
pub use dispatch::{FillOutcome, InspectOutcome, Processor, Response};
pub use engine::{EngineError, FormEngine, RawField};
pub use error::{ErrorKind, ProcessError};
pub use mapping::validate_mappings;
pub use request::{validate_request, Action, FieldMappings, FillOptions, Request};
pub use value::{coerce_mappings, coerce_value, CoercedMapping, FieldValue};

/// Leading bytes every accepted document must start with.
pub const DOCUMENT_MAGIC: &[u8] = b"%PDF";
