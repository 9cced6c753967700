//! Error taxonomy classification.
//!
//! Every failure leaves the system through [`classify`] exactly once and
//! comes out as a [`Failure`]: a message, one of three [`ErrorKind`]s, and
//! optional diagnostics.

use std::io;

use serde::Serialize;

use crate::error::{ErrorKind, ProcessError};

pub const OUT_OF_MEMORY_MESSAGE: &str = "Insufficient memory to process PDF. File may be too large.";

/// Diagnostics attached to failures that were not classified at the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetails {
    pub exception_type: String,
    pub traceback: Option<String>,
}

/// A classified failure, ready to be rendered as a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub error: String,
    pub kind: ErrorKind,
    pub details: Option<FailureDetails>,
}

impl Failure {
    pub fn new(kind: ErrorKind, error: impl Into<String>) -> Self {
        Failure {
            error: error.into(),
            kind,
            details: None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "success": false,
            "error": self.error,
            "errorType": self.kind,
        });
        if let Some(details) = &self.details {
            obj["details"] = serde_json::json!(details);
        }
        obj
    }
}

/// Debug rendering of `err` followed by its `source()` chain.
fn trace(err: &ProcessError) -> String {
    let mut lines = vec![format!("{:?}", err)];
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        lines.push(format!("caused by: {}", cause));
        source = std::error::Error::source(cause);
    }
    lines.join("\n")
}

fn classify_io(err: &io::Error) -> Option<(ErrorKind, String)> {
    match err.kind() {
        io::ErrorKind::NotFound => Some((ErrorKind::Data, format!("File not found: {}", err))),
        io::ErrorKind::PermissionDenied => Some((
            ErrorKind::Runtime,
            format!("Permission denied: {}", err),
        )),
        io::ErrorKind::OutOfMemory => {
            Some((ErrorKind::Runtime, OUT_OF_MEMORY_MESSAGE.to_string()))
        }
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => {
            Some((ErrorKind::Data, format!("Invalid data: {}", err)))
        }
        _ => None,
    }
}

fn classify_by_text(text: String) -> (ErrorKind, String) {
    let upper = text.to_uppercase();
    if upper.contains("PDF") || upper.contains("CORRUPT") {
        (ErrorKind::Data, format!("PDF file error: {}", text))
    } else {
        (ErrorKind::Runtime, text)
    }
}

/// Map a failure to `{error, errorType, details}`.
///
/// The first matching rule wins:
///
/// 1. an already-classified failure keeps its kind and message
/// 2. missing resource: `data`, "File not found: ..."
/// 3. permission: `runtime`, "Permission denied: ..."
/// 4. out of memory: `runtime`, fixed message
/// 5. value or type failure: `data`, "Invalid data: ..."
/// 6. text mentioning "PDF" or "CORRUPT": `data`
/// 7. anything else: `runtime`
///
/// A `context` label is prepended to the message when given.
pub fn classify(err: &ProcessError, context: Option<&str>) -> Failure {
    let (kind, message) = match err {
        ProcessError::Rejected { kind, message } => (*kind, message.clone()),
        ProcessError::Io(io_err) => {
            classify_io(io_err).unwrap_or_else(|| classify_by_text(io_err.to_string()))
        }
        ProcessError::Alloc(_) => (ErrorKind::Runtime, OUT_OF_MEMORY_MESSAGE.to_string()),
        ProcessError::Json(e) => (ErrorKind::Data, format!("Invalid data: {}", e)),
        ProcessError::Base64(e) => (ErrorKind::Data, format!("Invalid data: {}", e)),
        ProcessError::Engine(e) => classify_by_text(e.to_string()),
        ProcessError::Internal(msg) => classify_by_text(msg.clone()),
    };

    let error = match context {
        Some(label) if !label.is_empty() => format!("{}: {}", label, message),
        _ => message,
    };

    let details = err.declared_kind().is_none().then(|| FailureDetails {
        exception_type: err.type_name().to_string(),
        traceback: Some(trace(err)),
    });

    tracing::debug!(kind = %kind, error = %error, "classified failure");

    Failure {
        error,
        kind,
        details,
    }
}
