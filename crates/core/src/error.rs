use serde::{Deserialize, Serialize};

use crate::engine::EngineError;

/// The three failure categories a caller can act on.
///
/// - `Config`: the request itself is malformed or incomplete.
/// - `Data`: the document or the supplied values were rejected.
/// - `Runtime`: everything else, including engine and resource failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Config,
    Data,
    Runtime,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Data => "data",
            ErrorKind::Runtime => "runtime",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failure that can surface while processing a request.
///
/// `Rejected` carries a failure that was already classified where it was
/// raised. The remaining variants wrap lower-level errors and are mapped to
/// an [`ErrorKind`] by [`crate::classify`].
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("{message}")]
    Rejected { kind: ErrorKind, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Alloc(#[from] std::collections::TryReserveError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Internal(String),
}

impl ProcessError {
    pub fn config(message: impl Into<String>) -> Self {
        ProcessError::Rejected {
            kind: ErrorKind::Config,
            message: message.into(),
        }
    }

    pub fn data(message: impl Into<String>) -> Self {
        ProcessError::Rejected {
            kind: ErrorKind::Data,
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        ProcessError::Rejected {
            kind: ErrorKind::Runtime,
            message: message.into(),
        }
    }

    /// The declared kind, if this failure was classified where it was raised.
    pub fn declared_kind(&self) -> Option<ErrorKind> {
        match self {
            ProcessError::Rejected { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Name of the underlying failure, reported in error details.
    pub fn type_name(&self) -> &'static str {
        match self {
            ProcessError::Rejected { .. } => "ProcessError",
            ProcessError::Io(_) => "IoError",
            ProcessError::Json(_) => "JsonError",
            ProcessError::Base64(_) => "DecodeError",
            ProcessError::Alloc(_) => "TryReserveError",
            ProcessError::Engine(_) => "EngineError",
            ProcessError::Internal(_) => "InternalError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ErrorKind::Runtime).unwrap(),
            serde_json::json!("runtime")
        );
        assert_eq!(ErrorKind::Config.to_string(), "config");
    }

    #[test]
    fn constructors_declare_their_kind() {
        assert_eq!(
            ProcessError::data("bad").declared_kind(),
            Some(ErrorKind::Data)
        );
        assert_eq!(ProcessError::config("bad").to_string(), "bad");
        assert_eq!(ProcessError::Internal("x".into()).declared_kind(), None);
    }
}
