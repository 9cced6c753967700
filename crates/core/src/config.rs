//! Processing limits.

use crate::error::ProcessError;

/// Maximum base64 document length accepted (50 MB of text).
pub const MAX_DOCUMENT_LEN: usize = 50 * 1024 * 1024;
/// Maximum length, in characters, of a single string value.
pub const MAX_VALUE_CHARS: usize = 10_000;
/// How many real field names an unknown-field error lists.
pub const FIELD_PREVIEW: usize = 10;

/// Policy ceilings applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Ceiling on the base64 `document` text, checked before decoding.
    pub max_document_len: usize,
    /// Ceiling on each string value in `fieldMappings`.
    pub max_value_chars: usize,
    /// Number of available field names shown in unknown-field errors.
    pub field_preview: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_document_len: MAX_DOCUMENT_LEN,
            max_value_chars: MAX_VALUE_CHARS,
            field_preview: FIELD_PREVIEW,
        }
    }
}

impl Limits {
    pub fn validate(&self) -> Result<(), ProcessError> {
        if self.max_document_len == 0 {
            return Err(ProcessError::config(
                "max document size must be greater than zero",
            ));
        }
        if self.max_value_chars == 0 {
            return Err(ProcessError::config(
                "max value length must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Human-readable document ceiling, e.g. "50MB".
    pub(crate) fn document_ceiling_label(&self) -> String {
        let mb = self.max_document_len / (1024 * 1024);
        if mb > 0 && mb * 1024 * 1024 == self.max_document_len {
            format!("{}MB", mb)
        } else {
            format!("{} bytes", self.max_document_len)
        }
    }
}
