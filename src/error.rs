use std::path::PathBuf;

use thiserror::Error;

use crate::docx::DocxError;
use crate::fields::SchemaError;

pub const EXIT_FILE_NOT_FOUND: i32 = 1;
pub const EXIT_VALIDATION: i32 = 2;
pub const EXIT_PROCESSING: i32 = 3;

/// Failures surfaced by the fill pipeline.
///
/// Missing worksheet data is not an error here: unresolved placeholders are
/// rewritten to the need sentinel and reported in-band.
#[derive(Debug, Error)]
pub enum FillError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("invalid document package {}: {source}", path.display())]
    InvalidFormat {
        path: PathBuf,
        #[source]
        source: DocxError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("bad output path {}: expected a .docx file name", path.display())]
    BadOutputPath { path: PathBuf },

    #[error("invalid placeholder schema {}: {source}", path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    #[error("failed to compile pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to write document {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: DocxError,
    },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FillError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => EXIT_FILE_NOT_FOUND,
            Self::InvalidFormat { .. }
            | Self::Validation(_)
            | Self::BadOutputPath { .. }
            | Self::Schema { .. } => EXIT_VALIDATION,
            Self::Pattern(_) | Self::Write { .. } | Self::Io { .. } => EXIT_PROCESSING,
        }
    }
}

/// A mandatory worksheet item is absent, or an override is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing mandatory field: {placeholder}")]
    MissingField { placeholder: String },

    #[error("question {question} answer missing")]
    MissingAnswer { question: String },

    #[error("invalid {field} override: {value:?}")]
    InvalidOverride { field: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        let missing = FillError::NotFound {
            path: PathBuf::from("w.docx"),
        };
        assert_eq!(missing.exit_code(), EXIT_FILE_NOT_FOUND);

        let invalid = FillError::from(ValidationError::MissingAnswer {
            question: "15".to_string(),
        });
        assert_eq!(invalid.exit_code(), EXIT_VALIDATION);
        assert_eq!(invalid.to_string(), "question 15 answer missing");

        let bad_output = FillError::BadOutputPath {
            path: PathBuf::from("out.pdf"),
        };
        assert_eq!(bad_output.exit_code(), EXIT_VALIDATION);
    }
}
