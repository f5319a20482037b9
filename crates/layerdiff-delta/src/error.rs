//! Error types for the delta engine.

use layerdiff_binary::BinaryError;
use layerdiff_pipeline::{format_path, ChildKey, PipelineError};
use layerdiff_types::{TypeError, ValueKind};

/// Errors raised by diff, patch and reverse.
///
/// None of these is a runtime condition to branch on: each one means the
/// input or the engine setup is wrong and should be fixed by the caller.
#[derive(Debug, thiserror::Error)]
pub enum DeltaError {
    /// Diffing reached a value kind the engine refuses to compare.
    #[error("cannot diff {kind} value at {path}")]
    UnsupportedValue { kind: ValueKind, path: String },

    /// The pipeline was misconfigured.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// The delta's shape does not fit the value it is applied to.
    #[error("delta does not apply at {path}: expected {expected}, found {found}")]
    Mismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// A text patch does not match the text it is applied to.
    #[error("text patch does not apply at {path}: {reason}")]
    Text { path: String, reason: String },

    /// A binary patch does not match the buffer it is applied to.
    #[error("binary patch does not apply at {path}: {source}")]
    Binary {
        path: String,
        #[source]
        source: BinaryError,
    },

    /// A delta could not be decoded from its wire format.
    #[error("malformed delta: {0}")]
    Codec(String),

    /// Options could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A value could not be converted.
    #[error("value error: {0}")]
    Type(#[from] TypeError),
}

impl DeltaError {
    pub(crate) fn unsupported(kind: ValueKind, path: &[ChildKey]) -> Self {
        Self::UnsupportedValue {
            kind,
            path: format_path(path),
        }
    }

    pub(crate) fn mismatch(
        path: &[ChildKey],
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::Mismatch {
            path: format_path(path),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Convenience alias for delta results.
pub type DeltaResult<T> = Result<T, DeltaError>;
