//! Error types for value conversions.

use thiserror::Error;

use crate::value::ValueKind;

/// Errors produced by value conversions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("{0} values cannot be encoded as JSON")]
    Unencodable(ValueKind),

    #[error("invalid {tag} envelope: {reason}")]
    InvalidEnvelope { tag: String, reason: String },

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("invalid byte length: element width {width}, got {actual} bytes")]
    InvalidLength { width: usize, actual: usize },
}
