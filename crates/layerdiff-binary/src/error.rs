//! Error types for the binary codec.

/// Errors raised while applying a binary patch.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BinaryError {
    /// The buffer does not have the length the patch was computed against.
    #[error("buffer length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A replaced run falls outside the buffer.
    #[error("run at offset {offset} ({len} bytes) exceeds buffer of {buf_len} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        buf_len: usize,
    },

    /// The bytes being replaced are not the ones the patch recorded.
    #[error("content mismatch in run at offset {offset}")]
    ContentMismatch { offset: usize },
}

/// Convenience alias for codec results.
pub type BinaryResult<T> = Result<T, BinaryError>;
