//! Error types for the pipeline engine.

/// Pipeline misconfiguration errors.
///
/// All of these are programming errors: a silently missing result would be
/// indistinguishable from "no change", so they are always surfaced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// The processor owns no pipe with this name.
    #[error("pipe not found: {0}")]
    PipeNotFound(String),

    /// A registration call referenced a filter the pipe does not contain.
    #[error("filter '{filter}' not found in pipe '{pipe}'")]
    FilterNotFound { pipe: String, filter: String },

    /// A pipe that must produce a result finished a visit without one.
    #[error("pipe '{pipe}' finished without a result at {path}")]
    MissingResult { pipe: String, path: String },
}

/// Convenience alias for pipeline results.
pub type PipelineResult<T> = Result<T, PipelineError>;
