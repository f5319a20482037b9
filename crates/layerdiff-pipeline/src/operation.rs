//! The operation and filter traits.

use crate::error::PipelineError;
use crate::visit::Step;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// One kind of traversal (diff, patch, reverse) run by a [`Processor`].
///
/// The operation fixes what a visit carries (`State`), what a finished visit
/// yields (`Output`), the options threaded through every visit (`Config`) and
/// the error its filters raise.
///
/// [`Processor`]: crate::Processor
pub trait Operation: 'static {
    /// Per-visit operands, borrowing from the traversal's inputs.
    type State<'a>;
    /// Result of a finished visit.
    type Output;
    /// Options shared by every visit of one traversal.
    type Config;
    /// Error raised by filters.
    type Error: From<PipelineError>;
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// A single rule in a pipe.
///
/// Filters are evaluated in pipe order. A filter inspects the visit through
/// the [`Step`] handle and either sets a result, registers children, marks
/// the visit exiting, or does nothing and lets the next filter run.
///
/// The trait is object-safe and `Send + Sync` so pipes can be stored in a
/// `Vec<Box<dyn Filter<O>>>` inside a shared engine.
pub trait Filter<O: Operation>: Send + Sync {
    /// Stable name used to address the filter in a pipe (e.g. "trivial").
    fn name(&self) -> &str;

    /// Process one visit.
    fn process<'a>(&self, step: &mut Step<'_, 'a, O>) -> Result<(), O::Error>;
}
