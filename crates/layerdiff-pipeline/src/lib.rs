//! Pipeline engine for layerdiff.
//!
//! A small rule engine that threads a per-node visit record through ordered
//! filter chains. Diff, patch and reverse are each one configured pipe over
//! this engine; filters set a result, register children to recurse into,
//! redirect to another pipe, or short-circuit the rest of their pipe.
//!
//! # Key Types
//!
//! - [`Operation`] -- what a traversal carries and produces
//! - [`Filter`] -- one named rule
//! - [`Pipe`] -- named ordered filter list with name-based registration
//! - [`Processor`] -- owns pipes and drives depth-first traversal
//! - [`VisitTree`] / [`Step`] -- visit arena and a filter's handle on it

pub mod error;
pub mod operation;
pub mod pipe;
pub mod processor;
pub mod visit;

pub use error::{PipelineError, PipelineResult};
pub use operation::{Filter, Operation};
pub use pipe::Pipe;
pub use processor::Processor;
pub use visit::{format_path, ChildKey, Step, VisitId, VisitTree};
