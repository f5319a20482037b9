//! Structural diff, patch and reverse for layerdiff value trees.
//!
//! A [`DiffPatcher`] computes a [`Delta`] between two [`Value`] trees,
//! applies it (`patch`), undoes it (`unpatch`) and inverts it (`reverse`).
//! Each operation is a pipe of named filters run by the pipeline engine;
//! filters can be added, replaced or removed by name for customization.
//!
//! Binary buffers are diffed byte-wise by the default replacer, long strings
//! through an optional [`TextDiffer`], and arrays with optional move
//! detection.
//!
//! # Key Types
//!
//! - [`DiffPatcher`] -- the engine
//! - [`Delta`] / [`ArrayDelta`] -- what changed
//! - [`DeltaConfig`] / [`DiffOptions`] -- hooks and plain options
//! - [`Replacer`] -- takes over diffing of particular value pairs
//! - [`TextPatch`] / [`TextDiffer`] -- string edits and their producer

pub mod codec;
pub mod config;
pub mod context;
pub mod delta;
pub mod engine;
pub mod error;
pub mod filters;
pub mod replacer;
pub mod text;

use std::sync::OnceLock;

pub use config::{
    ArrayOptions, CloneFn, DeltaConfig, DiffOptions, ObjectHash, PropertyFilter, TextDiffOptions,
};
pub use context::{DiffOp, PatchOp, ReverseOp, DIFF_PIPE, PATCH_PIPE, REVERSE_PIPE};
pub use delta::{ArrayDelta, ArraySide, Delta};
pub use engine::DiffPatcher;
pub use error::{DeltaError, DeltaResult};
pub use replacer::{BinaryReplacer, Replacement, Replacer};
pub use text::{SimilarTextDiffer, TextDiffer, TextOp, TextPatch};

pub use layerdiff_types::Value;

/// Shared engine with the default configuration.
pub fn default_instance() -> &'static DiffPatcher {
    static DEFAULT: OnceLock<DiffPatcher> = OnceLock::new();
    DEFAULT.get_or_init(DiffPatcher::default)
}

/// [`DiffPatcher::diff`] on the default engine.
pub fn diff(left: &Value, right: &Value) -> DeltaResult<Option<Delta>> {
    default_instance().diff(left, right)
}

/// [`DiffPatcher::patch`] on the default engine.
pub fn patch(value: &mut Value, delta: &Delta) -> DeltaResult<()> {
    default_instance().patch(value, delta)
}

/// [`DiffPatcher::unpatch`] on the default engine.
pub fn unpatch(value: &mut Value, delta: &Delta) -> DeltaResult<()> {
    default_instance().unpatch(value, delta)
}

/// [`DiffPatcher::reverse`] on the default engine.
pub fn reverse(delta: &Delta) -> DeltaResult<Delta> {
    default_instance().reverse(delta)
}
