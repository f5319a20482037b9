//! The three traversals run over the pipeline engine.

use layerdiff_pipeline::Operation;
use layerdiff_types::Value;

use crate::config::DeltaConfig;
use crate::delta::Delta;
use crate::error::DeltaError;

pub const DIFF_PIPE: &str = "diff";
pub const PATCH_PIPE: &str = "patch";
pub const REVERSE_PIPE: &str = "reverse";

/// Computes the delta between two value trees.
pub struct DiffOp;

/// Operands of one diff visit.
#[derive(Debug)]
pub struct DiffState<'a> {
    pub left: &'a Value,
    pub right: &'a Value,
    /// Node delta being assembled while children run.
    pub pending: Option<Delta>,
}

impl<'a> DiffState<'a> {
    pub fn new(left: &'a Value, right: &'a Value) -> Self {
        Self {
            left,
            right,
            pending: None,
        }
    }
}

impl Operation for DiffOp {
    type State<'a> = DiffState<'a>;
    /// `None` means no difference.
    type Output = Option<Delta>;
    type Config = DeltaConfig;
    type Error = DeltaError;
}

/// Applies a delta to a value tree.
pub struct PatchOp;

/// Operands of one patch visit. The visit owns the value it rewrites.
#[derive(Debug)]
pub struct PatchState<'a> {
    pub target: Value,
    pub delta: &'a Delta,
}

impl<'a> PatchState<'a> {
    pub fn new(target: Value, delta: &'a Delta) -> Self {
        Self { target, delta }
    }
}

impl Operation for PatchOp {
    type State<'a> = PatchState<'a>;
    /// `None` removes the value from its parent.
    type Output = Option<Value>;
    type Config = DeltaConfig;
    type Error = DeltaError;
}

/// Builds the inverse of a delta.
pub struct ReverseOp;

#[derive(Debug)]
pub struct ReverseState<'a> {
    pub delta: &'a Delta,
    /// Inverted node delta being assembled while children run.
    pub pending: Option<Delta>,
}

impl<'a> ReverseState<'a> {
    pub fn new(delta: &'a Delta) -> Self {
        Self {
            delta,
            pending: None,
        }
    }
}

impl Operation for ReverseOp {
    type State<'a> = ReverseState<'a>;
    type Output = Delta;
    type Config = DeltaConfig;
    type Error = DeltaError;
}
