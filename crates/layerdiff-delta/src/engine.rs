//! The engine tying the diff, patch and reverse pipes to one configuration.

use layerdiff_pipeline::{PipelineError, Processor};
use layerdiff_types::Value;
use tracing::debug;

use crate::config::DeltaConfig;
use crate::context::{
    DiffOp, DiffState, PatchOp, PatchState, ReverseOp, ReverseState, DIFF_PIPE, PATCH_PIPE,
    REVERSE_PIPE,
};
use crate::delta::Delta;
use crate::error::DeltaResult;
use crate::filters;

/// The diff/patch/reverse engine.
///
/// Holds a configuration and one processor per operation. Build it once and
/// share it by reference; it is immutable after construction (apart from
/// filter registration through the `*_processor_mut` accessors) and
/// `Send + Sync`.
#[derive(Debug)]
pub struct DiffPatcher {
    config: DeltaConfig,
    differ: Processor<DiffOp>,
    patcher: Processor<PatchOp>,
    reverser: Processor<ReverseOp>,
}

impl DiffPatcher {
    pub fn new(config: DeltaConfig) -> Self {
        let mut differ = Processor::new();
        differ.add_pipe(filters::diff_pipe());
        let mut patcher = Processor::new();
        patcher.add_pipe(filters::patch_pipe());
        let mut reverser = Processor::new();
        reverser.add_pipe(filters::reverse_pipe());
        Self {
            config,
            differ,
            patcher,
            reverser,
        }
    }

    pub fn config(&self) -> &DeltaConfig {
        &self.config
    }

    /// Compute the delta turning `left` into `right`. `None` means the two
    /// are deeply equal.
    pub fn diff(&self, left: &Value, right: &Value) -> DeltaResult<Option<Delta>> {
        let delta = self
            .differ
            .process(DIFF_PIPE, DiffState::new(left, right), &self.config)?
            .flatten();
        debug!(
            changed = delta.is_some(),
            leaves = delta.as_ref().map_or(0, Delta::leaf_count),
            "diff"
        );
        Ok(delta)
    }

    /// Apply `delta` to `value` in place.
    ///
    /// On error `value` is left in an unspecified state; clone it first if
    /// it must survive a failed patch. A delta that deletes the root leaves
    /// [`Value::Undefined`].
    pub fn patch(&self, value: &mut Value, delta: &Delta) -> DeltaResult<()> {
        let target = std::mem::take(value);
        let result = self
            .patcher
            .process(PATCH_PIPE, PatchState::new(target, delta), &self.config)?;
        *value = result.flatten().unwrap_or_default();
        debug!(tag = delta.tag(), "patch");
        Ok(())
    }

    /// Undo `delta` on `value` in place: `value` must be what `delta`
    /// produces, and becomes what `delta` was computed from.
    pub fn unpatch(&self, value: &mut Value, delta: &Delta) -> DeltaResult<()> {
        let reversed = self.reverse(delta)?;
        self.patch(value, &reversed)
    }

    /// The delta that undoes `delta`.
    pub fn reverse(&self, delta: &Delta) -> DeltaResult<Delta> {
        let reversed = self
            .reverser
            .process(REVERSE_PIPE, ReverseState::new(delta), &self.config)?
            .ok_or_else(|| PipelineError::MissingResult {
                pipe: REVERSE_PIPE.to_string(),
                path: "/".to_string(),
            })?;
        Ok(reversed)
    }

    // ---- Customization ----

    pub fn diff_processor_mut(&mut self) -> &mut Processor<DiffOp> {
        &mut self.differ
    }

    pub fn patch_processor_mut(&mut self) -> &mut Processor<PatchOp> {
        &mut self.patcher
    }

    pub fn reverse_processor_mut(&mut self) -> &mut Processor<ReverseOp> {
        &mut self.reverser
    }
}

impl Default for DiffPatcher {
    fn default() -> Self {
        Self::new(DeltaConfig::default())
    }
}
