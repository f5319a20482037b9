//! Strings: whole replacement, or character edits for long text.

use layerdiff_pipeline::{format_path, Filter, Step};
use layerdiff_types::Value;

use crate::context::{DiffOp, PatchOp};
use crate::delta::Delta;
use crate::error::{DeltaError, DeltaResult};

use super::TEXTS;

/// Strings: long ones are diffed with the configured text differ, the rest
/// change as whole values.
#[derive(Clone, Copy, Debug, Default)]
pub struct Texts;

impl Filter<DiffOp> for Texts {
    fn name(&self) -> &str {
        TEXTS
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, DiffOp>) -> DeltaResult<()> {
        let (left, right): (&'a Value, &'a Value) = (step.state().left, step.state().right);
        let (Value::String(a), Value::String(b)) = (left, right) else {
            return Ok(());
        };
        let config = step.config();
        let min_length = config.options.text_diff.min_length;

        let delta = match &config.text_differ {
            Some(differ) if a.chars().count() >= min_length && b.chars().count() >= min_length => {
                Delta::TextChanged(differ.diff(a, b))
            }
            _ => Delta::Changed(config.clone_value(left), config.clone_value(right)),
        };
        step.set_result(Some(delta)).exit();
        Ok(())
    }
}

impl Filter<PatchOp> for Texts {
    fn name(&self) -> &str {
        TEXTS
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, PatchOp>) -> DeltaResult<()> {
        let delta: &'a Delta = step.state().delta;
        let Delta::TextChanged(patch) = delta else {
            return Ok(());
        };
        let Value::String(text) = &step.state().target else {
            return Err(DeltaError::mismatch(
                &step.path(),
                "string",
                step.state().target.kind().name(),
            ));
        };
        let patched = patch.apply(text).map_err(|reason| DeltaError::Text {
            path: format_path(&step.path()),
            reason,
        })?;
        step.set_result(Some(Value::String(patched))).exit();
        Ok(())
    }
}
