//! Timestamps compare by instant.

use layerdiff_pipeline::{Filter, Step};
use layerdiff_types::Value;

use crate::context::DiffOp;
use crate::delta::Delta;
use crate::error::DeltaResult;

use super::DATES;

/// Timestamps compare by instant and change as whole values.
#[derive(Clone, Copy, Debug, Default)]
pub struct Dates;

impl Filter<DiffOp> for Dates {
    fn name(&self) -> &str {
        DATES
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, DiffOp>) -> DeltaResult<()> {
        let (left, right): (&'a Value, &'a Value) = (step.state().left, step.state().right);
        let (Value::Date(a), Value::Date(b)) = (left, right) else {
            return Ok(());
        };
        let result = if a == b {
            None
        } else {
            let config = step.config();
            Some(Delta::Changed(config.clone_value(left), config.clone_value(right)))
        };
        step.set_result(result).exit();
        Ok(())
    }
}
