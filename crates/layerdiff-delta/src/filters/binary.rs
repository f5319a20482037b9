//! Binary buffers: byte-run patches applied in place.

use layerdiff_binary::{apply, Direction};
use layerdiff_pipeline::{format_path, Filter, Step};
use layerdiff_types::{BinaryBuffer, Value};

use crate::context::PatchOp;
use crate::delta::Delta;
use crate::error::{DeltaError, DeltaResult};

use super::BINARY;

/// Applies byte-run patches to binary buffers in place.
#[derive(Clone, Copy, Debug, Default)]
pub struct Binary;

impl Filter<PatchOp> for Binary {
    fn name(&self) -> &str {
        BINARY
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, PatchOp>) -> DeltaResult<()> {
        let delta: &'a Delta = step.state().delta;
        let Delta::BinaryChanged(patch) = delta else {
            return Ok(());
        };
        let path = step.path();
        let buffer = match std::mem::take(&mut step.state_mut().target) {
            Value::Binary(buffer) => buffer,
            other => return Err(DeltaError::mismatch(&path, "binary", other.kind().name())),
        };
        let element = buffer.element();
        let mut bytes = buffer.into_bytes();
        apply(&mut bytes, patch, Direction::Forward).map_err(|source| DeltaError::Binary {
            path: format_path(&path),
            source,
        })?;
        // A resize may cut an element in half.
        let patched = BinaryBuffer::new(element, bytes).map_err(|err| {
            DeltaError::mismatch(&path, format!("whole {element} elements"), err.to_string())
        })?;
        step.set_result(Some(Value::Binary(patched))).exit();
        Ok(())
    }
}
