//! After-children pass: merge child results into the parent's result.

use layerdiff_pipeline::{ChildKey, Filter, Step};
use layerdiff_types::Value;

use crate::context::{DiffOp, PatchOp, ReverseOp};
use crate::delta::Delta;
use crate::error::{DeltaError, DeltaResult};

use super::COLLECT_CHILDREN;

/// First filter of every pipe. Does nothing on a visit's first pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct CollectChildren;

/// File a child delta under its key in a pending node delta.
fn insert_child(node: &mut Delta, key: ChildKey, child: Delta, path: &[ChildKey]) -> DeltaResult<()> {
    match (node, key) {
        (Delta::Object(map), ChildKey::Property(name)) => {
            map.insert(name, child);
        }
        (Delta::Array(array), ChildKey::Index(index)) => {
            array.changed.insert(index, child);
        }
        (node, key) => {
            return Err(DeltaError::mismatch(
                path,
                format!("{} child key", node.tag()),
                format!("key {key}"),
            ));
        }
    }
    Ok(())
}

fn is_empty_node(delta: &Delta) -> bool {
    match delta {
        Delta::Object(map) => map.is_empty(),
        Delta::Array(array) => array.is_empty(),
        _ => false,
    }
}

impl Filter<DiffOp> for CollectChildren {
    fn name(&self) -> &str {
        COLLECT_CHILDREN
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, DiffOp>) -> DeltaResult<()> {
        if !step.has_children() {
            return Ok(());
        }
        let path = step.path();
        let Some(mut node) = step.state_mut().pending.take() else {
            return Err(DeltaError::mismatch(&path, "pending node delta", "none"));
        };
        for (key, result) in step.take_child_results() {
            if let Some(child) = result.flatten() {
                insert_child(&mut node, key, child, &path)?;
            }
        }
        let result = (!is_empty_node(&node)).then_some(node);
        step.set_result(result).exit();
        Ok(())
    }
}

impl Filter<ReverseOp> for CollectChildren {
    fn name(&self) -> &str {
        COLLECT_CHILDREN
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, ReverseOp>) -> DeltaResult<()> {
        if !step.has_children() {
            return Ok(());
        }
        let path = step.path();
        let Some(mut node) = step.state_mut().pending.take() else {
            return Err(DeltaError::mismatch(&path, "pending node delta", "none"));
        };
        for (key, result) in step.take_child_results() {
            if let Some(child) = result {
                insert_child(&mut node, key, child, &path)?;
            }
        }
        step.set_result(node).exit();
        Ok(())
    }
}

impl Filter<PatchOp> for CollectChildren {
    fn name(&self) -> &str {
        COLLECT_CHILDREN
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, PatchOp>) -> DeltaResult<()> {
        if !step.has_children() {
            return Ok(());
        }
        let path = step.path();
        let results = step.take_child_results();
        let mut target = std::mem::take(&mut step.state_mut().target);

        match &mut target {
            Value::Object(map) => {
                for (key, result) in results {
                    let name = key.to_string();
                    match result.flatten() {
                        Some(value) => {
                            map.insert(name, value);
                        }
                        None => {
                            map.remove(&name);
                        }
                    }
                }
            }
            Value::Array(items) => {
                for (key, result) in results {
                    let index = key.as_index().unwrap_or(usize::MAX);
                    let slot = items.get_mut(index).ok_or_else(|| {
                        DeltaError::mismatch(&path, "array index", format!("key {key}"))
                    })?;
                    *slot = result.flatten().ok_or_else(|| {
                        DeltaError::mismatch(&path, "surviving element", format!("removal of {key}"))
                    })?;
                }
            }
            other => {
                return Err(DeltaError::mismatch(&path, "object or array", other.kind().name()));
            }
        }

        step.set_result(Some(target)).exit();
        Ok(())
    }
}
