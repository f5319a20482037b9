//! Keyed mappings: one child visit per shared key.

use std::collections::BTreeMap;

use layerdiff_pipeline::{Filter, Step};
use layerdiff_types::Value;
use tracing::trace;

use crate::context::{DiffOp, DiffState, PatchOp, PatchState, ReverseOp, ReverseState};
use crate::delta::Delta;
use crate::error::{DeltaError, DeltaResult};

use super::OBJECTS;

#[derive(Clone, Copy, Debug, Default)]
pub struct Objects;

impl Filter<DiffOp> for Objects {
    fn name(&self) -> &str {
        OBJECTS
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, DiffOp>) -> DeltaResult<()> {
        let (left, right): (&'a Value, &'a Value) = (step.state().left, step.state().right);
        let (Value::Object(left_map), Value::Object(right_map)) = (left, right) else {
            return Ok(());
        };
        let config = step.config();
        let path = step.path();
        let mut node = BTreeMap::new();

        for (key, left_value) in left_map {
            if !config.includes_property(key, left, right) {
                continue;
            }
            match right_map.get(key) {
                Some(right_value) => {
                    step.push_child(key.as_str(), DiffState::new(left_value, right_value));
                }
                None => {
                    let value = config.child_payload(left_value, &path, key.as_str())?;
                    node.insert(key.clone(), Delta::Deleted(value));
                }
            }
        }
        for (key, right_value) in right_map {
            if left_map.contains_key(key) || !config.includes_property(key, left, right) {
                continue;
            }
            let value = config.child_payload(right_value, &path, key.as_str())?;
            node.insert(key.clone(), Delta::Added(value));
        }

        trace!(
            ?path,
            shared = step.has_children(),
            direct = node.len(),
            "object diff"
        );
        if step.has_children() {
            step.state_mut().pending = Some(Delta::Object(node));
        } else {
            let result = (!node.is_empty()).then_some(Delta::Object(node));
            step.set_result(result);
        }
        step.exit();
        Ok(())
    }
}

impl Filter<PatchOp> for Objects {
    fn name(&self) -> &str {
        OBJECTS
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, PatchOp>) -> DeltaResult<()> {
        let delta: &'a Delta = step.state().delta;
        let Delta::Object(entries) = delta else {
            return Ok(());
        };
        let path = step.path();
        let mut target = std::mem::take(&mut step.state_mut().target);
        let map = match &mut target {
            Value::Object(map) => map,
            other => return Err(DeltaError::mismatch(&path, "object", other.kind().name())),
        };

        // The parent keeps the map; children own the values they rewrite and
        // hand them back on the after-children pass.
        for (key, child) in entries {
            let current = map.remove(key).unwrap_or_default();
            step.push_child(key.as_str(), PatchState::new(current, child));
        }

        if step.has_children() {
            step.state_mut().target = target;
        } else {
            step.set_result(Some(target));
        }
        step.exit();
        Ok(())
    }
}

impl Filter<ReverseOp> for Objects {
    fn name(&self) -> &str {
        OBJECTS
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, ReverseOp>) -> DeltaResult<()> {
        let delta: &'a Delta = step.state().delta;
        let Delta::Object(entries) = delta else {
            return Ok(());
        };
        for (key, child) in entries {
            step.push_child(key.as_str(), ReverseState::new(child));
        }
        if step.has_children() {
            step.state_mut().pending = Some(Delta::Object(BTreeMap::new()));
        } else {
            step.set_result(Delta::Object(BTreeMap::new()));
        }
        step.exit();
        Ok(())
    }
}
