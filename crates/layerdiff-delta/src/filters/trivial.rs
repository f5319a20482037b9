//! Whole-value rules: equality, absent values, kind changes and leaf deltas.

use layerdiff_pipeline::{Filter, Step};
use layerdiff_types::{same_value, Value};
use tracing::trace;

use crate::context::{DiffOp, PatchOp, ReverseOp};
use crate::delta::Delta;
use crate::error::{DeltaError, DeltaResult};
use crate::replacer::Replacement;

use super::TRIVIAL;

#[derive(Clone, Copy, Debug, Default)]
pub struct Trivial;

impl Filter<DiffOp> for Trivial {
    fn name(&self) -> &str {
        TRIVIAL
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, DiffOp>) -> DeltaResult<()> {
        let left: &'a Value = step.state().left;
        let right: &'a Value = step.state().right;

        for side in [left, right] {
            if side.is_unsupported() {
                return Err(DeltaError::unsupported(side.kind(), &step.path()));
            }
        }

        let config = step.config();
        if let Some(replacer) = &config.replacer {
            match replacer.replace(left, right) {
                Replacement::Defer => {}
                Replacement::Unchanged => {
                    step.set_result(None).exit();
                    return Ok(());
                }
                Replacement::Delta(delta) => {
                    trace!(path = ?step.path(), tag = delta.tag(), "replaced");
                    step.set_result(Some(delta)).exit();
                    return Ok(());
                }
            }
        }

        if same_value(left, right) {
            step.set_result(None).exit();
            return Ok(());
        }

        // Null and Undefined are different values: a key explicitly set to
        // null must not collapse into a missing key.
        let whole_change = left.is_absent()
            || right.is_absent()
            || left.kind() != right.kind()
            || matches!(left, Value::Bool(_) | Value::Number(_) | Value::Binary(_));
        if whole_change {
            let path = step.path();
            let delta = Delta::Changed(
                config.payload(left, &path)?,
                config.payload(right, &path)?,
            );
            step.set_result(Some(delta)).exit();
        }
        Ok(())
    }
}

impl Filter<PatchOp> for Trivial {
    fn name(&self) -> &str {
        TRIVIAL
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, PatchOp>) -> DeltaResult<()> {
        let delta: &'a Delta = step.state().delta;
        match delta {
            Delta::Added(value) | Delta::Changed(_, value) => {
                step.set_result(Some(value.clone())).exit();
            }
            Delta::Deleted(_) => {
                step.set_result(None).exit();
            }
            Delta::Moved { .. } => {
                return Err(DeltaError::mismatch(
                    &step.path(),
                    "move record inside an array delta",
                    "move record on a value",
                ));
            }
            Delta::TextChanged(_)
            | Delta::BinaryChanged(_)
            | Delta::Object(_)
            | Delta::Array(_) => {}
        }
        Ok(())
    }
}

impl Filter<ReverseOp> for Trivial {
    fn name(&self) -> &str {
        TRIVIAL
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, ReverseOp>) -> DeltaResult<()> {
        let delta: &'a Delta = step.state().delta;
        let reversed = match delta {
            Delta::Added(value) => Delta::Deleted(value.clone()),
            Delta::Deleted(value) => Delta::Added(value.clone()),
            Delta::Changed(old, new) => Delta::Changed(new.clone(), old.clone()),
            Delta::TextChanged(patch) => Delta::TextChanged(patch.reversed()),
            Delta::BinaryChanged(patch) => Delta::BinaryChanged(patch.reversed()),
            Delta::Moved { .. } => {
                return Err(DeltaError::mismatch(
                    &step.path(),
                    "move record inside an array delta",
                    "move record on a value",
                ));
            }
            Delta::Object(_) | Delta::Array(_) => return Ok(()),
        };
        step.set_result(reversed).exit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::config::DeltaConfig;
    use crate::engine::DiffPatcher;
    use crate::error::DeltaError;
    use crate::replacer::Replacement;

    use super::*;

    fn value(json: serde_json::Value) -> Value {
        Value::from_json(json).unwrap()
    }

    #[test]
    fn equal_primitives_have_no_delta() {
        let patcher = DiffPatcher::default();
        assert_eq!(patcher.diff(&1.into(), &1.into()).unwrap(), None);
        assert_eq!(patcher.diff(&"a".into(), &"a".into()).unwrap(), None);
        let nan = Value::Number(f64::NAN);
        assert_eq!(patcher.diff(&nan, &nan.clone()).unwrap(), None);
    }

    #[test]
    fn null_and_undefined_differ() {
        let patcher = DiffPatcher::default();
        let delta = patcher.diff(&Value::Null, &Value::Undefined).unwrap();
        assert_eq!(delta, Some(Delta::Changed(Value::Null, Value::Undefined)));

        let left = value(json!({"a": null}));
        let right = Value::object([("a", Value::Undefined)]);
        let delta = patcher.diff(&left, &right).unwrap().unwrap();
        let Delta::Object(map) = delta else {
            panic!("expected object delta");
        };
        assert_eq!(map["a"], Delta::Changed(Value::Null, Value::Undefined));
    }

    #[test]
    fn kind_change_is_whole_value() {
        let patcher = DiffPatcher::default();
        let left = value(json!([1, 2]));
        let right = value(json!({"0": 1, "1": 2}));
        assert_eq!(
            patcher.diff(&left, &right).unwrap(),
            Some(Delta::Changed(left.clone(), right.clone()))
        );
        assert_eq!(
            patcher.diff(&1.into(), &"1".into()).unwrap(),
            Some(Delta::Changed(1.into(), "1".into()))
        );
    }

    #[test]
    fn unsupported_kinds_fail_fast() {
        let patcher = DiffPatcher::default();
        let left = Value::object([("tags", Value::Set(vec![1.into()]))]);
        let right = Value::object([("tags", Value::Set(vec![2.into()]))]);
        match patcher.diff(&left, &right).unwrap_err() {
            DeltaError::UnsupportedValue { kind, path } => {
                assert_eq!(kind.name(), "set");
                assert_eq!(path, "/tags");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn replacer_can_declare_values_unchanged() {
        let config = DeltaConfig::default().with_replacer(|left: &Value, right: &Value| {
            match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) if (a - b).abs() < 0.5 => Replacement::Unchanged,
                _ => Replacement::Defer,
            }
        });
        let patcher = DiffPatcher::new(config);
        assert_eq!(patcher.diff(&1.0.into(), &1.2.into()).unwrap(), None);
        assert!(patcher.diff(&1.0.into(), &2.0.into()).unwrap().is_some());
    }

    #[test]
    fn payloads_go_through_the_clone_hook() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let config = DeltaConfig::default().with_clone_diff_values(move |v| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            v.clone()
        });
        let patcher = DiffPatcher::new(config);
        patcher.diff(&1.into(), &2.into()).unwrap();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn reverse_swaps_leaves() {
        let patcher = DiffPatcher::default();
        assert_eq!(
            patcher.reverse(&Delta::Added(1.into())).unwrap(),
            Delta::Deleted(1.into())
        );
        assert_eq!(
            patcher.reverse(&Delta::Changed(1.into(), 2.into())).unwrap(),
            Delta::Changed(2.into(), 1.into())
        );
    }

    #[test]
    fn stray_move_record_is_rejected() {
        let patcher = DiffPatcher::default();
        let moved = Delta::Moved { value: None, to: 0 };
        assert!(matches!(
            patcher.reverse(&moved).unwrap_err(),
            DeltaError::Mismatch { .. }
        ));
        let mut target = Value::from(1);
        assert!(patcher.patch(&mut target, &moved).is_err());
    }
}
