//! Ordered sequences: index-addressed changes with optional move detection.
//!
//! Without move detection, elements are compared position by position. With
//! it, the common head and tail are trimmed, a longest common subsequence is
//! matched over the rest, and unmatched elements on the right are looked up
//! among the removed ones so a reordered element becomes a single move
//! record instead of a deletion plus an addition.

use layerdiff_pipeline::{Filter, Step};
use layerdiff_types::{deep_equal, same_value, Value};
use tracing::trace;

use crate::config::DeltaConfig;
use crate::context::{DiffOp, DiffState, PatchOp, PatchState, ReverseOp, ReverseState};
use crate::delta::{ArrayDelta, Delta};
use crate::error::{DeltaError, DeltaResult};

use super::lcs::longest_common_subsequence;
use super::ARRAYS;

#[derive(Clone, Copy, Debug, Default)]
pub struct Arrays;

// ---- Matching ----

/// Decides whether a left and a right element are the same item.
struct Matcher<'a> {
    config: &'a DeltaConfig,
    left: &'a [Value],
    right: &'a [Value],
    left_hashes: Vec<Option<String>>,
    right_hashes: Vec<Option<String>>,
}

impl<'a> Matcher<'a> {
    fn new(config: &'a DeltaConfig, left: &'a [Value], right: &'a [Value]) -> Self {
        let hashes = |items: &[Value]| -> Vec<Option<String>> {
            items
                .iter()
                .enumerate()
                .map(|(i, item)| item.is_container().then(|| config.hash_of(item, i)).flatten())
                .collect()
        };
        Self {
            config,
            left,
            right,
            left_hashes: hashes(left),
            right_hashes: hashes(right),
        }
    }

    /// Equal primitives match. Containers match by object hash when both
    /// have one, then by index under `match_by_position`, then by deep
    /// equality.
    fn matches(&self, i: usize, j: usize) -> bool {
        let (a, b) = (&self.left[i], &self.right[j]);
        if same_value(a, b) {
            return true;
        }
        if !a.is_container() || !b.is_container() {
            return false;
        }
        if let (Some(x), Some(y)) = (&self.left_hashes[i], &self.right_hashes[j]) {
            return x == y;
        }
        if self.config.options.match_by_position && i == j {
            return true;
        }
        deep_equal(a, b)
    }
}

// ---- Diff ----

fn diff_by_position<'a>(
    step: &mut Step<'_, 'a, DiffOp>,
    left: &'a [Value],
    right: &'a [Value],
    node: &mut ArrayDelta,
) -> DeltaResult<()> {
    let config = step.config();
    let path = step.path();
    for i in 0..left.len().max(right.len()) {
        match (left.get(i), right.get(i)) {
            (Some(a), Some(b)) => {
                step.push_child(i, DiffState::new(a, b));
            }
            (None, Some(b)) => {
                node.changed.insert(i, Delta::Added(config.child_payload(b, &path, i)?));
            }
            (Some(a), None) => {
                node.removed.insert(i, Delta::Deleted(config.child_payload(a, &path, i)?));
            }
            (None, None) => {}
        }
    }
    Ok(())
}

fn diff_with_moves<'a>(
    step: &mut Step<'_, 'a, DiffOp>,
    left: &'a [Value],
    right: &'a [Value],
    node: &mut ArrayDelta,
) -> DeltaResult<()> {
    let config = step.config();
    let path = step.path();
    let matcher = Matcher::new(config, left, right);
    let (left_len, right_len) = (left.len(), right.len());

    let mut head = 0;
    while head < left_len && head < right_len && matcher.matches(head, head) {
        step.push_child(head, DiffState::new(&left[head], &right[head]));
        head += 1;
    }
    let mut tail = 0;
    while head + tail < left_len
        && head + tail < right_len
        && matcher.matches(left_len - 1 - tail, right_len - 1 - tail)
    {
        let (i, j) = (left_len - 1 - tail, right_len - 1 - tail);
        step.push_child(j, DiffState::new(&left[i], &right[j]));
        tail += 1;
    }
    let (left_end, right_end) = (left_len - tail, right_len - tail);

    if head == left_end {
        for (j, item) in right.iter().enumerate().take(right_end).skip(head) {
            node.changed.insert(j, Delta::Added(config.child_payload(item, &path, j)?));
        }
        return Ok(());
    }
    if head == right_end {
        for (i, item) in left.iter().enumerate().take(left_end).skip(head) {
            node.removed.insert(i, Delta::Deleted(config.child_payload(item, &path, i)?));
        }
        return Ok(());
    }

    let common = longest_common_subsequence(left_end - head, right_end - head, |i, j| {
        matcher.matches(head + i, head + j)
    });
    let mut left_match = vec![None; left_end - head];
    let mut right_match = vec![None; right_end - head];
    for (i, j) in common {
        left_match[i] = Some(head + j);
        right_match[j] = Some(head + i);
    }

    let mut removed = Vec::new();
    for i in head..left_end {
        if left_match[i - head].is_none() {
            let value = config.child_payload(&left[i], &path, i)?;
            node.removed.insert(i, Delta::Deleted(value));
            removed.push(i);
        }
    }

    let mut moves = 0usize;
    for j in head..right_end {
        if let Some(i) = right_match[j - head] {
            step.push_child(j, DiffState::new(&left[i], &right[j]));
            continue;
        }
        match removed.iter().position(|&i| matcher.matches(i, j)) {
            Some(pos) => {
                let i = removed.remove(pos);
                let value = if config.options.arrays.include_value_on_move {
                    Some(config.child_payload(&left[i], &path, i)?)
                } else {
                    None
                };
                node.removed.insert(i, Delta::Moved { value, to: j });
                step.push_child(j, DiffState::new(&left[i], &right[j]));
                moves += 1;
            }
            None => {
                let value = config.child_payload(&right[j], &path, j)?;
                node.changed.insert(j, Delta::Added(value));
            }
        }
    }
    trace!(?path, head, tail, moves, "array moves detected");
    Ok(())
}

impl Filter<DiffOp> for Arrays {
    fn name(&self) -> &str {
        ARRAYS
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, DiffOp>) -> DeltaResult<()> {
        let (left, right): (&'a Value, &'a Value) = (step.state().left, step.state().right);
        let (Value::Array(left), Value::Array(right)) = (left, right) else {
            return Ok(());
        };

        let mut node = ArrayDelta::new();
        if step.config().options.arrays.detect_move {
            diff_with_moves(step, left, right, &mut node)?;
        } else {
            diff_by_position(step, left, right, &mut node)?;
        }

        if step.has_children() {
            step.state_mut().pending = Some(Delta::Array(node));
        } else {
            let result = (!node.is_empty()).then_some(Delta::Array(node));
            step.set_result(result);
        }
        step.exit();
        Ok(())
    }
}

// ---- Patch ----

impl Filter<PatchOp> for Arrays {
    fn name(&self) -> &str {
        ARRAYS
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, PatchOp>) -> DeltaResult<()> {
        let delta: &'a Delta = step.state().delta;
        let Delta::Array(array) = delta else {
            return Ok(());
        };
        let path = step.path();
        let mut target = std::mem::take(&mut step.state_mut().target);
        let items = match &mut target {
            Value::Array(items) => items,
            other => return Err(DeltaError::mismatch(&path, "array", other.kind().name())),
        };

        // Removals run from the highest original index down so the lower
        // ones stay valid.
        let mut inserts: Vec<(usize, Value)> = Vec::new();
        for (&index, entry) in array.removed.iter().rev() {
            if index >= items.len() {
                return Err(DeltaError::mismatch(
                    &path,
                    format!("element at {index}"),
                    format!("array of {}", items.len()),
                ));
            }
            let item = items.remove(index);
            match entry {
                Delta::Deleted(_) => {}
                Delta::Moved { to, .. } => inserts.push((*to, item)),
                other => {
                    return Err(DeltaError::mismatch(&path, "deletion or move", other.tag()));
                }
            }
        }

        let mut nested = Vec::new();
        for (&index, entry) in &array.changed {
            match entry {
                Delta::Added(value) => inserts.push((index, value.clone())),
                Delta::Deleted(_) | Delta::Moved { .. } => {
                    return Err(DeltaError::mismatch(
                        &path,
                        "addition or nested delta",
                        entry.tag(),
                    ));
                }
                _ => nested.push((index, entry)),
            }
        }

        inserts.sort_by_key(|(index, _)| *index);
        for (index, value) in inserts {
            if index > items.len() {
                return Err(DeltaError::mismatch(
                    &path,
                    format!("insertion point {index}"),
                    format!("array of {}", items.len()),
                ));
            }
            items.insert(index, value);
        }

        for (index, entry) in nested {
            let len = items.len();
            let slot = items.get_mut(index).ok_or_else(|| {
                DeltaError::mismatch(&path, format!("element at {index}"), format!("array of {len}"))
            })?;
            step.push_child(index, PatchState::new(std::mem::take(slot), entry));
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

// ---- Reverse ----

impl Filter<ReverseOp> for Arrays {
    fn name(&self) -> &str {
        ARRAYS
    }

    fn process<'a>(&self, step: &mut Step<'_, 'a, ReverseOp>) -> DeltaResult<()> {
        let delta: &'a Delta = step.state().delta;
        let Delta::Array(array) = delta else {
            return Ok(());
        };
        let path = step.path();
        let mut reversed = ArrayDelta::new();

        for (&index, entry) in &array.removed {
            match entry {
                Delta::Deleted(value) => {
                    reversed.changed.insert(index, Delta::Added(value.clone()));
                }
                Delta::Moved { value, to } => {
                    let value = value.clone();
                    reversed.removed.insert(*to, Delta::Moved { value, to: index });
                }
                other => {
                    return Err(DeltaError::mismatch(&path, "deletion or move", other.tag()));
                }
            }
        }

        for (&index, entry) in &array.changed {
            match entry {
                Delta::Added(value) => {
                    reversed.removed.insert(index, Delta::Deleted(value.clone()));
                }
                Delta::Deleted(_) | Delta::Moved { .. } => {
                    return Err(DeltaError::mismatch(
                        &path,
                        "addition or nested delta",
                        entry.tag(),
                    ));
                }
                nested => {
                    // Nested entries are addressed by resulting index; the
                    // inverse addresses the same element in the original.
                    let origin = array
                        .move_source(index)
                        .or_else(|| array.original_index(index))
                        .ok_or_else(|| {
                            DeltaError::mismatch(
                                &path,
                                "addressable element",
                                format!("element at {index}"),
                            )
                        })?;
                    step.push_child(origin, ReverseState::new(nested));
                }
            }
        }

        if step.has_children() {
            step.state_mut().pending = Some(Delta::Array(reversed));
        } else {
            step.set_result(Delta::Array(reversed));
        }
        step.exit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::config::DeltaConfig;
    use crate::engine::DiffPatcher;

    use super::*;

    fn value(json: serde_json::Value) -> Value {
        Value::from_json(json).unwrap()
    }

    fn array_delta(delta: Option<Delta>) -> ArrayDelta {
        match delta {
            Some(Delta::Array(array)) => array,
            other => panic!("expected array delta, got {other:?}"),
        }
    }

    fn assert_round_trip(patcher: &DiffPatcher, left: &Value, right: &Value) -> Option<Delta> {
        let delta = patcher.diff(left, right).unwrap();
        if let Some(delta) = &delta {
            let mut target = left.clone();
            patcher.patch(&mut target, delta).unwrap();
            assert_eq!(&target, right, "patch of {left:?}");
            patcher.unpatch(&mut target, delta).unwrap();
            assert_eq!(&target, left, "unpatch of {right:?}");
        } else {
            assert_eq!(left, right);
        }
        delta
    }

    #[test]
    fn appended_element() {
        let patcher = DiffPatcher::default();
        let array = array_delta(
            assert_round_trip(&patcher, &value(json!([1, 2, 3])), &value(json!([1, 2, 3, 4]))),
        );
        assert!(array.removed.is_empty());
        assert_eq!(array.changed.len(), 1);
        assert_eq!(array.changed[&3], Delta::Added(4.into()));
    }

    #[test]
    fn removal_change_and_append() {
        let left = value(json!([1, 3, 0, 8]));
        let right = value(json!([1, 0, 9, 10]));
        assert_round_trip(&DiffPatcher::default(), &left, &right);
        assert_round_trip(
            &DiffPatcher::new(DeltaConfig::default().detect_move(false)),
            &left,
            &right,
        );
    }

    #[test]
    fn positional_diff_recurses_pairwise() {
        let patcher = DiffPatcher::new(DeltaConfig::default().detect_move(false));
        let array = array_delta(
            assert_round_trip(&patcher, &value(json!([1, 3, 0, 8])), &value(json!([1, 0, 9]))),
        );
        assert_eq!(array.changed[&1], Delta::Changed(3.into(), 0.into()));
        assert_eq!(array.changed[&2], Delta::Changed(0.into(), 9.into()));
        assert_eq!(array.removed[&3], Delta::Deleted(8.into()));
    }

    #[test]
    fn single_move() {
        let patcher = DiffPatcher::default();
        let left = value(json!(["a", "b", "c", "d", "e"]));
        let right = value(json!(["b", "c", "d", "e", "a"]));
        let array = array_delta(assert_round_trip(&patcher, &left, &right));
        assert!(array.changed.is_empty());
        assert_eq!(array.removed[&0], Delta::Moved { value: None, to: 4 });
    }

    #[test]
    fn move_keeps_value_when_asked() {
        let mut config = DeltaConfig::default();
        config.options.arrays.include_value_on_move = true;
        let patcher = DiffPatcher::new(config);
        let array = array_delta(assert_round_trip(
            &patcher,
            &value(json!([1, 2, 3])),
            &value(json!([2, 3, 1])),
        ));
        assert_eq!(
            array.removed[&0],
            Delta::Moved {
                value: Some(1.into()),
                to: 2
            }
        );
    }

    #[test]
    fn rotated_slice_costs_one_move_at_any_length() {
        let patcher = DiffPatcher::default();
        for len in [4usize, 16, 64] {
            let mut items: Vec<Value> = (0..len + 2).map(|i| Value::from(i as f64)).collect();
            let left = Value::Array(items.clone());
            // Rotate the slice 1..=len left by one.
            items[1..=len].rotate_left(1);
            let right = Value::Array(items);
            let delta = assert_round_trip(&patcher, &left, &right).unwrap();
            assert_eq!(delta.leaf_count(), 1, "slice of {len}");
        }
    }

    #[test]
    fn moved_objects_matched_by_hash_carry_nested_changes() {
        let patcher = DiffPatcher::new(DeltaConfig::default().with_hash_key("id"));
        let left = value(json!([
            {"id": "bg", "opacity": 1},
            {"id": "ink", "opacity": 1},
            {"id": "sketch", "opacity": 0.3}
        ]));
        let right = value(json!([
            {"id": "ink", "opacity": 1},
            {"id": "sketch", "opacity": 0.3},
            {"id": "bg", "opacity": 0.5}
        ]));
        let array = array_delta(assert_round_trip(&patcher, &left, &right));
        assert_eq!(array.removed[&0], Delta::Moved { value: None, to: 2 });
        let Delta::Object(nested) = &array.changed[&2] else {
            panic!("expected nested object delta");
        };
        assert_eq!(nested["opacity"], Delta::Changed(1.into(), 0.5.into()));
    }

    #[test]
    fn hashed_objects_update_in_place() {
        let patcher = DiffPatcher::new(DeltaConfig::default().with_hash_key("id"));
        let left = value(json!([{"id": 1, "v": "a"}, {"id": 2, "v": "b"}]));
        let right = value(json!([{"id": 1, "v": "a"}, {"id": 2, "v": "c"}, {"id": 3, "v": "d"}]));
        let array = array_delta(assert_round_trip(&patcher, &left, &right));
        assert!(array.removed.is_empty());
        assert!(matches!(array.changed[&1], Delta::Object(_)));
        assert!(matches!(array.changed[&2], Delta::Added(_)));
    }

    #[test]
    fn match_by_position_pairs_containers() {
        let mut config = DeltaConfig::default();
        config.options.match_by_position = true;
        let patcher = DiffPatcher::new(config);
        let left = value(json!([{"x": 1}, {"x": 2}]));
        let right = value(json!([{"x": 1}, {"x": 3}]));
        let array = array_delta(assert_round_trip(&patcher, &left, &right));
        assert!(array.removed.is_empty());
        assert_eq!(array.changed.len(), 1);
        assert!(matches!(array.changed[&1], Delta::Object(_)));
    }

    #[test]
    fn mixed_edits_round_trip() {
        let patcher = DiffPatcher::new(DeltaConfig::default().with_hash_key("id"));
        let cases = [
            (json!([]), json!([1, 2])),
            (json!([1, 2]), json!([])),
            (json!([1, 2, 3, 4, 5]), json!([5, 4, 3, 2, 1])),
            (json!([1, [2, 3], 4]), json!([[2, 3, 5], 1, 4, 6])),
            (json!(["a", "b", "c", "d"]), json!(["x", "c", "a", "y", "d"])),
            (
                json!([{"id": "a", "n": 1}, {"id": "b", "n": 2}, {"id": "c"}]),
                json!([{"id": "c", "n": 9}, {"id": "a", "n": 1}, {"id": "d"}]),
            ),
        ];
        for (left, right) in cases {
            assert_round_trip(&patcher, &value(left), &value(right));
        }
    }

    #[test]
    fn reverse_maps_survivors_to_original_indices() {
        // [a, b, c] -> [x, a, c', y] where c' is c with one property edited.
        let patcher = DiffPatcher::new(DeltaConfig::default().with_hash_key("id"));
        let left = value(json!(["a", "b", {"id": "c", "k": 1}]));
        let right = value(json!(["x", "a", {"id": "c", "k": 2}, "y"]));
        let delta = assert_round_trip(&patcher, &left, &right).unwrap();
        let reversed = array_delta(Some(patcher.reverse(&delta).unwrap()));
        assert_eq!(reversed.removed[&0], Delta::Deleted("x".into()));
        assert_eq!(reversed.removed[&3], Delta::Deleted("y".into()));
        assert_eq!(reversed.changed[&1], Delta::Added("b".into()));
        assert!(matches!(reversed.changed[&2], Delta::Object(_)));
    }

    #[test]
    fn out_of_range_removal_fails() {
        let patcher = DiffPatcher::default();
        let mut array = ArrayDelta::new();
        array.removed.insert(5, Delta::Deleted(1.into()));
        let mut target = value(json!([1, 2]));
        assert!(matches!(
            patcher.patch(&mut target, &Delta::Array(array)).unwrap_err(),
            DeltaError::Mismatch { .. }
        ));
    }

    #[test]
    fn far_result_index_reverses_without_walking_to_it() {
        let patcher = DiffPatcher::default();
        let delta = Delta::from_json(json!({"_t": "a", "18446744073709551615": [1, 2]})).unwrap();

        let reversed = patcher.reverse(&delta).unwrap();
        let Delta::Array(array) = &reversed else {
            panic!("expected array delta");
        };
        assert_eq!(array.changed.keys().copied().collect::<Vec<_>>(), vec![usize::MAX]);

        let mut target = value(json!([1]));
        assert!(matches!(
            patcher.unpatch(&mut target, &delta).unwrap_err(),
            DeltaError::Mismatch { .. }
        ));
    }

    #[test]
    fn unaddressable_original_index_is_a_mismatch() {
        let patcher = DiffPatcher::default();
        let mut array = ArrayDelta::new();
        array.removed.insert(usize::MAX, Delta::Deleted(1.into()));
        array
            .changed
            .insert(usize::MAX, Delta::Changed(1.into(), 2.into()));
        assert!(matches!(
            patcher.reverse(&Delta::Array(array)).unwrap_err(),
            DeltaError::Mismatch { .. }
        ));
    }
}
