//! The delta model.

use std::collections::BTreeMap;

use layerdiff_binary::BinaryPatch;
use layerdiff_types::Value;

use crate::text::TextPatch;

/// A description of how to turn one value tree into another.
///
/// Leaf variants describe a whole-value change. Node variants
/// ([`Delta::Object`], [`Delta::Array`]) hold child deltas keyed by property
/// or index. "No difference" is represented by the absence of a delta
/// (`Option<Delta>::None`), never by an empty node.
#[derive(Clone, Debug, PartialEq)]
pub enum Delta {
    /// The value did not exist before.
    Added(Value),
    /// The value was removed.
    Deleted(Value),
    /// The value was replaced: `(old, new)`.
    Changed(Value, Value),
    /// A string was edited in place.
    TextChanged(TextPatch),
    /// A binary buffer was edited in place.
    BinaryChanged(BinaryPatch),
    /// An array element moved to result index `to`. Only valid in
    /// [`ArrayDelta::removed`], keyed by the element's original index.
    Moved { value: Option<Value>, to: usize },
    /// Per-property changes of a keyed mapping.
    Object(BTreeMap<String, Delta>),
    /// Index-addressed changes of an ordered sequence.
    Array(ArrayDelta),
}

impl Delta {
    /// Returns `true` for the whole-value variants.
    pub fn is_leaf(&self) -> bool {
        !self.is_node()
    }

    /// Returns `true` for [`Delta::Object`] and [`Delta::Array`].
    pub fn is_node(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Array(_))
    }

    /// Short lowercase tag used in logs and console output.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Added(_) => "added",
            Self::Deleted(_) => "deleted",
            Self::Changed(..) => "changed",
            Self::TextChanged(_) => "text",
            Self::BinaryChanged(_) => "binary",
            Self::Moved { .. } => "moved",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
        }
    }

    /// Number of leaf deltas in this tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Object(map) => map.values().map(Delta::leaf_count).sum(),
            Self::Array(array) => array.entries().map(|(_, d)| d.leaf_count()).sum(),
            _ => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// ArrayDelta
// ---------------------------------------------------------------------------

/// Changes to an ordered sequence.
///
/// `removed` is keyed by index in the original array and holds
/// [`Delta::Deleted`] or [`Delta::Moved`]. `changed` is keyed by index in the
/// resulting array and holds [`Delta::Added`] or a delta for an element that
/// survives (possibly after a move).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArrayDelta {
    pub removed: BTreeMap<usize, Delta>,
    pub changed: BTreeMap<usize, Delta>,
}

/// Which side of an [`ArrayDelta`] an entry lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArraySide {
    /// Original index.
    Removed,
    /// Resulting index.
    Changed,
}

impl ArrayDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.changed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.removed.len() + self.changed.len()
    }

    /// All entries, removals first.
    pub fn entries(&self) -> impl Iterator<Item = (ArraySide, &Delta)> + '_ {
        self.removed
            .values()
            .map(|d| (ArraySide::Removed, d))
            .chain(self.changed.values().map(|d| (ArraySide::Changed, d)))
    }

    /// Move records as `(original index, resulting index)`.
    pub fn moves(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.removed.iter().filter_map(|(from, d)| match d {
            Delta::Moved { to, .. } => Some((*from, *to)),
            _ => None,
        })
    }

    /// Original index of the element that came from a move to `to`, if any.
    pub fn move_source(&self, to: usize) -> Option<usize> {
        self.moves().find(|(_, dest)| *dest == to).map(|(from, _)| from)
    }

    /// Map a resulting index of an element that was neither inserted nor
    /// moved back to its original index.
    ///
    /// Elements that stay in place keep their relative order, so the k-th
    /// surviving slot of the result is the k-th original element that was
    /// not removed. Runs in the number of entries, whatever the index.
    /// `None` when the original index does not fit in `usize`.
    pub fn original_index(&self, result_index: usize) -> Option<usize> {
        let inserted_before = self
            .changed
            .range(..result_index)
            .filter(|(_, d)| matches!(d, Delta::Added(_)))
            .count()
            + self.moves().filter(|(_, to)| *to < result_index).count();
        let mut original = result_index - inserted_before.min(result_index);
        for &removed in self.removed.keys() {
            if removed > original {
                break;
            }
            original = original.checked_add(1)?;
        }
        Some(original)
    }
}

impl From<ArrayDelta> for Delta {
    fn from(array: ArrayDelta) -> Self {
        Self::Array(array)
    }
}
