//! Replacer hook: lets the host take over diffing of particular value pairs.

use layerdiff_binary::diff_bytes;
use layerdiff_types::Value;
use tracing::trace;

use crate::delta::Delta;

/// What a [`Replacer`] decided for one pair of values.
#[derive(Clone, Debug, PartialEq)]
pub enum Replacement {
    /// Not handled here; continue with the regular filters.
    Defer,
    /// Treat the pair as equal.
    Unchanged,
    /// Use this delta for the pair.
    Delta(Delta),
}

/// Consulted by the trivial diff filter before any equality check.
pub trait Replacer: Send + Sync {
    fn replace(&self, left: &Value, right: &Value) -> Replacement;
}

impl<F> Replacer for F
where
    F: Fn(&Value, &Value) -> Replacement + Send + Sync,
{
    fn replace(&self, left: &Value, right: &Value) -> Replacement {
        self(left, right)
    }
}

/// Diffs two binary buffers of the same element type byte-wise.
///
/// Buffers of different element types are left to the regular filters,
/// which record them as a whole-value change.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryReplacer;

impl Replacer for BinaryReplacer {
    fn replace(&self, left: &Value, right: &Value) -> Replacement {
        let (Value::Binary(old), Value::Binary(new)) = (left, right) else {
            return Replacement::Defer;
        };
        if old.element() != new.element() {
            return Replacement::Defer;
        }
        let patch = diff_bytes(old.as_bytes(), new.as_bytes());
        if patch.is_empty() {
            return Replacement::Unchanged;
        }
        trace!(
            element = %old.element(),
            runs = patch.runs(),
            changed = patch.changed_bytes(),
            "binary delta"
        );
        Replacement::Delta(Delta::BinaryChanged(patch))
    }
}
