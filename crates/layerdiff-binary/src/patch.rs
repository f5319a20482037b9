//! Run-length byte differ and patcher.
//!
//! Both buffers are scanned byte by byte; every position past the end of the
//! shorter buffer counts as a mismatch. Each maximal run of mismatches becomes
//! one [`BinaryOp::Replace`], and a length change adds one leading
//! [`BinaryOp::Resize`].

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{BinaryError, BinaryResult};

/// Which side of a patch to produce when applying it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Old bytes to new bytes.
    Forward,
    /// New bytes back to old bytes.
    Backward,
}

/// One edit of a binary patch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Change the buffer length, keeping the overlapping prefix.
    Resize { old_len: usize, new_len: usize },
    /// Overwrite a contiguous run starting at `offset`.
    ///
    /// `old` and `new` hold the run's bytes on each side; either may be
    /// shorter than the run when it extends past that side's end.
    Replace {
        offset: usize,
        old: Vec<u8>,
        new: Vec<u8>,
    },
}

/// An ordered list of binary edits. A `Resize`, if any, comes first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryPatch {
    pub ops: Vec<BinaryOp>,
}

impl BinaryPatch {
    pub fn new(ops: Vec<BinaryOp>) -> Self {
        Self { ops }
    }

    /// Returns `true` if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of `Replace` runs.
    pub fn runs(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, BinaryOp::Replace { .. }))
            .count()
    }

    /// Total bytes written when applying forward.
    pub fn changed_bytes(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                BinaryOp::Replace { new, .. } => new.len(),
                BinaryOp::Resize { .. } => 0,
            })
            .sum()
    }

    /// The `(old_len, new_len)` pair if the patch changes the length.
    pub fn resize(&self) -> Option<(usize, usize)> {
        self.ops.iter().find_map(|op| match op {
            BinaryOp::Resize { old_len, new_len } => Some((*old_len, *new_len)),
            BinaryOp::Replace { .. } => None,
        })
    }

    /// The inverse patch: applying it forward equals applying `self` backward.
    pub fn reversed(&self) -> Self {
        let ops = self
            .ops
            .iter()
            .map(|op| match op {
                BinaryOp::Resize { old_len, new_len } => BinaryOp::Resize {
                    old_len: *new_len,
                    new_len: *old_len,
                },
                BinaryOp::Replace { offset, old, new } => BinaryOp::Replace {
                    offset: *offset,
                    old: new.clone(),
                    new: old.clone(),
                },
            })
            .collect();
        Self { ops }
    }
}

/// Compute the patch turning `old` into `new`.
pub fn diff_bytes(old: &[u8], new: &[u8]) -> BinaryPatch {
    let mut ops = Vec::new();
    if old.len() != new.len() {
        ops.push(BinaryOp::Resize {
            old_len: old.len(),
            new_len: new.len(),
        });
    }

    let end = old.len().max(new.len());
    let differs = |i: usize| i >= old.len() || i >= new.len() || old[i] != new[i];

    let mut i = 0;
    while i < end {
        if !differs(i) {
            i += 1;
            continue;
        }
        let start = i;
        while i < end && differs(i) {
            i += 1;
        }
        ops.push(BinaryOp::Replace {
            offset: start,
            old: slice_run(old, start, i).to_vec(),
            new: slice_run(new, start, i).to_vec(),
        });
    }

    trace!(
        old_len = old.len(),
        new_len = new.len(),
        ops = ops.len(),
        "binary diff computed"
    );
    BinaryPatch { ops }
}

/// Apply `patch` to `buf` in place.
///
/// The whole patch is validated against the current contents before any
/// byte is touched, so a failed application leaves `buf` unchanged.
pub fn apply(buf: &mut Vec<u8>, patch: &BinaryPatch, direction: Direction) -> BinaryResult<()> {
    let (source_len, target_len) = match (patch.resize(), direction) {
        (Some((old_len, new_len)), Direction::Forward) => (old_len, new_len),
        (Some((old_len, new_len)), Direction::Backward) => (new_len, old_len),
        (None, _) => (buf.len(), buf.len()),
    };
    if buf.len() != source_len {
        return Err(BinaryError::LengthMismatch {
            expected: source_len,
            actual: buf.len(),
        });
    }

    for op in &patch.ops {
        if let BinaryOp::Replace { offset, old, new } = op {
            let (from, to) = sides(old, new, direction);
            check_bounds(*offset, from.len(), buf.len())?;
            check_bounds(*offset, to.len(), target_len)?;
            if &buf[*offset..*offset + from.len()] != from {
                return Err(BinaryError::ContentMismatch { offset: *offset });
            }
        }
    }

    buf.resize(target_len, 0);
    for op in &patch.ops {
        if let BinaryOp::Replace { offset, old, new } = op {
            let (_, to) = sides(old, new, direction);
            buf[*offset..*offset + to.len()].copy_from_slice(to);
        }
    }
    Ok(())
}

fn sides<'a>(old: &'a [u8], new: &'a [u8], direction: Direction) -> (&'a [u8], &'a [u8]) {
    match direction {
        Direction::Forward => (old, new),
        Direction::Backward => (new, old),
    }
}

fn slice_run(bytes: &[u8], start: usize, end: usize) -> &[u8] {
    &bytes[start.min(bytes.len())..end.min(bytes.len())]
}

fn check_bounds(offset: usize, len: usize, buf_len: usize) -> BinaryResult<()> {
    if offset.checked_add(len).map_or(true, |end| end > buf_len) {
        return Err(BinaryError::OutOfBounds {
            offset,
            len,
            buf_len,
        });
    }
    Ok(())
}
