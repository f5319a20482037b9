//! Text patches and the pluggable text differ.
//!
//! Long strings can be diffed into a [`TextPatch`] instead of being stored
//! whole. The engine ships no differ by default; [`SimilarTextDiffer`] is an
//! opt-in adapter over the `similar` crate.

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

/// One step of a text patch. Lengths and positions count chars.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextOp {
    /// Keep the next `n` chars.
    Retain(usize),
    /// Insert text at the current position.
    Insert(String),
    /// Remove the given text, which must be next in the input.
    Delete(String),
}

/// An edit script over a string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPatch {
    pub ops: Vec<TextOp>,
}

impl TextPatch {
    pub fn new(ops: Vec<TextOp>) -> Self {
        Self { ops }
    }

    /// Returns `true` if applying the patch leaves every input unchanged.
    pub fn is_noop(&self) -> bool {
        self.ops.iter().all(|op| matches!(op, TextOp::Retain(_)))
    }

    /// Chars inserted plus chars deleted.
    pub fn edit_size(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                TextOp::Retain(_) => 0,
                TextOp::Insert(s) | TextOp::Delete(s) => s.chars().count(),
            })
            .sum()
    }

    /// The patch that undoes this one.
    pub fn reversed(&self) -> Self {
        let ops = self
            .ops
            .iter()
            .map(|op| match op {
                TextOp::Retain(n) => TextOp::Retain(*n),
                TextOp::Insert(s) => TextOp::Delete(s.clone()),
                TextOp::Delete(s) => TextOp::Insert(s.clone()),
            })
            .collect();
        Self { ops }
    }

    /// Apply the patch to `text`.
    ///
    /// Deleted text is checked against the input, and the patch must consume
    /// the whole input. On failure the reason is returned.
    pub fn apply(&self, text: &str) -> Result<String, String> {
        let chars: Vec<char> = text.chars().collect();
        let mut pos = 0;
        let mut out = String::with_capacity(text.len());

        for op in &self.ops {
            match op {
                TextOp::Retain(n) => {
                    let end = pos + n;
                    if end > chars.len() {
                        return Err(format!(
                            "retain of {n} chars at {pos} overruns text of {} chars",
                            chars.len()
                        ));
                    }
                    out.extend(&chars[pos..end]);
                    pos = end;
                }
                TextOp::Insert(s) => out.push_str(s),
                TextOp::Delete(s) => {
                    let expected: Vec<char> = s.chars().collect();
                    let end = pos + expected.len();
                    if end > chars.len() || chars[pos..end] != expected[..] {
                        return Err(format!("deleted text {s:?} not found at {pos}"));
                    }
                    pos = end;
                }
            }
        }

        if pos != chars.len() {
            return Err(format!(
                "patch covers {pos} of {} chars",
                chars.len()
            ));
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Differ seam
// ---------------------------------------------------------------------------

/// Produces a [`TextPatch`] from two strings.
pub trait TextDiffer: Send + Sync {
    fn diff(&self, left: &str, right: &str) -> TextPatch;
}

impl<F> TextDiffer for F
where
    F: Fn(&str, &str) -> TextPatch + Send + Sync,
{
    fn diff(&self, left: &str, right: &str) -> TextPatch {
        self(left, right)
    }
}

/// Char-level Myers diff backed by `similar`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimilarTextDiffer;

impl TextDiffer for SimilarTextDiffer {
    fn diff(&self, left: &str, right: &str) -> TextPatch {
        let text_diff = TextDiff::from_chars(left, right);
        let mut ops: Vec<TextOp> = Vec::new();

        for change in text_diff.iter_all_changes() {
            let value = change.value();
            match (change.tag(), ops.last_mut()) {
                (ChangeTag::Equal, Some(TextOp::Retain(n))) => *n += value.chars().count(),
                (ChangeTag::Equal, _) => ops.push(TextOp::Retain(value.chars().count())),
                (ChangeTag::Delete, Some(TextOp::Delete(s))) => s.push_str(value),
                (ChangeTag::Delete, _) => ops.push(TextOp::Delete(value.to_string())),
                (ChangeTag::Insert, Some(TextOp::Insert(s))) => s.push_str(value),
                (ChangeTag::Insert, _) => ops.push(TextOp::Insert(value.to_string())),
            }
        }

        TextPatch { ops }
    }
}
