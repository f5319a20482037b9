//! Console rendering of deltas: one line per changed path.

use colored::{ColoredString, Colorize};
use layerdiff_delta::{ArrayDelta, ArraySide, Delta};
use layerdiff_types::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    Added,
    Deleted,
    Changed,
    Moved,
}

impl Marker {
    fn symbol(self) -> &'static str {
        match self {
            Self::Added => "+",
            Self::Deleted => "-",
            Self::Changed => "~",
            Self::Moved => ">",
        }
    }

    fn paint(self, text: &str) -> ColoredString {
        match self {
            Self::Added => text.green(),
            Self::Deleted => text.red(),
            Self::Changed => text.yellow(),
            Self::Moved => text.cyan(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub marker: Marker,
    pub path: String,
    pub detail: String,
}

impl Line {
    pub fn plain(&self) -> String {
        format!("{} {} {}", self.marker.symbol(), self.path, self.detail)
    }

    pub fn colored(&self) -> String {
        format!(
            "{} {} {}",
            self.marker.paint(self.marker.symbol()).bold(),
            self.path.bold(),
            self.marker.paint(&self.detail)
        )
    }
}

/// Flatten `delta` into lines, depth first. Removed array slots are shown
/// as `_N` (original index), other slots by their resulting index.
pub fn lines(delta: &Delta) -> Vec<Line> {
    let mut out = Vec::new();
    walk(delta, String::new(), &mut out);
    out
}

fn walk(delta: &Delta, path: String, out: &mut Vec<Line>) {
    let (marker, detail) = match delta {
        Delta::Added(value) => (Marker::Added, show(value)),
        Delta::Deleted(value) => (Marker::Deleted, show(value)),
        Delta::Changed(old, new) => (Marker::Changed, format!("{} -> {}", show(old), show(new))),
        Delta::TextChanged(patch) => (
            Marker::Changed,
            format!("text, {} chars edited", patch.edit_size()),
        ),
        Delta::BinaryChanged(patch) => (
            Marker::Changed,
            format!("binary, {} bytes in {} runs", patch.changed_bytes(), patch.runs()),
        ),
        Delta::Moved { to, .. } => (Marker::Moved, format!("to {to}")),
        Delta::Object(map) => {
            for (key, child) in map {
                walk(child, format!("{path}/{key}"), out);
            }
            return;
        }
        Delta::Array(array) => {
            for (index, side, child) in array_entries(array) {
                let segment = match side {
                    ArraySide::Removed => format!("_{index}"),
                    ArraySide::Changed => index.to_string(),
                };
                walk(child, format!("{path}/{segment}"), out);
            }
            return;
        }
    };
    let path = if path.is_empty() { "/".to_string() } else { path };
    out.push(Line {
        marker,
        path,
        detail,
    });
}

fn array_entries(array: &ArrayDelta) -> Vec<(usize, ArraySide, &Delta)> {
    let removed = array
        .removed
        .iter()
        .map(|(index, delta)| (*index, ArraySide::Removed, delta));
    let changed = array
        .changed
        .iter()
        .map(|(index, delta)| (*index, ArraySide::Changed, delta));
    removed.chain(changed).collect()
}

fn show(value: &Value) -> String {
    match value.to_json() {
        Ok(json) => json.to_string(),
        Err(_) => format!("<{}>", value.kind()),
    }
}
