//! Compact JSON wire format for deltas.
//!
//! | delta | JSON |
//! |---|---|
//! | added | `[new]` |
//! | changed | `[old, new]` |
//! | deleted | `[old, 0, 0]` |
//! | text | `[ops, 0, 2]` |
//! | moved | `[value or "", to, 3]` |
//! | binary | `[ops, 0, 4]` |
//! | object | `{"key": delta, ...}` |
//! | array | `{"_t": "a", "_3": removal, "5": change, ...}` |
//!
//! Array keys prefixed with `_` are original indices, plain keys resulting
//! indices. Values use the envelope encoding of [`Value::to_json`]; binary
//! bytes are base64.

use std::collections::BTreeMap;

use layerdiff_binary::{BinaryOp, BinaryPatch};
use layerdiff_types::{decode_bytes, encode_bytes, Value};
use serde_json::{json, Map, Value as Json};

use crate::delta::{ArrayDelta, Delta};
use crate::error::{DeltaError, DeltaResult};
use crate::text::TextPatch;

const DELETED: u64 = 0;
const TEXT: u64 = 2;
const MOVED: u64 = 3;
const BINARY: u64 = 4;

const ARRAY_MARKER_KEY: &str = "_t";
const ARRAY_MARKER: &str = "a";

fn codec_error(message: impl Into<String>) -> DeltaError {
    DeltaError::Codec(message.into())
}

impl Delta {
    /// Encode the delta in the compact wire format.
    pub fn to_json(&self) -> DeltaResult<Json> {
        Ok(match self {
            Self::Added(value) => json!([value.to_json()?]),
            Self::Changed(old, new) => json!([old.to_json()?, new.to_json()?]),
            Self::Deleted(value) => json!([value.to_json()?, 0, DELETED]),
            Self::TextChanged(patch) => {
                let ops = serde_json::to_value(&patch.ops)
                    .map_err(|e| codec_error(format!("text patch: {e}")))?;
                json!([ops, 0, TEXT])
            }
            Self::Moved { value, to } => {
                let value = match value {
                    Some(value) => value.to_json()?,
                    None => Json::String(String::new()),
                };
                json!([value, to, MOVED])
            }
            Self::BinaryChanged(patch) => json!([binary_to_json(patch), 0, BINARY]),
            Self::Object(map) => {
                let mut out = Map::new();
                for (key, delta) in map {
                    out.insert(key.clone(), delta.to_json()?);
                }
                Json::Object(out)
            }
            Self::Array(array) => {
                let mut out = Map::new();
                out.insert(ARRAY_MARKER_KEY.into(), Json::String(ARRAY_MARKER.into()));
                for (index, delta) in &array.removed {
                    out.insert(format!("_{index}"), delta.to_json()?);
                }
                for (index, delta) in &array.changed {
                    out.insert(index.to_string(), delta.to_json()?);
                }
                Json::Object(out)
            }
        })
    }

    /// Decode a delta from the compact wire format.
    pub fn from_json(json: Json) -> DeltaResult<Self> {
        match json {
            Json::Array(items) => leaf_from_json(items),
            Json::Object(map) => {
                if map.get(ARRAY_MARKER_KEY).and_then(Json::as_str) == Some(ARRAY_MARKER) {
                    array_from_json(map)
                } else {
                    let mut out = BTreeMap::new();
                    for (key, value) in map {
                        out.insert(key, Delta::from_json(value)?);
                    }
                    Ok(Self::Object(out))
                }
            }
            other => Err(codec_error(format!("expected array or object, got {other}"))),
        }
    }
}

fn leaf_from_json(items: Vec<Json>) -> DeltaResult<Delta> {
    let mut items = items.into_iter();
    match (items.next(), items.next(), items.next(), items.next()) {
        (Some(new), None, None, None) => Ok(Delta::Added(Value::from_json(new)?)),
        (Some(old), Some(new), None, None) => {
            Ok(Delta::Changed(Value::from_json(old)?, Value::from_json(new)?))
        }
        (Some(payload), Some(second), Some(tag), None) => {
            let tag = tag
                .as_u64()
                .ok_or_else(|| codec_error(format!("leaf tag must be a number, got {tag}")))?;
            match tag {
                DELETED => Ok(Delta::Deleted(Value::from_json(payload)?)),
                TEXT => {
                    let ops = serde_json::from_value(payload)
                        .map_err(|e| codec_error(format!("text patch: {e}")))?;
                    Ok(Delta::TextChanged(TextPatch::new(ops)))
                }
                MOVED => {
                    let to = index_from_json(&second)?;
                    let value = match payload {
                        Json::String(s) if s.is_empty() => None,
                        other => Some(Value::from_json(other)?),
                    };
                    Ok(Delta::Moved { value, to })
                }
                BINARY => Ok(Delta::BinaryChanged(binary_from_json(payload)?)),
                other => Err(codec_error(format!("unknown leaf tag {other}"))),
            }
        }
        _ => Err(codec_error("leaf delta must have 1 to 3 elements")),
    }
}

fn array_from_json(map: Map<String, Json>) -> DeltaResult<Delta> {
    let mut array = ArrayDelta::new();
    for (key, value) in map {
        if key == ARRAY_MARKER_KEY {
            continue;
        }
        let delta = Delta::from_json(value)?;
        match key.strip_prefix('_') {
            Some(index) => {
                array.removed.insert(parse_index(index)?, delta);
            }
            None => {
                array.changed.insert(parse_index(&key)?, delta);
            }
        }
    }
    Ok(Delta::Array(array))
}

fn parse_index(text: &str) -> DeltaResult<usize> {
    text.parse()
        .map_err(|_| codec_error(format!("invalid array index {text:?}")))
}

fn index_from_json(json: &Json) -> DeltaResult<usize> {
    json.as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| codec_error(format!("invalid array index {json}")))
}

// ---- Binary ops ----

fn binary_to_json(patch: &BinaryPatch) -> Json {
    let ops = patch
        .ops
        .iter()
        .map(|op| match op {
            BinaryOp::Resize { old_len, new_len } => json!({ "resize": [old_len, new_len] }),
            BinaryOp::Replace { offset, old, new } => {
                json!({ "replace": [offset, encode_bytes(old), encode_bytes(new)] })
            }
        })
        .collect();
    Json::Array(ops)
}

fn binary_from_json(json: Json) -> DeltaResult<BinaryPatch> {
    let Json::Array(items) = json else {
        return Err(codec_error("binary patch must be an array of ops"));
    };
    let mut ops = Vec::with_capacity(items.len());
    for item in items {
        if let Some(args) = item.get("resize").and_then(Json::as_array) {
            let [old_len, new_len] = args.as_slice() else {
                return Err(codec_error("resize takes [old_len, new_len]"));
            };
            ops.push(BinaryOp::Resize {
                old_len: index_from_json(old_len)?,
                new_len: index_from_json(new_len)?,
            });
        } else if let Some(args) = item.get("replace").and_then(Json::as_array) {
            let [offset, old, new] = args.as_slice() else {
                return Err(codec_error("replace takes [offset, old, new]"));
            };
            let bytes = |json: &Json| -> DeltaResult<Vec<u8>> {
                let text = json
                    .as_str()
                    .ok_or_else(|| codec_error("replace bytes must be base64 strings"))?;
                Ok(decode_bytes(text)?)
            };
            ops.push(BinaryOp::Replace {
                offset: index_from_json(offset)?,
                old: bytes(old)?,
                new: bytes(new)?,
            });
        } else {
            return Err(codec_error(format!("unknown binary op {item}")));
        }
    }
    Ok(BinaryPatch::new(ops))
}
