//! JSON envelope for values.
//!
//! Plain JSON maps onto the value tree directly. Extensions travel as
//! single-key tagged objects so they survive a text-only boundary:
//!
//! - `{"$date": "2024-05-01T12:00:00Z"}`
//! - `{"$binary": "<base64>", "$element": "u16"}`
//! - `{"$undefined": true}`
//! - `{"$number": "NaN"}` (also `"Infinity"` and `"-Infinity"`)

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde_json::{Map, Number};

use crate::binary::{BinaryBuffer, ElementType};
use crate::error::TypeError;
use crate::value::{Value, ValueKind};

const DATE_TAG: &str = "$date";
const BINARY_TAG: &str = "$binary";
const ELEMENT_TAG: &str = "$element";
const UNDEFINED_TAG: &str = "$undefined";
const NUMBER_TAG: &str = "$number";

impl Value {
    /// Convert from JSON, decoding tagged extension envelopes.
    pub fn from_json(json: serde_json::Value) -> Result<Value, TypeError> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(map) => match decode_envelope(&map)? {
                Some(value) => value,
                None => Value::Object(
                    map.into_iter()
                        .map(|(k, v)| Ok((k, Value::from_json(v)?)))
                        .collect::<Result<_, TypeError>>()?,
                ),
            },
        })
    }

    /// Convert to JSON, encoding extensions as tagged envelopes.
    ///
    /// Hash-collections and uniqueness-collections have no encoding.
    pub fn to_json(&self) -> Result<serde_json::Value, TypeError> {
        Ok(match self {
            Value::Undefined => tagged(UNDEFINED_TAG, serde_json::Value::Bool(true)),
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => match Number::from_f64(*n) {
                Some(number) => serde_json::Value::Number(number),
                None => tagged(NUMBER_TAG, serde_json::Value::String(non_finite_name(*n).into())),
            },
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
                    .collect::<Result<_, TypeError>>()?,
            ),
            Value::Date(at) => tagged(DATE_TAG, serde_json::Value::String(at.to_rfc3339())),
            Value::Binary(buf) => {
                let mut map = Map::new();
                map.insert(
                    BINARY_TAG.into(),
                    serde_json::Value::String(STANDARD.encode(buf.as_bytes())),
                );
                map.insert(
                    ELEMENT_TAG.into(),
                    serde_json::Value::String(buf.element().tag().into()),
                );
                serde_json::Value::Object(map)
            }
            Value::Map(_) => return Err(TypeError::Unencodable(ValueKind::Map)),
            Value::Set(_) => return Err(TypeError::Unencodable(ValueKind::Set)),
        })
    }
}

/// Encode raw bytes with the same base64 alphabet the envelope uses.
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode bytes produced by [`encode_bytes`].
pub fn decode_bytes(text: &str) -> Result<Vec<u8>, TypeError> {
    STANDARD
        .decode(text)
        .map_err(|e| TypeError::InvalidBase64(e.to_string()))
}

fn tagged(tag: &str, payload: serde_json::Value) -> serde_json::Value {
    let mut map = Map::new();
    map.insert(tag.into(), payload);
    serde_json::Value::Object(map)
}

fn non_finite_name(n: f64) -> &'static str {
    if n.is_nan() {
        "NaN"
    } else if n.is_sign_negative() {
        "-Infinity"
    } else {
        "Infinity"
    }
}

fn decode_envelope(map: &Map<String, serde_json::Value>) -> Result<Option<Value>, TypeError> {
    if map.len() == 1 {
        if let Some(payload) = map.get(DATE_TAG) {
            let text = payload.as_str().ok_or_else(|| invalid(DATE_TAG, "expected a string"))?;
            let at = DateTime::parse_from_rfc3339(text)
                .map_err(|e| invalid(DATE_TAG, &e.to_string()))?;
            return Ok(Some(Value::Date(at.with_timezone(&Utc))));
        }
        if map.contains_key(UNDEFINED_TAG) {
            return Ok(Some(Value::Undefined));
        }
        if let Some(payload) = map.get(NUMBER_TAG) {
            let n = match payload.as_str() {
                Some("NaN") => f64::NAN,
                Some("Infinity") => f64::INFINITY,
                Some("-Infinity") => f64::NEG_INFINITY,
                _ => return Err(invalid(NUMBER_TAG, "expected NaN or +/-Infinity")),
            };
            return Ok(Some(Value::Number(n)));
        }
    }
    if map.len() == 2 {
        if let (Some(data), Some(element)) = (map.get(BINARY_TAG), map.get(ELEMENT_TAG)) {
            let data = data
                .as_str()
                .ok_or_else(|| invalid(BINARY_TAG, "expected a base64 string"))?;
            let element: ElementType = element
                .as_str()
                .ok_or_else(|| invalid(ELEMENT_TAG, "expected a string"))?
                .parse()?;
            let buf = BinaryBuffer::new(element, decode_bytes(data)?)?;
            return Ok(Some(Value::Binary(buf)));
        }
    }
    Ok(None)
}

fn invalid(tag: &str, reason: &str) -> TypeError {
    TypeError::InvalidEnvelope {
        tag: tag.into(),
        reason: reason.into(),
    }
}
