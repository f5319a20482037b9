//! The value tree and its identity and structural comparisons.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::binary::BinaryBuffer;

/// A node of a JSON-compatible value tree.
///
/// Besides the JSON kinds the tree carries two extensions used by document
/// state: timestamps and fixed-format binary buffers. `Map` and `Set` exist
/// so host values can be represented faithfully; the diff engine refuses
/// them.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Placeholder for a genuinely missing key.
    #[default]
    Undefined,
    /// Explicit empty marker.
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Date(DateTime<Utc>),
    Binary(BinaryBuffer),
    /// Keyed hash-collection with arbitrary keys.
    Map(Vec<(Value, Value)>),
    /// Uniqueness-collection (membership only, no order).
    Set(Vec<Value>),
}

/// Classification of a [`Value`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Undefined,
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
    Date,
    Binary,
    Map,
    Set,
}

impl ValueKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Date => "date",
            Self::Binary => "binary",
            Self::Map => "map",
            Self::Set => "set",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Undefined => ValueKind::Undefined,
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Array(_) => ValueKind::Array,
            Self::Object(_) => ValueKind::Object,
            Self::Date(_) => ValueKind::Date,
            Self::Binary(_) => ValueKind::Binary,
            Self::Map(_) => ValueKind::Map,
            Self::Set(_) => ValueKind::Set,
        }
    }

    /// Booleans, numbers, strings and both absent flavors.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Undefined | Self::Null | Self::Bool(_) | Self::Number(_) | Self::String(_)
        )
    }

    /// Either "no value" flavor: the empty marker or the missing-key placeholder.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// Ordered sequences and keyed mappings.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Object(_))
    }

    /// Kinds the diff engine refuses to compare.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Map(_) | Self::Set(_))
    }

    /// The first refused kind anywhere in this subtree, depth first.
    pub fn find_unsupported(&self) -> Option<ValueKind> {
        match self {
            Self::Map(_) | Self::Set(_) => Some(self.kind()),
            Self::Array(items) => items.iter().find_map(Value::find_unsupported),
            Self::Object(map) => map.values().find_map(Value::find_unsupported),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&BinaryBuffer> {
        match self {
            Self::Binary(buf) => Some(buf),
            _ => None,
        }
    }

    /// Property lookup on objects; `None` for other kinds or missing keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Build an object from key/value pairs.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Deep clone through `f`, which is applied to every node before its
    /// children are visited. `f` returning `Some` replaces the node wholesale.
    pub fn clone_with<F>(&self, f: &F) -> Value
    where
        F: Fn(&Value) -> Option<Value>,
    {
        if let Some(replaced) = f(self) {
            return replaced;
        }
        match self {
            Self::Array(items) => Self::Array(items.iter().map(|v| v.clone_with(f)).collect()),
            Self::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.clone_with(f)))
                    .collect(),
            ),
            Self::Map(entries) => Self::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone_with(f), v.clone_with(f)))
                    .collect(),
            ),
            Self::Set(items) => Self::Set(items.iter().map(|v| v.clone_with(f)).collect()),
            other => other.clone(),
        }
    }
}

/// Identity comparison: the same node, or equal primitives (NaN equals NaN).
///
/// Containers only compare equal by identity here; use [`deep_equal`] for
/// structural comparison.
pub fn same_value(left: &Value, right: &Value) -> bool {
    if std::ptr::eq(left, right) {
        return true;
    }
    match (left, right) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(*a, *b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Date(a), Value::Date(b)) => a == b,
        (Value::Binary(a), Value::Binary(b)) => a == b,
        _ => false,
    }
}

/// Structural equality, NaN-aware. Objects compare as key sets.
pub fn deep_equal(left: &Value, right: &Value) -> bool {
    if same_value(left, right) {
        return true;
    }
    match (left, right) {
        (Value::Array(a), Value::Array(b)) | (Value::Set(a), Value::Set(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| deep_equal(v, other)))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|((ka, va), (kb, vb))| deep_equal(ka, kb) && deep_equal(va, vb))
        }
        _ => false,
    }
}

fn numbers_equal(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        deep_equal(self, other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::Object(map)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(at: DateTime<Utc>) -> Self {
        Self::Date(at)
    }
}

impl From<BinaryBuffer> for Value {
    fn from(buf: BinaryBuffer) -> Self {
        Self::Binary(buf)
    }
}
