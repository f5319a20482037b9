//! Diff options and the hooks that customize matching, copying and replacement.

use std::fmt;
use std::sync::Arc;

use layerdiff_pipeline::ChildKey;
use layerdiff_types::Value;
use serde::{Deserialize, Serialize};

use crate::error::{DeltaError, DeltaResult};
use crate::replacer::{BinaryReplacer, Replacer};
use crate::text::TextDiffer;

/// Identity of an array element for matching: `(item, index) -> id`.
pub type ObjectHash = Arc<dyn Fn(&Value, usize) -> Option<String> + Send + Sync>;

/// Decides whether a property is diffed: `(name, left parent, right parent)`.
pub type PropertyFilter = Arc<dyn Fn(&str, &Value, &Value) -> bool + Send + Sync>;

/// Clone applied to values copied into a delta.
pub type CloneFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

// ---------------------------------------------------------------------------
// DiffOptions
// ---------------------------------------------------------------------------

/// Plain-data diff options, loadable from TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Match array containers by index when no identity is available.
    pub match_by_position: bool,
    pub arrays: ArrayOptions,
    pub text_diff: TextDiffOptions,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrayOptions {
    /// Recognize reordered elements instead of delete plus add pairs.
    pub detect_move: bool,
    /// Keep the moved value in move records.
    pub include_value_on_move: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextDiffOptions {
    /// Strings shorter than this (in chars) are replaced whole.
    pub min_length: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            match_by_position: false,
            arrays: ArrayOptions::default(),
            text_diff: TextDiffOptions::default(),
        }
    }
}

impl Default for ArrayOptions {
    fn default() -> Self {
        Self {
            detect_move: true,
            include_value_on_move: false,
        }
    }
}

impl Default for TextDiffOptions {
    fn default() -> Self {
        Self { min_length: 60 }
    }
}

impl DiffOptions {
    /// Parse options from a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> DeltaResult<Self> {
        toml::from_str(text).map_err(|e| DeltaError::Config(e.to_string()))
    }

    /// Render the options as a TOML document.
    pub fn to_toml_string(&self) -> DeltaResult<String> {
        toml::to_string(self).map_err(|e| DeltaError::Config(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// DeltaConfig
// ---------------------------------------------------------------------------

/// Options and hooks threaded through every visit of diff, patch and
/// reverse.
#[derive(Clone)]
pub struct DeltaConfig {
    pub options: DiffOptions,
    pub object_hash: Option<ObjectHash>,
    pub text_differ: Option<Arc<dyn TextDiffer>>,
    pub property_filter: Option<PropertyFilter>,
    /// `None` deep-clones.
    pub clone_diff_values: Option<CloneFn>,
    pub replacer: Option<Arc<dyn Replacer>>,
}

impl Default for DeltaConfig {
    fn default() -> Self {
        Self {
            options: DiffOptions::default(),
            object_hash: None,
            text_differ: None,
            property_filter: None,
            clone_diff_values: None,
            replacer: Some(Arc::new(BinaryReplacer)),
        }
    }
}

impl DeltaConfig {
    pub fn new(options: DiffOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Identify array elements with `hash` when matching.
    pub fn with_object_hash<F>(mut self, hash: F) -> Self
    where
        F: Fn(&Value, usize) -> Option<String> + Send + Sync + 'static,
    {
        self.object_hash = Some(Arc::new(hash));
        self
    }

    /// Identify array elements by the string or number under `key`.
    pub fn with_hash_key(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.with_object_hash(move |item, _| match item.get(&key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn with_text_differ(mut self, differ: impl TextDiffer + 'static) -> Self {
        self.text_differ = Some(Arc::new(differ));
        self
    }

    pub fn with_property_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, &Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.property_filter = Some(Arc::new(filter));
        self
    }

    pub fn with_clone_diff_values<F>(mut self, clone: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.clone_diff_values = Some(Arc::new(clone));
        self
    }

    pub fn with_replacer(mut self, replacer: impl Replacer + 'static) -> Self {
        self.replacer = Some(Arc::new(replacer));
        self
    }

    /// Diff binary buffers as whole values.
    pub fn without_replacer(mut self) -> Self {
        self.replacer = None;
        self
    }

    pub fn detect_move(mut self, enabled: bool) -> Self {
        self.options.arrays.detect_move = enabled;
        self
    }

    /// Copy a value into a delta payload.
    pub fn clone_value(&self, value: &Value) -> Value {
        match &self.clone_diff_values {
            Some(clone) => clone(value),
            None => value.clone(),
        }
    }

    /// Copy a value into a delta payload. Subtrees holding a hash- or
    /// uniqueness-collection are refused, with `path` as their location.
    pub fn payload(&self, value: &Value, path: &[ChildKey]) -> DeltaResult<Value> {
        match value.find_unsupported() {
            Some(kind) => Err(DeltaError::unsupported(kind, path)),
            None => Ok(self.clone_value(value)),
        }
    }

    /// [`DeltaConfig::payload`] for the child `key` of the node at `parent`.
    pub fn child_payload(
        &self,
        value: &Value,
        parent: &[ChildKey],
        key: impl Into<ChildKey>,
    ) -> DeltaResult<Value> {
        match value.find_unsupported() {
            Some(kind) => {
                let mut path = parent.to_vec();
                path.push(key.into());
                Err(DeltaError::unsupported(kind, &path))
            }
            None => Ok(self.clone_value(value)),
        }
    }

    /// Whether the property `name` of the given parents takes part in a diff.
    pub fn includes_property(&self, name: &str, left: &Value, right: &Value) -> bool {
        self.property_filter
            .as_ref()
            .map_or(true, |filter| filter(name, left, right))
    }

    /// Identity of an array element, if an object hash is configured and
    /// produces one.
    pub fn hash_of(&self, item: &Value, index: usize) -> Option<String> {
        self.object_hash.as_ref().and_then(|hash| hash(item, index))
    }
}

impl fmt::Debug for DeltaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeltaConfig")
            .field("options", &self.options)
            .field("object_hash", &self.object_hash.is_some())
            .field("text_differ", &self.text_differ.is_some())
            .field("property_filter", &self.property_filter.is_some())
            .field("clone_diff_values", &self.clone_diff_values.is_some())
            .field("replacer", &self.replacer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = DiffOptions::default();
        assert!(!options.match_by_position);
        assert!(options.arrays.detect_move);
        assert!(!options.arrays.include_value_on_move);
        assert_eq!(options.text_diff.min_length, 60);

        let config = DeltaConfig::default();
        assert!(config.replacer.is_some());
        assert!(config.text_differ.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let options = DiffOptions::from_toml_str(
            r#"
            match_by_position = true

            [arrays]
            include_value_on_move = true
            "#,
        )
        .unwrap();
        assert!(options.match_by_position);
        assert!(options.arrays.detect_move);
        assert!(options.arrays.include_value_on_move);
        assert_eq!(options.text_diff.min_length, 60);
    }

    #[test]
    fn toml_round_trip() {
        let mut options = DiffOptions::default();
        options.text_diff.min_length = 8;
        let text = options.to_toml_string().unwrap();
        assert_eq!(DiffOptions::from_toml_str(&text).unwrap(), options);
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = DiffOptions::from_toml_str("arrays = 3").unwrap_err();
        assert!(matches!(err, DeltaError::Config(_)));
    }

    #[test]
    fn hash_key_reads_strings_and_numbers() {
        let config = DeltaConfig::default().with_hash_key("id");
        let named = Value::object([("id", Value::from("a"))]);
        let numbered = Value::object([("id", Value::from(7))]);
        assert_eq!(config.hash_of(&named, 0), Some("a".into()));
        assert_eq!(config.hash_of(&numbered, 0), Some("7".into()));
        assert_eq!(config.hash_of(&Value::Null, 0), None);
    }

    #[test]
    fn clone_value_uses_the_hook() {
        let config = DeltaConfig::default().with_clone_diff_values(|_| Value::from("copy"));
        assert_eq!(config.clone_value(&Value::from(1)), Value::from("copy"));
        assert_eq!(DeltaConfig::default().clone_value(&Value::from(1)), Value::from(1));
    }
}
