//! The settings document: an ordered map from string keys to scalar values.
//!
//! # On-disk format
//!
//! A document is stored as a single JSON object.  Keys are written in sorted
//! order and values are always scalars:
//!
//! ```json
//! {
//!   "_update_count": 3,
//!   "ai_enabled": false,
//!   "api_key": "",
//!   "theme": "dark"
//! }
//! ```
//!
//! Arrays and nested objects are not part of the format.  If a hand-edited
//! file contains one, that entry is dropped (with a warning) when the file is
//! parsed instead of rejecting the whole document.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::defaults::keys;
use super::validate::validate;

/// Error type for parsing, validating, and serializing documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The input contained nothing but whitespace.
    #[error("configuration document is empty")]
    Empty,

    /// The input bytes are not UTF-8.
    #[error("configuration document is not UTF-8: {0}")]
    NotUtf8(#[source] std::str::Utf8Error),

    /// The input is not well-formed JSON.
    #[error("configuration document is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The JSON root is an array, string, number, boolean, or null.
    #[error("configuration document root must be a JSON object")]
    NotAnObject,

    /// A key that every document must carry is absent.
    #[error("configuration document is missing required key `{0}`")]
    MissingRequiredKey(String),

    /// The document could not be rendered as JSON.
    #[error("failed to serialize configuration document: {0}")]
    Serialize(#[source] serde_json::Error),
}

// ── Scalar values ─────────────────────────────────────────────────────────────

/// A single scalar setting value.
///
/// `#[serde(untagged)]` makes each variant serialize as the bare JSON value
/// (`true`, `42`, `"dark"`, `null`) rather than as `{"Bool": true}`.  On
/// deserialization serde tries the variants in declaration order, so whole
/// numbers become [`ConfigValue::Integer`] and fractional ones
/// [`ConfigValue::Float`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum ConfigValue {
    /// JSON `null`.
    #[default]
    Null,
    /// JSON `true` / `false`.
    Bool(bool),
    /// A whole number.
    Integer(i64),
    /// A fractional number, used for epoch-second timestamps.
    Float(f64),
    /// A UTF-8 string.  Credentials may legitimately be empty strings.
    String(String),
}

impl ConfigValue {
    /// Returns `true` for [`ConfigValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Converts a parsed JSON value into a scalar.
    ///
    /// Returns `None` for arrays and objects, which have no scalar form.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Integer(i)),
                // u64 values above i64::MAX and fractional values land here.
                None => n.as_f64().map(Self::Float),
            },
            Value::String(s) => Some(Self::String(s)),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for ConfigValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for ConfigValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<ConfigValue>> From<Option<T>> for ConfigValue {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

// ── Document ──────────────────────────────────────────────────────────────────

/// A complete settings document.
///
/// # BTreeMap choice
///
/// A `BTreeMap` keeps keys sorted, so the serialized file has a stable key
/// order regardless of insertion order.  Diffs between two generations of the
/// file (for example the canonical file and its backup) stay readable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument {
    entries: BTreeMap<String, ConfigValue>,
}

impl ConfigDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and structurally validates a document from JSON text.
    ///
    /// Enum fields are *not* coerced here; see
    /// [`merge_with_defaults`](super::validate::merge_with_defaults).
    ///
    /// # Errors
    ///
    /// - [`DocumentError::Empty`] if `text` is blank.
    /// - [`DocumentError::Malformed`] if `text` is not JSON.
    /// - [`DocumentError::NotAnObject`] / [`DocumentError::MissingRequiredKey`]
    ///   if the JSON fails [`validate`].
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DocumentError::Empty);
        }
        let raw: serde_json::Value =
            serde_json::from_str(trimmed).map_err(DocumentError::Malformed)?;
        Self::from_json(raw)
    }

    /// Parses a document from raw file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NotUtf8`] for non-UTF-8 input, otherwise the
    /// same errors as [`ConfigDocument::parse`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        let text = std::str::from_utf8(bytes).map_err(DocumentError::NotUtf8)?;
        Self::parse(text)
    }

    /// Builds a document from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns the [`validate`] error if the value is not an object or lacks a
    /// required key.
    pub fn from_json(raw: serde_json::Value) -> Result<Self, DocumentError> {
        validate(&raw)?;

        let serde_json::Value::Object(map) = raw else {
            return Err(DocumentError::NotAnObject);
        };

        let mut entries = BTreeMap::new();
        for (key, value) in map {
            match ConfigValue::from_json(value) {
                Some(scalar) => {
                    entries.insert(key, scalar);
                }
                None => warn!("dropping non-scalar value for configuration key `{key}`"),
            }
        }
        Ok(Self { entries })
    }

    /// Renders the document as pretty-printed JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Serialize`] if `serde_json` reports an error.
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        let mut out = serde_json::to_string_pretty(self).map_err(DocumentError::Serialize)?;
        out.push('\n');
        Ok(out)
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    /// Returns the value stored under `key`, or `default` if absent.
    pub fn get_or(&self, key: &str, default: ConfigValue) -> ConfigValue {
        self.entries.get(key).cloned().unwrap_or(default)
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ConfigValue>,
    ) -> Option<ConfigValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.entries.iter()
    }

    // ── Metadata accessors ────────────────────────────────────────────────────

    /// The application version that last wrote this document.
    pub fn config_version(&self) -> Option<&str> {
        self.get(keys::CONFIG_VERSION).and_then(ConfigValue::as_str)
    }

    /// Epoch seconds at which this document was first created.
    pub fn created_timestamp(&self) -> Option<f64> {
        self.get(keys::CREATED_TIMESTAMP).and_then(ConfigValue::as_f64)
    }

    /// Epoch seconds of the most recent save.
    pub fn last_updated(&self) -> Option<f64> {
        self.get(keys::LAST_UPDATED).and_then(ConfigValue::as_f64)
    }

    /// Number of saves since the document was created.  Missing or
    /// non-integer counters read as 0.
    pub fn update_count(&self) -> u64 {
        self.get(keys::UPDATE_COUNT)
            .and_then(ConfigValue::as_i64)
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0)
    }
}

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for ConfigDocument {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ConfigDocument {
    type Item = (&'a String, &'a ConfigValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
