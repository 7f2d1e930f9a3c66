//! Typed frontmatter values.
//!
//! A source file may open with a YAML block (see [`crate::frontmatter`]). The
//! parsed block is exposed to stages as a [`Metadata`] mapping of string keys to
//! [`MetaValue`]s. `MetaValue` is a closed enum: stages match on it
//! exhaustively, and adding a variant is a compile-time-visible change.
//!
//! ## Conversion rules
//!
//! | YAML | `MetaValue` |
//! |------|-------------|
//! | `~`, empty value | `Null` |
//! | `true` / `false` | `Bool` |
//! | integer fitting in `i64` | `Integer` |
//! | any other number | `Float` |
//! | string | `String` |
//! | sequence | `Sequence` |
//! | mapping | `Mapping` (scalar keys stringified) |
//! | `!tag value` | the inner value, tag dropped |
//!
//! Mapping keys must be scalars. `1: one` becomes the key `"1"`; a sequence or
//! mapping used as a key is rejected.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Frontmatter mapping attached to a [`FileRecord`](crate::FileRecord).
pub type Metadata = BTreeMap<String, MetaValue>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("mapping key must be a scalar, found {0}")]
    NonScalarKey(&'static str),
    #[error("frontmatter must be a mapping, found {0}")]
    NotAMapping(&'static str),
}

/// A single frontmatter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<MetaValue>),
    Mapping(BTreeMap<String, MetaValue>),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetaValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Integer(n) => Some(*n as f64),
            MetaValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[MetaValue]> {
        match self {
            MetaValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, MetaValue>> {
        match self {
            MetaValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up `key` when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MetaValue::Null)
    }

    /// Short variant name, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            MetaValue::Null => "null",
            MetaValue::Bool(_) => "bool",
            MetaValue::Integer(_) => "integer",
            MetaValue::Float(_) => "float",
            MetaValue::String(_) => "string",
            MetaValue::Sequence(_) => "sequence",
            MetaValue::Mapping(_) => "mapping",
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Null => f.write_str("null"),
            MetaValue::Bool(b) => write!(f, "{b}"),
            MetaValue::Integer(n) => write!(f, "{n}"),
            MetaValue::Float(x) => write!(f, "{x}"),
            MetaValue::String(s) => f.write_str(s),
            MetaValue::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            MetaValue::Mapping(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::String(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::String(s)
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        MetaValue::Bool(b)
    }
}

impl From<i64> for MetaValue {
    fn from(n: i64) -> Self {
        MetaValue::Integer(n)
    }
}

impl From<f64> for MetaValue {
    fn from(x: f64) -> Self {
        MetaValue::Float(x)
    }
}

impl TryFrom<serde_yaml::Value> for MetaValue {
    type Error = ConversionError;

    fn try_from(value: serde_yaml::Value) -> Result<Self, Self::Error> {
        use serde_yaml::Value;

        Ok(match value {
            Value::Null => MetaValue::Null,
            Value::Bool(b) => MetaValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => MetaValue::Integer(i),
                None => MetaValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => MetaValue::String(s),
            Value::Sequence(items) => MetaValue::Sequence(
                items
                    .into_iter()
                    .map(MetaValue::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Mapping(map) => MetaValue::Mapping(convert_mapping(map)?),
            Value::Tagged(tagged) => MetaValue::try_from(tagged.value)?,
        })
    }
}

/// Convert the top level of a parsed frontmatter block.
///
/// An empty block parses as YAML null and yields an empty mapping; any other
/// non-mapping top level is rejected.
pub fn metadata_from_yaml(value: serde_yaml::Value) -> Result<Metadata, ConversionError> {
    match value {
        serde_yaml::Value::Null => Ok(Metadata::new()),
        serde_yaml::Value::Mapping(map) => convert_mapping(map),
        serde_yaml::Value::Tagged(tagged) => metadata_from_yaml(tagged.value),
        other => Err(ConversionError::NotAMapping(yaml_kind(&other))),
    }
}

fn convert_mapping(map: serde_yaml::Mapping) -> Result<Metadata, ConversionError> {
    let mut out = Metadata::new();
    for (key, value) in map {
        out.insert(key_to_string(key)?, MetaValue::try_from(value)?);
    }
    Ok(out)
}

fn key_to_string(key: serde_yaml::Value) -> Result<String, ConversionError> {
    use serde_yaml::Value;

    match key {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Tagged(tagged) => key_to_string(tagged.value),
        other => Err(ConversionError::NonScalarKey(yaml_kind(&other))),
    }
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    use serde_yaml::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// `true` when `metadata` holds `key: true`. Absent metadata, a missing key, or
/// any non-bool value all read as `false`.
pub fn flag(metadata: Option<&Metadata>, key: &str) -> bool {
    metadata
        .and_then(|m| m.get(key))
        .and_then(MetaValue::as_bool)
        .unwrap_or(false)
}
