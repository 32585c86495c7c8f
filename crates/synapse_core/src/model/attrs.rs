//! Attribute values carried by nodes and marks.
//!
//! # Invariants
//! - Attribute maps are ordered by key, so equal maps compare and serialize
//!   identically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Ordered attribute map keyed by attribute name.
pub type Attrs = BTreeMap<String, AttrValue>;

/// One attribute value.
///
/// Serialized untagged, so markup reads as plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl AttrValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl Display for AttrValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Builds an attribute map from `(name, value)` pairs.
pub fn attrs<I, K, V>(pairs: I) -> Attrs
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<AttrValue>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{attrs, AttrValue};

    #[test]
    fn untagged_serialization_uses_plain_scalars() {
        let map = attrs([
            ("level", AttrValue::from(2_i64)),
            ("title", AttrValue::from("Plan")),
            ("heading", AttrValue::Null),
        ]);
        let json = serde_json::to_string(&map).expect("attrs serialize");
        assert_eq!(json, r#"{"heading":null,"level":2,"title":"Plan"}"#);

        let decoded: super::Attrs = serde_json::from_str(&json).expect("attrs deserialize");
        assert_eq!(decoded, map);
    }

    #[test]
    fn option_converts_to_null() {
        assert!(AttrValue::from(None::<String>).is_null());
        assert_eq!(AttrValue::from(Some("x")).as_str(), Some("x"));
    }
}
