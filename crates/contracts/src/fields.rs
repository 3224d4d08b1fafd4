//! FieldMap - Dispatcher output, Sink input
//!
//! Normalized field-name to value map for a single record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered field map (stable key order for logs and files)
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Single normalized field value
///
/// `Null` is the explicit "absent" state; floats keep the exact decoded `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u8> for FieldValue {
    fn from(value: u8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_maps_to_null() {
        let absent: Option<f64> = None;
        assert!(FieldValue::from(absent).is_null());
        assert_eq!(FieldValue::from(Some(12.3)), FieldValue::Float(12.3));
    }

    #[test]
    fn test_serializes_untagged() {
        let mut fields = FieldMap::new();
        fields.insert("userid".into(), FieldValue::from(266064000u32));
        fields.insert("latitude".into(), FieldValue::from(57.1));
        fields.insert("name".into(), FieldValue::Null);

        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, r#"{"latitude":57.1,"name":null,"userid":266064000}"#);
    }
}
