//! Dynamic scalar values.
//!
//! [`Value`] is the currency of the whole crate: filter specs compare against
//! it, rows are made of it and wildcard substitution formats it into SQL text.

use crate::error::{OrmError, OrmResult};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Timestamp format used when a [`Value::DateTime`] is rendered as SQL text.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single scalar column value.
///
/// Deserialization is untagged and tries the variants in order, so a string
/// always comes back as [`Value::Text`] and a number as [`Value::Int`] or
/// [`Value::Float`]. Timestamps and decimals serialize to their text form and
/// are read back as text; [`Value::as_datetime`] parses it again.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL`
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text
    Text(String),
    /// Timestamp without time zone
    DateTime(NaiveDateTime),
    /// Exact numeric (`NUMERIC`, and `AVG`/`SUM` results)
    Decimal(Decimal),
    /// Raw bytes (`BYTEA`)
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns `true` for `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness of a value.
    ///
    /// `NULL`, `false`, `0`, `0.0` and the empty string are falsy; every other
    /// value is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::DateTime(_) => true,
            Value::Decimal(d) => !d.is_zero(),
            Value::Bytes(b) => !b.is_empty(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Decimal(d) if d.fract().is_zero() => d.to_i64(),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            Value::Int(i) => Some(Decimal::from(*i)),
            Value::Float(f) => Decimal::from_f64_retain(*f),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            Value::Text(s) => NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).ok(),
            _ => None,
        }
    }

    /// Textual form of a non-null value, as it is quoted into SQL.
    ///
    /// Booleans follow the loose-typing convention of `"1"` / `""`.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }

    /// Convert a JSON scalar into a value.
    ///
    /// Arrays and objects have no scalar form and are rejected.
    pub fn from_json(json: &serde_json::Value) -> OrmResult<Self> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Int(i)),
                None => n.as_f64().map(Value::Float).ok_or_else(|| {
                    OrmError::Serialization(format!("number {n} is out of range"))
                }),
            },
            serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(
                OrmError::Serialization(format!("expected a scalar JSON value, got {json}")),
            ),
        }
    }

    /// Convert into a JSON scalar.
    ///
    /// Timestamps and decimals use their serde form so they deserialize back
    /// into `NaiveDateTime` and `Decimal` fields. Bytes become an array of
    /// numbers, as serde does for `Vec<u8>`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::DateTime(dt) => serde_json::to_value(dt).unwrap_or_default(),
            Value::Decimal(d) => serde_json::to_value(d).unwrap_or_default(),
            Value::Bytes(b) => serde_json::Value::from(b.clone()),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::from(v.and_hms_opt(0, 0, 0))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Conversion from a borrowed [`Value`] into a Rust type.
///
/// Used by [`Row::try_get`](crate::Row::try_get).
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|i| i32::try_from(i).ok())
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            other => Some(other.to_text()),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_decimal()
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bytes().map(<[u8]>::to_vec)
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_datetime()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(!Value::from(0.0).is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::from(-1).is_truthy());
        assert!(Value::from(" ").is_truthy());
    }

    #[test]
    fn option_maps_to_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }

    #[test]
    fn json_scalars_round_trip() {
        let v = Value::from_json(&serde_json::json!(42)).unwrap();
        assert_eq!(v, Value::Int(42));
        assert_eq!(v.to_json(), serde_json::json!(42));

        let v = Value::from_json(&serde_json::json!(1.5)).unwrap();
        assert_eq!(v, Value::Float(1.5));

        assert!(Value::from_json(&serde_json::json!([1])).is_err());
        assert!(Value::from_json(&serde_json::json!({"a": 1})).is_err());
    }

    #[test]
    fn option_from_value() {
        assert_eq!(Option::<i64>::from_value(&Value::Null), Some(None));
        assert_eq!(Option::<i64>::from_value(&Value::Int(3)), Some(Some(3)));
        assert_eq!(i64::from_value(&Value::Text("12".into())), Some(12));
        assert_eq!(i64::from_value(&Value::Text("x".into())), None);
    }

    #[test]
    fn datetime_text_form() {
        let dt = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(13, 5, 9)
            .unwrap();
        assert_eq!(Value::from(dt).to_text(), "2024-02-29 13:05:09");
    }

    #[test]
    fn datetime_decodes_through_json() {
        #[derive(Deserialize)]
        struct Stamp {
            at: NaiveDateTime,
        }

        let dt = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(13, 5, 9)
            .unwrap();
        let stamp: Stamp =
            serde_json::from_value(serde_json::json!({ "at": Value::from(dt).to_json() }))
                .unwrap();
        assert_eq!(stamp.at, dt);
    }

    #[test]
    fn decimal_and_bytes() {
        let avg: Decimal = "2.5000".parse().unwrap();
        let v = Value::from(avg);
        assert!(v.is_truthy());
        assert_eq!(v.to_text(), "2.5000");
        assert_eq!(v.as_f64(), Some(2.5));
        assert_eq!(v.as_i64(), None);
        assert_eq!(Value::from(Decimal::from(15)).as_i64(), Some(15));
        assert!(!Value::from(Decimal::ZERO).is_truthy());

        let v = Value::from(b"\x00ab".as_slice());
        assert_eq!(Vec::<u8>::from_value(&v), Some(b"\x00ab".to_vec()));
        assert!(!Value::Bytes(vec![]).is_truthy());
    }

    #[test]
    fn deserialized_text_stays_text() {
        let v: Value = serde_json::from_str("\"2024-02-29 13:05:09\"").unwrap();
        assert_eq!(v, Value::Text("2024-02-29 13:05:09".into()));
        assert!(v.as_datetime().is_some());
    }
}
