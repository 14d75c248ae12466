//! Row type and row mapping traits

use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};
use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An ordered mapping of field name to [`Value`].
///
/// Rows flow both ways: they are the data handed to `create`/`update` and the
/// records returned by `read`. Field order is preserved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Row::set`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field, replacing an existing value in place.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((field, value)),
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == field)
    }

    /// Remove a field and return its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(name, _)| name == field)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn into_values(self) -> impl Iterator<Item = Value> {
        self.entries.into_iter().map(|(_, value)| value)
    }

    /// Get a typed column value.
    ///
    /// Fails with [`OrmError::Decode`] when the column is missing or holds a
    /// value that does not convert to `T`.
    pub fn try_get<T: FromValue>(&self, field: &str) -> OrmResult<T> {
        let value = self
            .get(field)
            .ok_or_else(|| OrmError::decode(field, "column not found"))?;
        T::from_value(value).ok_or_else(|| {
            OrmError::decode(
                field,
                format!(
                    "cannot convert {value:?} to {}",
                    std::any::type_name::<T>()
                ),
            )
        })
    }

    /// Decode the row into any `Deserialize` type by way of JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> OrmResult<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }

    /// Encode any `Serialize` struct or map into a row.
    ///
    /// Nested arrays and objects are rejected because they have no scalar
    /// column representation.
    pub fn from_serialize<T: Serialize>(data: &T) -> OrmResult<Self> {
        match serde_json::to_value(data)? {
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(field, value)| Ok((field.clone(), Value::from_json(value)?)))
                .collect(),
            other => Err(OrmError::Serialization(format!(
                "expected a struct or map, got {other}"
            ))),
        }
    }

    /// JSON object form of the row.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (field, value) in iter {
            row.set(field, value);
        }
        row
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Row {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for Row {
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut row = Row::new();
                while let Some((field, value)) = access.next_entry::<String, Value>()? {
                    row.set(field, value);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// Trait for types that can be constructed from a [`Row`].
///
/// This is the explicit counterpart of a record factory: `read` hands back
/// plain rows and callers pick the decoding.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> OrmResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
    struct Widget {
        id: i64,
        foo: Option<String>,
    }

    #[test]
    fn set_replaces_in_place() {
        let mut row = Row::new().with("a", 1).with("b", 2);
        row.set("a", 3);
        assert_eq!(row.fields().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn remove_returns_value() {
        let mut row = Row::from([("id", 7)]);
        assert_eq!(row.remove("id"), Some(Value::Int(7)));
        assert!(row.is_empty());
        assert_eq!(row.remove("id"), None);
    }

    #[test]
    fn try_get_reports_column() {
        let row = Row::new().with("foo", "bar");
        assert_eq!(row.try_get::<String>("foo").unwrap(), "bar");
        let err = row.try_get::<i64>("missing").unwrap_err();
        assert!(matches!(err, OrmError::Decode { ref column, .. } if column == "missing"));
    }

    #[test]
    fn serde_struct_conversions() {
        let widget = Widget {
            id: 4,
            foo: None,
        };
        let row = Row::from_serialize(&widget).unwrap();
        assert_eq!(row.get("foo"), Some(&Value::Null));
        assert_eq!(row.decode::<Widget>().unwrap(), widget);
    }

    #[test]
    fn deserialize_from_json_object() {
        let row: Row = serde_json::from_str(r#"{"id": 1, "foo": "x", "bar": null}"#).unwrap();
        assert_eq!(row.get("id"), Some(&Value::Int(1)));
        assert_eq!(row.get("bar"), Some(&Value::Null));
    }
}
