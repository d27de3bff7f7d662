use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// A stored document: a JSON object keyed by field name.
///
/// Documents are schemaless at this layer. Typed reads and writes go through
/// [`Document::from_serialize`] and [`Document::deserialize_as`]; the
/// business crate defines the actual shapes.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Serializes a value into a document.
    ///
    /// Fails with `StoreError::NotAnObject` if the value does not serialize
    /// to a JSON object (documents always have named fields).
    pub fn from_serialize<T: Serialize>(value: &T) -> StoreResult<Self> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(StoreError::NotAnObject),
        }
    }

    /// Deserializes the document into a typed value.
    pub fn deserialize_as<T: DeserializeOwned>(&self) -> StoreResult<T> {
        Ok(serde_json::from_value(Value::Object(self.0.clone()))?)
    }

    /// Reads a single top-level field, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub(crate) fn set(&mut self, field: &str, value: Value) {
        self.0.insert(field.to_owned(), value);
    }

    pub(crate) fn merge(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            self.0.insert(key, value);
        }
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
