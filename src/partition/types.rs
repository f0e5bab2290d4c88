//! Partition key types
//!
//! Defines the canonical partition key used as the registry key for
//! per-partition cursor tracking.

use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An opaque, order-independent partition key.
///
/// Wraps the original mapping produced by the partition router together with
/// a canonical string form: compact JSON with recursively sorted object keys.
/// Two keys with the same logical content but different insertion order
/// compare equal and hash identically. The canonical form is also what shows
/// up in log messages and is used as the registry lookup key.
#[derive(Debug, Clone)]
pub struct PartitionKey {
    /// Original key/value pairs, kept for re-emission in serialized state
    fields: JsonObject,
    /// Canonical serialized form (sorted keys, compact JSON)
    canonical: String,
}

impl PartitionKey {
    /// Create a partition key from a JSON object
    pub fn new(fields: JsonObject) -> Self {
        let canonical = canonical_json(&JsonValue::Object(fields.clone()));
        Self { fields, canonical }
    }

    /// Create an empty partition key (unpartitioned streams)
    pub fn empty() -> Self {
        Self::new(JsonObject::new())
    }

    /// Create a partition key from a JSON value, if it is an object
    pub fn from_value(value: &JsonValue) -> Option<Self> {
        value.as_object().map(|fields| Self::new(fields.clone()))
    }

    /// Add a field to the key
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self.canonical = canonical_json(&JsonValue::Object(self.fields.clone()));
        self
    }

    /// Get a field value by name
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.fields.get(key)
    }

    /// The original key/value pairs
    pub fn fields(&self) -> &JsonObject {
        &self.fields
    }

    /// The canonical serialized form
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Whether the key has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl PartialEq for PartitionKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for PartitionKey {}

impl Hash for PartitionKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl Serialize for PartitionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PartitionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = JsonObject::deserialize(deserializer)?;
        Ok(Self::new(fields))
    }
}

/// Serialize a JSON value to a canonical string: compact, with object keys
/// sorted recursively. Scalars and arrays keep their natural encoding.
pub fn canonical_json(value: &JsonValue) -> String {
    match value {
        JsonValue::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let inner: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    format!(
                        "{}:{}",
                        serde_json::to_string(k).unwrap_or_default(),
                        canonical_json(&map[k])
                    )
                })
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        JsonValue::Array(items) => {
            let inner: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", inner.join(","))
        }
        scalar => serde_json::to_string(scalar).unwrap_or_default(),
    }
}
