//! Partition router implementations
//!
//! Routers are the slice-producer boundary of the cursor core: each router
//! yields the partition keys a sync should iterate. Only routing strategies
//! that feed the per-partition cursor live here; request building and
//! pagination are owned by the retrieval layer.

use super::types::PartitionKey;
use crate::error::Result;
use crate::types::JsonValue;
use serde_json::json;
use std::collections::HashSet;

/// Trait for partition routers
pub trait PartitionRouter: Send + Sync {
    /// Generate the partition keys for one sync
    fn partitions(&self) -> Result<Vec<PartitionKey>>;

    /// Get the partition field name
    fn partition_field(&self) -> &str;
}

// ============================================================================
// List Router
// ============================================================================

/// List-based partition router
///
/// Creates partitions from a static list of values.
#[derive(Debug, Clone)]
pub struct ListRouter {
    /// List of partition values
    values: Vec<String>,
    /// Field name for partition
    partition_field: String,
}

impl ListRouter {
    /// Create a new list router
    pub fn new(values: Vec<String>, partition_field: impl Into<String>) -> Self {
        Self {
            values,
            partition_field: partition_field.into(),
        }
    }
}

impl PartitionRouter for ListRouter {
    fn partitions(&self) -> Result<Vec<PartitionKey>> {
        Ok(self
            .values
            .iter()
            .map(|v| PartitionKey::empty().with_field(self.partition_field.clone(), v.clone()))
            .collect())
    }

    fn partition_field(&self) -> &str {
        &self.partition_field
    }
}

// ============================================================================
// Parent Router
// ============================================================================

/// Parent stream-based partition router
///
/// Creates partitions from records in a parent stream (substream routing).
/// Each key carries the extracted parent value plus a `parent_slice` marker
/// so downstream state stays addressable per parent record.
#[derive(Debug, Clone)]
pub struct ParentRouter {
    /// Records from parent stream
    parent_records: Vec<JsonValue>,
    /// Key to extract from parent records
    parent_key: String,
    /// Field name for partition
    partition_field: String,
}

impl ParentRouter {
    /// Create a new parent router
    pub fn new(
        parent_records: Vec<JsonValue>,
        parent_key: impl Into<String>,
        partition_field: impl Into<String>,
    ) -> Self {
        Self {
            parent_records,
            parent_key: parent_key.into(),
            partition_field: partition_field.into(),
        }
    }

    /// Create an empty parent router (for deferred loading)
    pub fn empty(parent_key: impl Into<String>, partition_field: impl Into<String>) -> Self {
        Self {
            parent_records: Vec::new(),
            parent_key: parent_key.into(),
            partition_field: partition_field.into(),
        }
    }

    /// Set parent records
    pub fn set_records(&mut self, records: Vec<JsonValue>) {
        self.parent_records = records;
    }

    /// Extract value from a record using the parent key
    fn extract_key(&self, record: &JsonValue) -> Option<String> {
        // Handle nested keys like "id" or "data.id"
        let parts: Vec<&str> = self.parent_key.split('.').collect();
        let mut current = record;

        for part in parts {
            current = current.get(part)?;
        }

        match current {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl PartitionRouter for ParentRouter {
    fn partitions(&self) -> Result<Vec<PartitionKey>> {
        let mut partitions = Vec::new();
        let mut seen = HashSet::new();

        for record in &self.parent_records {
            if let Some(key_value) = self.extract_key(record) {
                // Deduplicate
                if seen.insert(key_value.clone()) {
                    partitions.push(
                        PartitionKey::empty()
                            .with_field(self.partition_field.clone(), key_value)
                            .with_field("parent_slice", json!({})),
                    );
                }
            }
        }

        Ok(partitions)
    }

    fn partition_field(&self) -> &str {
        &self.partition_field
    }
}
