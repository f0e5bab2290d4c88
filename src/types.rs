//! Common types used throughout streamstate
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use crate::partition::PartitionKey;
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Sync Mode
// ============================================================================

/// Synchronization mode for streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Full refresh - fetch all data every time
    #[default]
    FullRefresh,
    /// Incremental - only fetch new/updated data
    Incremental,
}

// ============================================================================
// Cursor Format
// ============================================================================

/// Format for cursor values in incremental sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorFormat {
    /// ISO 8601 datetime string
    #[default]
    Iso8601,
    /// Unix timestamp (seconds)
    Unix,
    /// Unix timestamp (milliseconds)
    UnixMs,
    /// Plain string (lexicographic comparison, no conversion)
    String,
}

// ============================================================================
// Record
// ============================================================================

/// A single record read from a stream, tagged with its originating partition.
///
/// This is the boundary type between the record reader (external) and the
/// cursor core: the cursor only ever looks at the configured cursor field
/// inside `data` and at the partition key.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Partition this record belongs to
    pub partition: PartitionKey,
    /// Record payload
    pub data: JsonValue,
}

impl Record {
    /// Create a new record
    pub fn new(partition: PartitionKey, data: JsonValue) -> Self {
        Self { partition, data }
    }

    /// Extract the cursor field value, if present
    pub fn cursor_value(&self, cursor_field: &str) -> Option<&JsonValue> {
        self.data.get(cursor_field)
    }
}
