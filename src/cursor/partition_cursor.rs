//! Per-partition cursor state
//!
//! Tracks the replication watermark for exactly one partition.

use super::strategy::CursorStrategy;
use crate::state::PartitionStateEntry;
use crate::types::{JsonObject, JsonValue};
use crate::error::Result;
use crate::partition::PartitionKey;
use std::cmp::Ordering;
use std::sync::Arc;

/// Cursor for a single partition.
///
/// Holds at most one cursor value and only ever moves it forward: `observe`
/// with an older or equal value is a silent no-op (idempotent replays, not
/// an error condition).
#[derive(Clone)]
pub struct PartitionCursor {
    strategy: Arc<dyn CursorStrategy>,
    cursor: Option<JsonValue>,
}

impl PartitionCursor {
    /// Create a cursor with no stored value
    pub fn new(strategy: Arc<dyn CursorStrategy>) -> Self {
        Self {
            strategy,
            cursor: None,
        }
    }

    /// Seed the cursor with a persisted value
    #[must_use]
    pub fn with_cursor(mut self, value: JsonValue) -> Self {
        self.cursor = Some(value);
        self
    }

    /// The stored cursor value, if any
    pub fn cursor(&self) -> Option<&JsonValue> {
        self.cursor.as_ref()
    }

    /// Advance the cursor if `value` is strictly greater than the stored
    /// value. Returns whether the cursor moved. Comparison failures from the
    /// strategy propagate.
    pub fn observe(&mut self, value: &JsonValue) -> Result<bool> {
        match &self.cursor {
            None => {
                self.cursor = Some(value.clone());
                Ok(true)
            }
            Some(current) => {
                if self.strategy.compare(value, current)? == Ordering::Greater {
                    self.cursor = Some(value.clone());
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }

    /// Seed with the smaller of the stored and provided values (replay and
    /// backfill: historical duplicates resume from the minimum).
    pub fn seed_minimum(&mut self, value: &JsonValue) -> Result<()> {
        match &self.cursor {
            None => self.cursor = Some(value.clone()),
            Some(current) => {
                if self.strategy.compare(value, current)? == Ordering::Less {
                    self.cursor = Some(value.clone());
                }
            }
        }
        Ok(())
    }

    /// Resume point for the next request for this partition: the stored
    /// value, else the stream's global cursor value, else the configured
    /// start value, else an empty mapping.
    pub fn request_state(
        &self,
        cursor_field: &str,
        global: Option<&JsonValue>,
        start: Option<&JsonValue>,
    ) -> JsonObject {
        let mut state = JsonObject::new();
        if let Some(value) = self.cursor.as_ref().or(global).or(start) {
            state.insert(cursor_field.to_string(), value.clone());
        }
        state
    }

    /// Convert to the serialized per-partition state entry
    pub fn to_state(&self, key: &PartitionKey, cursor_field: &str) -> PartitionStateEntry {
        let mut cursor = JsonObject::new();
        if let Some(value) = &self.cursor {
            cursor.insert(cursor_field.to_string(), value.clone());
        }
        PartitionStateEntry {
            partition: key.fields().clone(),
            cursor,
        }
    }
}

impl std::fmt::Debug for PartitionCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionCursor")
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}
