//! Per-partition cursor orchestration
//!
//! The core state machine of incremental sync: one cursor per partition,
//! bounded memory through LRU eviction, and a one-way fall back to a single
//! global cursor once partition cardinality looks unbounded.

use super::global::GlobalCursor;
use super::partition_cursor::PartitionCursor;
use super::strategy::CursorStrategy;
use crate::error::Result;
use crate::partition::PartitionKey;
use crate::state::StreamState;
use crate::types::{JsonObject, JsonValue, Record};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default ceiling on concurrently tracked partitions before eviction begins
pub const DEFAULT_MAX_PARTITIONS_NUMBER: usize = 25_000;

/// A partition currently tracked by the registry
struct TrackedPartition {
    /// Structured key, kept for state re-emission
    key: PartitionKey,
    cursor: PartitionCursor,
    /// Monotonic touch sequence; the minimum is the LRU partition
    last_touched: u64,
}

/// Orchestrates per-partition cursors for one stream.
///
/// Starts in partitioned mode: every partition gets its own cursor, touched
/// partitions move to the most-recently-used end of the registry, and the
/// registry never holds more than `max_partitions` entries (the least
/// recently touched partition is evicted with a warning). Once the number of
/// distinct partitions ever seen crosses the fallback threshold, the stream
/// switches to a single global cursor for the remainder of the sync; the
/// switch is irreversible and loses no progress because the global cursor is
/// kept as a running upper bound in both modes.
pub struct PerPartitionCursor {
    stream_name: String,
    cursor_field: String,
    strategy: Arc<dyn CursorStrategy>,
    /// Configured stream start value (resume floor)
    start: Option<JsonValue>,
    max_partitions: usize,
    /// Distinct-partition count that triggers the global fallback;
    /// defaults to twice `max_partitions`
    fallback_threshold: Option<usize>,
    /// Registry keyed by canonical partition key
    partitions: HashMap<String, TrackedPartition>,
    /// Canonical keys of every distinct partition seen this sync,
    /// tracked or already evicted; cleared once the fallback activates
    seen_partitions: HashSet<String>,
    touch_counter: u64,
    evictions: u64,
    /// Largest step gap observed between a partition's consecutive
    /// cursor values; becomes the lookback window on fallback
    max_gap: u64,
    global: GlobalCursor,
}

impl PerPartitionCursor {
    /// Create a cursor orchestrator for one stream
    pub fn new(
        strategy: Arc<dyn CursorStrategy>,
        cursor_field: impl Into<String>,
        stream_name: impl Into<String>,
    ) -> Self {
        let global = GlobalCursor::new(Arc::clone(&strategy));
        Self {
            stream_name: stream_name.into(),
            cursor_field: cursor_field.into(),
            strategy,
            start: None,
            max_partitions: DEFAULT_MAX_PARTITIONS_NUMBER,
            fallback_threshold: None,
            partitions: HashMap::new(),
            seen_partitions: HashSet::new(),
            touch_counter: 0,
            evictions: 0,
            max_gap: 0,
            global,
        }
    }

    /// Set the configured stream start value
    #[must_use]
    pub fn with_start(mut self, start: JsonValue) -> Self {
        self.start = Some(start);
        self
    }

    /// Override the partition ceiling (primarily for tests)
    #[must_use]
    pub fn with_max_partitions(mut self, max_partitions: usize) -> Self {
        self.max_partitions = max_partitions;
        self
    }

    /// Override the distinct-partition count that triggers the global
    /// fallback (defaults to twice the partition ceiling)
    #[must_use]
    pub fn with_fallback_threshold(mut self, threshold: usize) -> Self {
        self.fallback_threshold = Some(threshold);
        self
    }

    /// The configured cursor field name
    pub fn cursor_field(&self) -> &str {
        &self.cursor_field
    }

    /// The stream this orchestrator tracks
    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Whether the stream has fallen back to the global cursor
    pub fn is_global(&self) -> bool {
        self.global.is_active()
    }

    /// Number of partitions currently tracked
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Number of partitions evicted so far this sync
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    fn effective_fallback_threshold(&self) -> usize {
        self.fallback_threshold
            .unwrap_or_else(|| self.max_partitions.saturating_mul(2))
    }

    // ========================================================================
    // Public contract
    // ========================================================================

    /// Resume point for the next request against `partition`.
    ///
    /// Partitioned mode: looks up or lazily creates the partition's cursor,
    /// marks it most recently used, and returns its request state. Global
    /// mode: every partition shares the global resume point.
    pub fn select_state(&mut self, partition: &PartitionKey) -> Result<JsonObject> {
        if !self.global.is_active() {
            self.touch(partition);
        }

        if self.global.is_active() {
            return self.global.request_state(&self.cursor_field, self.start.as_ref());
        }

        match self.partitions.get(partition.as_str()) {
            Some(entry) => Ok(entry.cursor.request_state(
                &self.cursor_field,
                self.global.value(),
                self.start.as_ref(),
            )),
            // Possible only when the ceiling is zero and the touch evicted
            // the partition it just created
            None => {
                let mut state = JsonObject::new();
                if let Some(value) = self.global.value().or(self.start.as_ref()) {
                    state.insert(self.cursor_field.clone(), value.clone());
                }
                Ok(state)
            }
        }
    }

    /// Record observation for `partition`.
    ///
    /// Records without the cursor field never advance any cursor and never
    /// fail. The global cursor is advanced in both modes so the fallback
    /// transition is always safe; in partitioned mode the partition's own
    /// cursor is advanced and touched as well. Strategy comparison failures
    /// propagate.
    pub fn observe_record(&mut self, partition: &PartitionKey, record: &JsonValue) -> Result<()> {
        let Some(value) = record.get(&self.cursor_field).cloned() else {
            return Ok(());
        };

        // Gap between a partition's consecutive cursor values feeds the
        // lookback window used after the fallback switch.
        let previous = if self.global.is_active() {
            self.global.value().cloned()
        } else {
            self.partitions
                .get(partition.as_str())
                .and_then(|entry| entry.cursor.cursor().cloned())
        };
        if let Some(previous) = previous {
            let gap = self.strategy.gap(&previous, &value)?;
            if gap > self.max_gap {
                self.max_gap = gap;
            }
        }

        self.global.observe(&value)?;

        if !self.global.is_active() {
            self.touch(partition);
            // The touch itself may have tripped the fallback
            if let Some(entry) = self.partitions.get_mut(partition.as_str()) {
                entry.cursor.observe(&value)?;
            }
        }

        Ok(())
    }

    /// Convenience wrapper over [`Self::observe_record`] for the record
    /// boundary type
    pub fn observe(&mut self, record: &Record) -> Result<()> {
        self.observe_record(&record.partition, &record.data)
    }

    /// Mark a partition as fully read. Touches the partition (running the
    /// eviction check); unknown partitions are a no-op.
    pub fn close_partition(&mut self, partition: &PartitionKey) {
        if self.global.is_active() {
            return;
        }
        if self.partitions.contains_key(partition.as_str()) {
            self.touch(partition);
        } else {
            debug!(
                "Closing untracked partition {partition} for stream '{}'",
                self.stream_name
            );
        }
    }

    /// Serialize the current state for checkpointing
    pub fn get_stream_state(&self) -> StreamState {
        let mut state = JsonObject::new();
        if let Some(value) = self.global.value() {
            state.insert(self.cursor_field.clone(), value.clone());
        }

        if self.global.is_active() {
            return StreamState {
                states: None,
                state,
                use_global_cursor: true,
                lookback_window: Some(self.global.lookback_window()),
            };
        }

        let mut tracked: Vec<&TrackedPartition> = self.partitions.values().collect();
        tracked.sort_by_key(|entry| entry.last_touched);
        let states = tracked
            .iter()
            .map(|entry| entry.cursor.to_state(&entry.key, &self.cursor_field))
            .collect();

        StreamState {
            states: Some(states),
            state,
            use_global_cursor: false,
            lookback_window: None,
        }
    }

    /// Reconstruct state persisted by a previous sync.
    ///
    /// Defensive by design: a malformed top-level shape degrades to a fresh
    /// start, malformed individual entries are skipped, and a legacy bare
    /// `{cursor_field: value}` mapping seeds the global cursor. A corrupt
    /// single partition must never block replication of the others.
    pub fn load_stream_state(&mut self, state: &JsonValue) {
        if state.is_null() {
            return;
        }
        let Some(obj) = state.as_object() else {
            warn!(
                "Malformed persisted state for stream '{}', starting fresh: {state}",
                self.stream_name
            );
            return;
        };
        if obj.is_empty() {
            return;
        }

        let recognized = obj.contains_key("states")
            || obj.contains_key("state")
            || obj.contains_key("use_global_cursor")
            || obj.contains_key("lookback_window");
        if !recognized {
            // Legacy shape: a bare cursor mapping becomes the global seed
            if let Some(value) = obj.get(&self.cursor_field) {
                self.global.set_value(value.clone());
            } else {
                warn!(
                    "Unrecognized persisted state shape for stream '{}', starting fresh",
                    self.stream_name
                );
            }
            return;
        }

        let use_global = obj
            .get("use_global_cursor")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);
        let lookback_window = obj
            .get("lookback_window")
            .and_then(JsonValue::as_u64)
            .unwrap_or(0);

        if let Some(global_state) = obj.get("state").and_then(JsonValue::as_object) {
            if let Some(value) = global_state.get(&self.cursor_field) {
                self.global.set_value(value.clone());
            }
        }
        self.global.set_lookback_window(lookback_window);

        if use_global {
            self.global.activate(lookback_window);
            return;
        }

        match obj.get("states") {
            None => {}
            Some(JsonValue::Array(entries)) => {
                for entry in entries {
                    self.load_partition_entry(entry);
                }
            }
            Some(other) => warn!(
                "Malformed 'states' for stream '{}', expected an array: {other}",
                self.stream_name
            ),
        }

        if self.seen_partitions.len() > self.effective_fallback_threshold() {
            self.activate_global_fallback();
        } else {
            self.ensure_partition_limit();
        }
    }

    // ========================================================================
    // Registry internals
    // ========================================================================

    /// Create or refresh a registry entry, making it most recently used,
    /// then enforce the ceiling and the fallback threshold
    fn touch(&mut self, partition: &PartitionKey) {
        self.touch_counter += 1;
        let seq = self.touch_counter;

        if let Some(entry) = self.partitions.get_mut(partition.as_str()) {
            entry.last_touched = seq;
        } else {
            let first_sighting = self.seen_partitions.insert(partition.as_str().to_string());
            self.partitions.insert(
                partition.as_str().to_string(),
                TrackedPartition {
                    key: partition.clone(),
                    cursor: PartitionCursor::new(Arc::clone(&self.strategy)),
                    last_touched: seq,
                },
            );
            if first_sighting && self.seen_partitions.len() > self.effective_fallback_threshold() {
                self.activate_global_fallback();
                return;
            }
        }

        self.ensure_partition_limit();
    }

    /// Evict least-recently-touched partitions until the registry fits the
    /// ceiling. Each eviction folds the dropped cursor value into the global
    /// cursor so the upper-bound invariant holds for evicted partitions too.
    fn ensure_partition_limit(&mut self) {
        while self.partitions.len() > self.max_partitions {
            let Some(oldest_key) = self
                .partitions
                .iter()
                .min_by_key(|(_, entry)| entry.last_touched)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            let over = self.partitions.len() - self.max_partitions;
            let Some(entry) = self.partitions.remove(&oldest_key) else {
                break;
            };
            self.evictions += 1;
            warn!(
                "The maximum number of partitions has been reached. \
                 Dropping the oldest partition: {oldest_key}. Over limit: {over}."
            );
            if let Some(value) = entry.cursor.cursor() {
                if let Err(err) = self.global.observe(value) {
                    warn!(
                        "Could not fold evicted partition {oldest_key} into the \
                         global cursor for stream '{}': {err}",
                        self.stream_name
                    );
                }
            }
        }
    }

    /// One-way switch to global cursor mode. Folds every live cursor value
    /// into the global cursor, sizes the lookback window from the largest
    /// observed gap, and drops the per-partition registry.
    fn activate_global_fallback(&mut self) {
        if self.global.is_active() {
            return;
        }
        info!(
            "Exceeded {} distinct partitions for stream '{}'. \
             Switching to global cursor.",
            self.effective_fallback_threshold(),
            self.stream_name
        );
        for entry in self.partitions.values() {
            if let Some(value) = entry.cursor.cursor() {
                if let Err(err) = self.global.observe(value) {
                    warn!(
                        "Could not fold partition {} into the global cursor for \
                         stream '{}': {err}",
                        entry.key, self.stream_name
                    );
                }
            }
        }
        self.partitions.clear();
        self.seen_partitions.clear();
        self.global.activate(self.max_gap);
    }

    /// Load one persisted partition entry, skipping malformed shapes
    fn load_partition_entry(&mut self, entry: &JsonValue) {
        let Some(partition) = entry.get("partition").and_then(PartitionKey::from_value) else {
            warn!(
                "Skipping malformed partition state entry for stream '{}': {entry}",
                self.stream_name
            );
            return;
        };
        let cursor_value = match entry.get("cursor") {
            None => None,
            Some(JsonValue::Object(cursor)) => cursor.get(&self.cursor_field).cloned(),
            Some(_) => {
                warn!(
                    "Skipping malformed partition state entry for stream '{}': {entry}",
                    self.stream_name
                );
                return;
            }
        };

        self.touch_counter += 1;
        let seq = self.touch_counter;

        if let Some(existing) = self.partitions.get_mut(partition.as_str()) {
            // Duplicate entry: replays resume from the minimum historical value
            existing.last_touched = seq;
            if let Some(value) = cursor_value {
                if let Err(err) = existing.cursor.seed_minimum(&value) {
                    warn!(
                        "Keeping first cursor value for duplicated partition {partition} \
                         in stream '{}': {err}",
                        self.stream_name
                    );
                }
            }
        } else {
            self.seen_partitions.insert(partition.as_str().to_string());
            let mut cursor = PartitionCursor::new(Arc::clone(&self.strategy));
            if let Some(value) = cursor_value {
                cursor = cursor.with_cursor(value);
            }
            self.partitions.insert(
                partition.as_str().to_string(),
                TrackedPartition {
                    key: partition,
                    cursor,
                    last_touched: seq,
                },
            );
        }
    }
}

impl std::fmt::Debug for PerPartitionCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerPartitionCursor")
            .field("stream_name", &self.stream_name)
            .field("cursor_field", &self.cursor_field)
            .field("partition_count", &self.partitions.len())
            .field("use_global_cursor", &self.global.is_active())
            .finish_non_exhaustive()
    }
}
