//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs. Stream
//! entries in [`State`] stay raw JSON on purpose: state written by older
//! versions (or corrupted by hand) must load without failing the whole file,
//! and the shape-tolerant decoding lives in the cursor layer.

use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Complete state for a connector
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    /// Per-stream state, kept as raw JSON until a cursor decodes it
    #[serde(default)]
    pub streams: HashMap<String, JsonValue>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get raw state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&JsonValue> {
        self.streams.get(stream)
    }

    /// Replace state for a stream
    pub fn set_stream(&mut self, stream: impl Into<String>, state: JsonValue) {
        self.streams.insert(stream.into(), state);
    }
}

/// Serialized incremental state for one stream.
///
/// Partitioned mode carries `states` ordered oldest-touched first and
/// `use_global_cursor: false`; global mode carries only the stream-wide
/// `state` plus the `lookback_window`. The stream-wide `state` mapping is
/// present in both modes once a cursor value has been observed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamState {
    /// Per-partition entries, least recently touched first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<Vec<PartitionStateEntry>>,

    /// Stream-wide cursor mapping, omitted while empty
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub state: JsonObject,

    /// Whether the stream has switched to global cursor tracking
    #[serde(default)]
    pub use_global_cursor: bool,

    /// Lookback window in cursor steps, global mode only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookback_window: Option<u64>,
}

impl StreamState {
    /// Create a new empty stream state
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize to a raw JSON value for storage in [`State`]
    pub fn to_value(&self) -> crate::error::Result<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }
}

/// One partition's entry in the serialized `states` list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionStateEntry {
    /// The partition key fields
    #[serde(default)]
    pub partition: JsonObject,

    /// The partition's cursor mapping, empty when nothing was observed
    #[serde(default)]
    pub cursor: JsonObject,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_default() {
        let state = State::new();
        assert!(state.streams.is_empty());
    }

    #[test]
    fn test_state_stream_round_trip() {
        let mut state = State::new();
        state.set_stream("users", json!({"use_global_cursor": false}));

        let serialized = serde_json::to_string(&state).unwrap();
        let restored: State = serde_json::from_str(&serialized).unwrap();

        assert_eq!(
            restored.get_stream("users"),
            Some(&json!({"use_global_cursor": false}))
        );
    }

    #[test]
    fn test_stream_state_partitioned_shape() {
        let stream = StreamState {
            states: Some(vec![PartitionStateEntry {
                partition: json!({"partition_field": "1"})
                    .as_object()
                    .unwrap()
                    .clone(),
                cursor: json!({"updated_at": "2022-01-15"})
                    .as_object()
                    .unwrap()
                    .clone(),
            }]),
            state: JsonObject::new(),
            use_global_cursor: false,
            lookback_window: None,
        };

        let serialized = serde_json::to_value(&stream).unwrap();
        assert_eq!(
            serialized,
            json!({
                "states": [
                    {
                        "partition": {"partition_field": "1"},
                        "cursor": {"updated_at": "2022-01-15"}
                    }
                ],
                "use_global_cursor": false
            })
        );
    }

    #[test]
    fn test_stream_state_global_shape() {
        let mut state = JsonObject::new();
        state.insert("updated_at".to_string(), json!("2022-02-19"));

        let stream = StreamState {
            states: None,
            state,
            use_global_cursor: true,
            lookback_window: Some(1),
        };

        let serialized = serde_json::to_value(&stream).unwrap();
        assert_eq!(
            serialized,
            json!({
                "state": {"updated_at": "2022-02-19"},
                "use_global_cursor": true,
                "lookback_window": 1
            })
        );
    }

    #[test]
    fn test_stream_state_deserialize_defaults() {
        let stream: StreamState = serde_json::from_value(json!({})).unwrap();
        assert!(stream.states.is_none());
        assert!(stream.state.is_empty());
        assert!(!stream.use_global_cursor);
        assert!(stream.lookback_window.is_none());
    }
}
