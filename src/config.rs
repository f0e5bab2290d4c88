//! Configuration types for incremental streams
//!
//! Declarative configuration for building a [`PerPartitionCursor`], loadable
//! from YAML or JSON.

use crate::cursor::{
    parse_duration, CursorStrategy, DatetimeStrategy, LexicographicStrategy, NumericStrategy,
    PerPartitionCursor, DEFAULT_MAX_PARTITIONS_NUMBER,
};
use crate::error::{Error, Result};
use crate::types::{CursorFormat, JsonValue, SyncMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Incremental sync configuration for one stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementalConfig {
    /// Record field holding the cursor value
    pub cursor_field: String,

    /// Sync mode (must be incremental for cursor tracking)
    #[serde(default = "default_sync_mode")]
    pub sync_mode: SyncMode,

    /// How cursor values compare
    #[serde(default)]
    pub format: CursorFormat,

    /// Cursor step size for datetime cursors (e.g. "1d", "2h", "30m")
    #[serde(default = "default_granularity")]
    pub granularity: String,

    /// Render format for stepped-back datetime values
    #[serde(default)]
    pub output_format: Option<String>,

    /// Configured stream start value
    #[serde(default)]
    pub start: Option<JsonValue>,

    /// Ceiling on concurrently tracked partitions
    #[serde(default = "default_max_partitions")]
    pub max_partitions: usize,

    /// Distinct-partition count that triggers the global fallback;
    /// defaults to twice `max_partitions`
    #[serde(default)]
    pub fallback_threshold: Option<usize>,
}

fn default_sync_mode() -> SyncMode {
    SyncMode::Incremental
}

fn default_granularity() -> String {
    "1d".to_string()
}

fn default_max_partitions() -> usize {
    DEFAULT_MAX_PARTITIONS_NUMBER
}

impl IncrementalConfig {
    /// Load from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.cursor_field.is_empty() {
            return Err(Error::missing_field("cursor_field"));
        }
        if self.sync_mode != SyncMode::Incremental {
            return Err(Error::config(
                "Cursor tracking requires sync_mode: incremental",
            ));
        }
        if self.max_partitions == 0 {
            return Err(Error::InvalidConfigValue {
                field: "max_partitions".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.format == CursorFormat::Iso8601 {
            parse_duration(&self.granularity).map_err(|e| Error::InvalidConfigValue {
                field: "granularity".to_string(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Build the cursor strategy selected by `format`
    pub fn strategy(&self) -> Result<Arc<dyn CursorStrategy>> {
        Ok(match self.format {
            CursorFormat::Iso8601 => {
                let granularity = parse_duration(&self.granularity)?;
                let output_format = self
                    .output_format
                    .clone()
                    .unwrap_or_else(|| "%Y-%m-%dT%H:%M:%SZ".to_string());
                Arc::new(DatetimeStrategy::new(output_format, granularity))
            }
            CursorFormat::Unix | CursorFormat::UnixMs => Arc::new(NumericStrategy),
            CursorFormat::String => Arc::new(LexicographicStrategy),
        })
    }

    /// Build a per-partition cursor for a stream from this configuration
    pub fn build(&self, stream_name: impl Into<String>) -> Result<PerPartitionCursor> {
        self.validate()?;
        let mut cursor =
            PerPartitionCursor::new(self.strategy()?, self.cursor_field.as_str(), stream_name)
                .with_max_partitions(self.max_partitions);
        if let Some(start) = &self.start {
            cursor = cursor.with_start(start.clone());
        }
        if let Some(threshold) = self.fallback_threshold {
            cursor = cursor.with_fallback_threshold(threshold);
        }
        Ok(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ========================================================================
    // Parsing Tests
    // ========================================================================

    #[test]
    fn test_from_yaml_minimal() {
        let config = IncrementalConfig::from_yaml_str("cursor_field: updated_at").unwrap();
        assert_eq!(config.cursor_field, "updated_at");
        assert_eq!(config.sync_mode, SyncMode::Incremental);
        assert_eq!(config.format, CursorFormat::Iso8601);
        assert_eq!(config.granularity, "1d");
        assert_eq!(config.max_partitions, DEFAULT_MAX_PARTITIONS_NUMBER);
        assert!(config.fallback_threshold.is_none());
    }

    #[test]
    fn test_from_yaml_full() {
        let yaml = r#"
cursor_field: updated_at
format: iso8601
granularity: 1d
output_format: "%Y-%m-%d"
start: "2021-01-01"
max_partitions: 500
fallback_threshold: 1000
"#;
        let config = IncrementalConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.start, Some(json!("2021-01-01")));
        assert_eq!(config.max_partitions, 500);
        assert_eq!(config.fallback_threshold, Some(1000));
    }

    #[test]
    fn test_from_json() {
        let config = IncrementalConfig::from_json_str(
            r#"{"cursor_field": "id", "format": "unix"}"#,
        )
        .unwrap();
        assert_eq!(config.format, CursorFormat::Unix);
    }

    // ========================================================================
    // Validation Tests
    // ========================================================================

    #[test]
    fn test_empty_cursor_field_rejected() {
        let result = IncrementalConfig::from_yaml_str("cursor_field: \"\"");
        assert!(matches!(
            result,
            Err(Error::MissingConfigField { ref field }) if field == "cursor_field"
        ));
    }

    #[test]
    fn test_full_refresh_rejected() {
        let result = IncrementalConfig::from_yaml_str(
            "cursor_field: updated_at\nsync_mode: full_refresh",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_max_partitions_rejected() {
        let result =
            IncrementalConfig::from_yaml_str("cursor_field: updated_at\nmax_partitions: 0");
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_granularity_rejected() {
        let result =
            IncrementalConfig::from_yaml_str("cursor_field: updated_at\ngranularity: soon");
        assert!(result.is_err());
    }

    // ========================================================================
    // Build Tests
    // ========================================================================

    #[test]
    fn test_build_cursor() {
        let config = IncrementalConfig::from_yaml_str(
            "cursor_field: updated_at\nmax_partitions: 25\nstart: \"2021-01-01\"",
        )
        .unwrap();

        let cursor = config.build("users").unwrap();
        assert_eq!(cursor.stream_name(), "users");
        assert_eq!(cursor.cursor_field(), "updated_at");
        assert!(!cursor.is_global());
    }

    #[test]
    fn test_build_string_format_cursor() {
        let config =
            IncrementalConfig::from_json_str(r#"{"cursor_field": "token", "format": "string"}"#)
                .unwrap();
        assert!(config.build("events").is_ok());
    }
}
