//! Cursor value strategies
//!
//! A `CursorStrategy` supplies the comparison and stepping semantics for
//! cursor values. Cursor values themselves stay raw `serde_json::Value`s so
//! that serialized state round-trips byte-for-byte; the strategy only parses
//! them when comparing or stepping.

use crate::error::{Error, Result};
use crate::types::JsonValue;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use std::cmp::Ordering;

/// Comparison and stepping semantics for cursor values.
///
/// `gap` and `step_back` express distances in whole strategy steps: the
/// configured granularity for datetimes, integral deltas for numbers. The
/// orchestrator uses them to size and apply the lookback window.
pub trait CursorStrategy: Send + Sync {
    /// Compare two cursor values
    fn compare(&self, left: &JsonValue, right: &JsonValue) -> Result<Ordering>;

    /// Whole steps separating two values (0 when `later` <= `earlier`)
    fn gap(&self, earlier: &JsonValue, later: &JsonValue) -> Result<u64>;

    /// Step a value backward by `steps` (for the lookback window)
    fn step_back(&self, value: &JsonValue, steps: u64) -> Result<JsonValue>;
}

// ============================================================================
// Datetime Strategy
// ============================================================================

/// Datetime cursor strategy
///
/// Accepts RFC 3339 strings, several common datetime/date formats, and unix
/// epoch numbers. One step is one `granularity` interval; stepped values are
/// rendered with `output_format`.
#[derive(Debug, Clone)]
pub struct DatetimeStrategy {
    /// Format used to render stepped-back values
    output_format: String,
    /// Size of one step
    granularity: Duration,
}

impl Default for DatetimeStrategy {
    fn default() -> Self {
        Self {
            output_format: "%Y-%m-%dT%H:%M:%SZ".to_string(),
            granularity: Duration::seconds(1),
        }
    }
}

impl DatetimeStrategy {
    /// Create a strategy with an output format and step granularity
    pub fn new(output_format: impl Into<String>, granularity: Duration) -> Self {
        Self {
            output_format: output_format.into(),
            granularity,
        }
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, output_format: impl Into<String>) -> Self {
        self.output_format = output_format.into();
        self
    }

    /// Set the step granularity
    #[must_use]
    pub fn with_granularity(mut self, granularity: Duration) -> Self {
        self.granularity = granularity;
        self
    }

    fn parse(&self, value: &JsonValue) -> Result<DateTime<Utc>> {
        match value {
            JsonValue::String(s) => parse_datetime(s),
            JsonValue::Number(n) => {
                let secs = n
                    .as_i64()
                    .ok_or_else(|| Error::cursor(format!("Invalid epoch cursor value: {n}")))?;
                DateTime::from_timestamp(secs, 0)
                    .ok_or_else(|| Error::cursor(format!("Epoch out of range: {secs}")))
            }
            other => Err(Error::cursor(format!(
                "Expected datetime cursor value, got: {other}"
            ))),
        }
    }

    fn step_seconds(&self) -> Result<i64> {
        let secs = self.granularity.num_seconds();
        if secs <= 0 {
            return Err(Error::cursor("Cursor granularity must be positive"));
        }
        Ok(secs)
    }
}

impl CursorStrategy for DatetimeStrategy {
    fn compare(&self, left: &JsonValue, right: &JsonValue) -> Result<Ordering> {
        Ok(self.parse(left)?.cmp(&self.parse(right)?))
    }

    fn gap(&self, earlier: &JsonValue, later: &JsonValue) -> Result<u64> {
        let delta = self.parse(later)? - self.parse(earlier)?;
        let secs = delta.num_seconds();
        if secs <= 0 {
            return Ok(0);
        }
        let step = self.step_seconds()?;
        // Ceiling so a partial step still backs off far enough
        Ok(((secs + step - 1) / step) as u64)
    }

    fn step_back(&self, value: &JsonValue, steps: u64) -> Result<JsonValue> {
        let dt = self.parse(value)?;
        let step = self.step_seconds()?;
        let offset = Duration::seconds(step.saturating_mul(steps as i64));
        let stepped = dt - offset;
        Ok(JsonValue::String(
            stepped.format(&self.output_format).to_string(),
        ))
    }
}

// ============================================================================
// Numeric Strategy
// ============================================================================

/// Numeric cursor strategy (integer ids, epoch counters, versions)
///
/// Compares integers exactly and falls back to floats; one step is one unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericStrategy;

impl NumericStrategy {
    fn parse(value: &JsonValue) -> Result<f64> {
        match value {
            JsonValue::Number(n) => n
                .as_f64()
                .ok_or_else(|| Error::cursor(format!("Invalid numeric cursor value: {n}"))),
            JsonValue::String(s) => s
                .parse::<f64>()
                .map_err(|_| Error::cursor(format!("Invalid numeric cursor value: {s:?}"))),
            other => Err(Error::cursor(format!(
                "Expected numeric cursor value, got: {other}"
            ))),
        }
    }
}

impl CursorStrategy for NumericStrategy {
    fn compare(&self, left: &JsonValue, right: &JsonValue) -> Result<Ordering> {
        // Exact path for integers, lossy path for floats
        if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
            return Ok(l.cmp(&r));
        }
        let (l, r) = (Self::parse(left)?, Self::parse(right)?);
        l.partial_cmp(&r)
            .ok_or_else(|| Error::cursor(format!("Incomparable cursor values: {left} and {right}")))
    }

    fn gap(&self, earlier: &JsonValue, later: &JsonValue) -> Result<u64> {
        let delta = Self::parse(later)? - Self::parse(earlier)?;
        if delta <= 0.0 {
            return Ok(0);
        }
        Ok(delta.ceil() as u64)
    }

    fn step_back(&self, value: &JsonValue, steps: u64) -> Result<JsonValue> {
        if let Some(v) = value.as_i64() {
            return Ok(JsonValue::from(v.saturating_sub(steps as i64)));
        }
        let v = Self::parse(value)?;
        Ok(JsonValue::from(v - steps as f64))
    }
}

// ============================================================================
// Lexicographic Strategy
// ============================================================================

/// Opaque string cursor strategy
///
/// Compares strings lexicographically. Opaque cursors cannot be stepped, so
/// the lookback window degenerates to a no-op: `gap` is always 0 and
/// `step_back` returns the value unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicographicStrategy;

impl LexicographicStrategy {
    fn parse<'a>(value: &'a JsonValue) -> Result<&'a str> {
        value
            .as_str()
            .ok_or_else(|| Error::cursor(format!("Expected string cursor value, got: {value}")))
    }
}

impl CursorStrategy for LexicographicStrategy {
    fn compare(&self, left: &JsonValue, right: &JsonValue) -> Result<Ordering> {
        Ok(Self::parse(left)?.cmp(Self::parse(right)?))
    }

    fn gap(&self, _earlier: &JsonValue, _later: &JsonValue) -> Result<u64> {
        Ok(0)
    }

    fn step_back(&self, value: &JsonValue, _steps: u64) -> Result<JsonValue> {
        Ok(value.clone())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse a datetime string into UTC DateTime
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    // Try RFC 3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try common formats
    let formats = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d",
        "%Y/%m/%d",
    ];

    for fmt in formats {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(DateTime::from_naive_utc_and_offset(ndt, Utc));
        }
        if let Ok(nd) = NaiveDate::parse_from_str(s, fmt) {
            let ndt = nd.and_hms_opt(0, 0, 0).unwrap_or_default();
            return Ok(DateTime::from_naive_utc_and_offset(ndt, Utc));
        }
    }

    Err(Error::cursor(format!("Invalid datetime format: {s}")))
}

/// Parse a duration string like "1d", "2h", "30m"
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    let (num_str, suffix) = if let Some(stripped) = s.strip_suffix('d') {
        (stripped, 'd')
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, 'h')
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 'm')
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, 's')
    } else if let Some(stripped) = s.strip_suffix('w') {
        (stripped, 'w')
    } else {
        // Assume days if no suffix
        (s, 'd')
    };

    let num: i64 = num_str
        .parse()
        .map_err(|_| Error::config(format!("Invalid duration number: {num_str}")))?;

    let duration = match suffix {
        'w' => Duration::weeks(num),
        'd' => Duration::days(num),
        'h' => Duration::hours(num),
        'm' => Duration::minutes(num),
        's' => Duration::seconds(num),
        _ => return Err(Error::config(format!("Invalid duration suffix: {suffix}"))),
    };

    Ok(duration)
}
