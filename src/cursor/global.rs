//! Global fallback cursor
//!
//! A single stream-wide upper bound over every cursor value the sync has
//! seen, kept current in both modes so switching to global tracking mid-sync
//! never loses progress.

use super::strategy::CursorStrategy;
use crate::error::Result;
use crate::types::{JsonObject, JsonValue};
use std::cmp::Ordering;
use std::sync::Arc;

/// Stream-wide monotonic max cursor with a lookback window.
///
/// Dormant until `activate` flips it on; activation is one-way for the
/// remainder of the sync.
#[derive(Clone)]
pub struct GlobalCursor {
    strategy: Arc<dyn CursorStrategy>,
    value: Option<JsonValue>,
    active: bool,
    lookback_window: u64,
}

impl GlobalCursor {
    /// Create a dormant global cursor with no value
    pub fn new(strategy: Arc<dyn CursorStrategy>) -> Self {
        Self {
            strategy,
            value: None,
            active: false,
            lookback_window: 0,
        }
    }

    /// The stored value, if any
    pub fn value(&self) -> Option<&JsonValue> {
        self.value.as_ref()
    }

    /// Whether the fallback has been activated for this sync
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The recorded lookback window, in strategy steps
    pub fn lookback_window(&self) -> u64 {
        self.lookback_window
    }

    /// Overwrite the stored value without comparing (state loading only)
    pub fn set_value(&mut self, value: JsonValue) {
        self.value = Some(value);
    }

    /// Overwrite the lookback window (state loading only)
    pub fn set_lookback_window(&mut self, lookback_window: u64) {
        self.lookback_window = lookback_window;
    }

    /// Advance the stored value if `value` is strictly greater (monotonic
    /// max). Returns whether the value moved.
    pub fn observe(&mut self, value: &JsonValue) -> Result<bool> {
        match &self.value {
            None => {
                self.value = Some(value.clone());
                Ok(true)
            }
            Some(current) => {
                if self.strategy.compare(value, current)? == Ordering::Greater {
                    self.value = Some(value.clone());
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }

    /// Activate the fallback with the given lookback window. Sticky for the
    /// remainder of the sync; re-activation keeps the wider window.
    pub fn activate(&mut self, lookback_window: u64) {
        self.active = true;
        self.lookback_window = self.lookback_window.max(lookback_window);
    }

    /// Resume point once active: the stored value stepped back by the
    /// lookback window, clamped to the configured start value (never
    /// earlier). An empty mapping while no value has been observed.
    pub fn request_state(
        &self,
        cursor_field: &str,
        start: Option<&JsonValue>,
    ) -> Result<JsonObject> {
        let mut state = JsonObject::new();

        let Some(value) = self.value.as_ref().or(start) else {
            return Ok(state);
        };

        let mut resume = if self.lookback_window > 0 {
            self.strategy.step_back(value, self.lookback_window)?
        } else {
            value.clone()
        };

        if let Some(start) = start {
            if self.strategy.compare(&resume, start)? == Ordering::Less {
                resume = start.clone();
            }
        }

        state.insert(cursor_field.to_string(), resume);
        Ok(state)
    }
}

impl std::fmt::Debug for GlobalCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalCursor")
            .field("value", &self.value)
            .field("active", &self.active)
            .field("lookback_window", &self.lookback_window)
            .finish_non_exhaustive()
    }
}
