//! State management module
//!
//! Handles checkpointing and resumability. State is persisted between sync
//! runs so incremental streams resume from their cursors instead of
//! re-reading everything.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Connector-level state keyed by stream, raw JSON per stream
//! - `StreamState` / `PartitionStateEntry` - The serialized incremental shape
//! - `StateManager` - File-based state persistence with atomic writes

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{PartitionStateEntry, State, StreamState};
