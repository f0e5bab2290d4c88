// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::needless_pass_by_value)]

//! # streamstate
//!
//! Incremental cursor tracking for partitioned data streams.
//!
//! Streams sliced into partitions (one per parent record, per list value,
//! per date window) each need their own replication watermark, but partition
//! cardinality in the wild is unbounded. This crate keeps one cursor per
//! partition inside a bounded LRU registry and degrades gracefully to a
//! single stream-wide cursor with a lookback window when the partition space
//! explodes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use streamstate::config::IncrementalConfig;
//! use streamstate::state::StateManager;
//!
//! #[tokio::main]
//! async fn main() -> streamstate::Result<()> {
//!     let config = IncrementalConfig::from_yaml_str("cursor_field: updated_at")?;
//!     let mut cursor = config.build("users")?;
//!
//!     let manager = StateManager::from_file("state.json")?;
//!     manager.restore_cursor(&mut cursor).await;
//!
//!     for partition in partitions {
//!         let request_state = cursor.select_state(&partition)?;
//!         for record in read(&partition, &request_state) {
//!             cursor.observe_record(&partition, &record)?;
//!         }
//!         cursor.close_partition(&partition);
//!     }
//!
//!     manager.checkpoint_cursor(&cursor).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PerPartitionCursor                       │
//! │  select_state()   observe_record()   close_partition()     │
//! │  get_stream_state()            load_stream_state()          │
//! └─────────────────────────────────────────────────────────────┘
//!          │                   │                    │
//! ┌────────┴───────┐ ┌─────────┴────────┐ ┌─────────┴─────────┐
//! │ PartitionCursor│ │   GlobalCursor   │ │   StateManager    │
//! │ one watermark  │ │ stream-wide max  │ │ atomic file save  │
//! │ per partition  │ │ + lookback       │ │ + restore         │
//! └────────────────┘ └──────────────────┘ └───────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Partition keys and routing
pub mod partition;

/// Per-partition and global cursor tracking
pub mod cursor;

/// State management and checkpointing
pub mod state;

/// Declarative incremental configuration
pub mod config;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::IncrementalConfig;
pub use cursor::{PerPartitionCursor, DEFAULT_MAX_PARTITIONS_NUMBER};
pub use partition::PartitionKey;
pub use state::{StateManager, StreamState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
