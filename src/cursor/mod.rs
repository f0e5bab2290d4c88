//! Incremental cursor tracking
//!
//! Cursors record how far a stream has been replicated so the next sync can
//! resume instead of re-reading everything. The module is layered bottom-up:
//! [`CursorStrategy`] gives cursor values an ordering, [`PartitionCursor`]
//! tracks one partition's watermark, [`GlobalCursor`] keeps a stream-wide
//! upper bound, and [`PerPartitionCursor`] orchestrates all of them with
//! bounded memory.

mod global;
mod partition_cursor;
mod per_partition;
mod strategy;

pub use global::GlobalCursor;
pub use partition_cursor::PartitionCursor;
pub use per_partition::{PerPartitionCursor, DEFAULT_MAX_PARTITIONS_NUMBER};
pub use strategy::{
    parse_datetime, parse_duration, CursorStrategy, DatetimeStrategy, LexicographicStrategy,
    NumericStrategy,
};
