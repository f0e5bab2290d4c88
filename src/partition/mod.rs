//! Partition keys and routing
//!
//! # Overview
//!
//! A partition is a subset of a stream's records sharing a common slicing
//! key (one customer, one site URL, one parent record). This module provides:
//! - `PartitionKey` - canonical, order-independent partition identity
//! - `PartitionRouter` - the slice-producer boundary trait
//! - `ListRouter` / `ParentRouter` - routing from a static list or from
//!   parent stream records (substreams)

mod routers;
mod types;

pub use routers::{ListRouter, ParentRouter, PartitionRouter};
pub use types::{canonical_json, PartitionKey};
