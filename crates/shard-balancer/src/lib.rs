//! Movement-minimal shard rebalancing for sharded storage clusters
//!
//! This crate provides:
//! - Shard assignment snapshots (`ShardConfig`) with join/leave helpers
//! - Conversions between array-form and group-form assignments
//! - A rebalancer that balances shards across groups with the fewest moves
//!
//! Given `N` shards over `G` groups, a balanced assignment gives every group
//! `N / G` or `ceil(N / G)` shards. The rebalancer only moves shards off
//! groups above their final count onto groups below it, so the number of
//! moves is the smallest possible.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod classifier;
pub mod codec;
pub mod config;
pub mod error;
pub mod group_id;
pub mod rebalancer;
pub mod snapshot;
pub mod transfer;

pub use classifier::{BalanceBounds, Classification, Standing, classify};
pub use codec::GroupForm;
pub use config::{OrphanPolicy, RebalancerConfig};
pub use error::{Error, Result};
pub use group_id::GroupId;
pub use rebalancer::{RebalanceOutcome, Rebalancer, is_balanced, minimum_movements, rebalance};
pub use snapshot::{ShardConfig, ShardId, ShardMove};
pub use transfer::TransferEngine;
