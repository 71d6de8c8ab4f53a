//! Error types for shard rebalancing

use thiserror::Error;

use crate::group_id::GroupId;
use crate::snapshot::ShardId;

/// Result type for shard balancer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rebalancing shards
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The group set is empty, so no balanced split exists
    #[error("Cannot balance shards across zero groups")]
    InvalidGroupCount,

    /// A shard has no owning group
    #[error("Shard {shard} is not owned by any group")]
    UnownedShard {
        /// The unowned shard
        shard: ShardId,
    },

    /// A shard is owned by a group that is not part of the configuration
    #[error("Shard {shard} is owned by {group}, which is not a member of the configuration")]
    UnknownGroup {
        /// The orphaned shard
        shard: ShardId,
        /// The group it still points at
        group: GroupId,
    },

    /// A shard id lies outside the configured shard range
    #[error("Shard {shard} is out of range for {shard_count} shards")]
    ShardOutOfRange {
        /// The offending shard id
        shard: ShardId,
        /// Number of shards in the configuration
        shard_count: usize,
    },

    /// Two snapshots with different shard counts were compared
    #[error("Shard count mismatch: {left} vs {right}")]
    ShardCountMismatch {
        /// Shard count of the first snapshot
        left: usize,
        /// Shard count of the second snapshot
        right: usize,
    },
}
