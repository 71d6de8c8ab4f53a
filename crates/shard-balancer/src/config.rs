//! Configuration for the rebalancer

use serde::{Deserialize, Serialize};

/// Configuration for [`Rebalancer`](crate::Rebalancer)
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalancerConfig {
    /// What to do with shards that no member group owns
    pub orphan_policy: OrphanPolicy,
}

impl RebalancerConfig {
    /// Sets the orphan policy.
    #[must_use]
    pub const fn with_orphan_policy(mut self, orphan_policy: OrphanPolicy) -> Self {
        self.orphan_policy = orphan_policy;
        self
    }
}

/// Handling of orphaned shards: shards that are unowned, or owned by a group
/// that is no longer a member of the configuration
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Fail the rebalance
    #[default]
    Reject,
    /// Hand orphaned shards to member groups as part of the rebalance
    Reassign,
}
