//! Classification of groups by how many shards they hold
//!
//! With `N` shards over `G` groups every group must end up holding `min = N / G`
//! or `max = ceil(N / G)` shards. A group's [`Standing`] is derived from its
//! current shard count alone, so a group that gains or loses shards moves
//! between buckets without any bookkeeping.

use serde::{Deserialize, Serialize};

use crate::codec::GroupForm;
use crate::error::{Error, Result};
use crate::group_id::GroupId;

/// Per-group shard count limits of a balanced assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceBounds {
    /// Fewest shards any group may hold
    pub min: usize,
    /// Most shards any group may hold
    pub max: usize,
    /// Number of groups that must hold `max` when `max > min`
    pub heavy: usize,
}

impl BalanceBounds {
    /// Computes the bounds for `shard_count` shards over `group_count` groups.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGroupCount`] if `group_count` is zero.
    pub const fn new(shard_count: usize, group_count: usize) -> Result<Self> {
        if group_count == 0 {
            return Err(Error::InvalidGroupCount);
        }

        let min = shard_count / group_count;
        let heavy = shard_count % group_count;
        let max = if heavy == 0 { min } else { min + 1 };

        Ok(Self { min, max, heavy })
    }

    /// Whether a group holding `count` shards is balance-legal.
    #[must_use]
    pub const fn admits(&self, count: usize) -> bool {
        count >= self.min && count <= self.max
    }
}

/// Where a group stands relative to the balance bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Standing {
    /// Holds more than `max`; must shed shards
    PrimaryDonor,
    /// Holds more than `min` but no more than `max`; may shed down to `min`
    SecondaryDonor,
    /// Holds fewer than `min`; must receive shards
    Recipient,
    /// Holds exactly `min`; can absorb shards up to `max`
    Spare,
}

impl Standing {
    /// Standing of a group holding `count` shards.
    #[must_use]
    pub const fn of(count: usize, bounds: BalanceBounds) -> Self {
        if count > bounds.max {
            Self::PrimaryDonor
        } else if count > bounds.min {
            Self::SecondaryDonor
        } else if count < bounds.min {
            Self::Recipient
        } else {
            Self::Spare
        }
    }
}

/// Groups bucketed by standing, each bucket in ascending group id order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Groups above `max`
    pub primary_donors: Vec<GroupId>,
    /// Groups in `(min, max]`
    pub secondary_donors: Vec<GroupId>,
    /// Groups below `min`
    pub recipients: Vec<GroupId>,
    /// Groups at exactly `min`
    pub spares: Vec<GroupId>,
}

impl Classification {
    /// The bucket holding groups of the given standing.
    #[must_use]
    pub fn bucket(&self, standing: Standing) -> &[GroupId] {
        match standing {
            Standing::PrimaryDonor => &self.primary_donors,
            Standing::SecondaryDonor => &self.secondary_donors,
            Standing::Recipient => &self.recipients,
            Standing::Spare => &self.spares,
        }
    }

    /// Whether every group already holds a balance-legal shard count.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.primary_donors.is_empty() && self.recipients.is_empty()
    }
}

/// Buckets every group of `form` by its current shard count.
#[must_use]
pub fn classify(form: &GroupForm, bounds: BalanceBounds) -> Classification {
    let mut classification = Classification::default();

    for (&gid, shards) in form {
        let bucket = match Standing::of(shards.len(), bounds) {
            Standing::PrimaryDonor => &mut classification.primary_donors,
            Standing::SecondaryDonor => &mut classification.secondary_donors,
            Standing::Recipient => &mut classification.recipients,
            Standing::Spare => &mut classification.spares,
        };
        bucket.push(gid);
    }

    classification
}
