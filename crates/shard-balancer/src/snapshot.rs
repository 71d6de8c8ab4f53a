//! Immutable shard assignment snapshots
//!
//! A [`ShardConfig`] pairs the array-form assignment (`shards[s]` is the owner
//! of shard `s`) with the group membership map (`gid -> servers`). Snapshots
//! are plain owned values: cloning one yields a fully independent copy, and
//! every "mutating" helper here returns a new snapshot instead.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::{self, GroupForm};
use crate::error::{Error, Result};
use crate::group_id::GroupId;

/// Index of a shard in `[0, shard_count)`
pub type ShardId = usize;

/// A shard assignment together with the group membership it refers to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardConfig {
    /// Owner of each shard; `None` marks a shard no group owns yet
    pub shards: Vec<Option<GroupId>>,
    /// Member groups and their server addresses
    pub groups: BTreeMap<GroupId, Vec<String>>,
}

impl ShardConfig {
    /// Creates a snapshot with `shard_count` unowned shards and no groups.
    #[must_use]
    pub fn new(shard_count: usize) -> Self {
        Self {
            shards: vec![None; shard_count],
            groups: BTreeMap::new(),
        }
    }

    /// Creates a snapshot from a group-form assignment.
    ///
    /// Every key of `form` becomes a member group with an empty server list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShardOutOfRange`] if `form` names a shard outside
    /// `[0, shard_count)`.
    pub fn from_group_form(shard_count: usize, form: &GroupForm) -> Result<Self> {
        Ok(Self {
            shards: codec::to_array_form(form, shard_count)?,
            groups: form.keys().map(|&gid| (gid, Vec::new())).collect(),
        })
    }

    /// Returns a copy with `group` added as a member (or its servers replaced).
    #[must_use]
    pub fn with_group(&self, group: GroupId, servers: Vec<String>) -> Self {
        let mut next = self.clone();
        next.groups.insert(group, servers);
        next
    }

    /// Returns a copy with `group` removed from the membership.
    ///
    /// Shards owned by `group` keep pointing at it and are orphaned until the
    /// next rebalance reassigns them.
    #[must_use]
    pub fn without_group(&self, group: GroupId) -> Self {
        let mut next = self.clone();
        next.groups.remove(&group);
        next
    }

    /// Number of shards in the assignment.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Number of member groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Owner of `shard`, if it is in range and owned.
    #[must_use]
    pub fn owner(&self, shard: ShardId) -> Option<GroupId> {
        self.shards.get(shard).copied().flatten()
    }

    /// Shards recorded as owned by `group`, in ascending order.
    #[must_use]
    pub fn shards_of(&self, group: GroupId) -> Vec<ShardId> {
        self.shards
            .iter()
            .enumerate()
            .filter(|(_, owner)| **owner == Some(group))
            .map(|(shard, _)| shard)
            .collect()
    }

    /// Shard count per member group, including members that own nothing.
    #[must_use]
    pub fn shard_counts(&self) -> BTreeMap<GroupId, usize> {
        let mut counts: BTreeMap<GroupId, usize> =
            self.groups.keys().map(|&gid| (gid, 0)).collect();
        for owner in self.shards.iter().flatten() {
            if let Some(count) = counts.get_mut(owner) {
                *count += 1;
            }
        }
        counts
    }

    /// Shards that are unowned or owned by a group outside the membership.
    #[must_use]
    pub fn orphaned_shards(&self) -> Vec<ShardId> {
        self.shards
            .iter()
            .enumerate()
            .filter(|(_, owner)| owner.is_none_or(|gid| !self.groups.contains_key(&gid)))
            .map(|(shard, _)| shard)
            .collect()
    }

    /// Lists every shard whose owner differs between `self` and `other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShardCountMismatch`] if the snapshots hold a different
    /// number of shards.
    pub fn movements(&self, other: &Self) -> Result<Vec<ShardMove>> {
        if self.shard_count() != other.shard_count() {
            return Err(Error::ShardCountMismatch {
                left: self.shard_count(),
                right: other.shard_count(),
            });
        }

        Ok(self
            .shards
            .iter()
            .zip(&other.shards)
            .enumerate()
            .filter(|(_, (from, to))| from != to)
            .map(|(shard, (&from, &to))| ShardMove { shard, from, to })
            .collect())
    }
}

/// A single shard changing owner between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardMove {
    /// The shard being moved
    pub shard: ShardId,
    /// Previous owner
    pub from: Option<GroupId>,
    /// New owner
    pub to: Option<GroupId>,
}

impl fmt::Display for ShardMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn side(owner: Option<GroupId>) -> String {
            owner.map_or_else(|| "unowned".to_string(), |gid| gid.to_string())
        }

        write!(
            f,
            "shard {}: {} -> {}",
            self.shard,
            side(self.from),
            side(self.to)
        )
    }
}
