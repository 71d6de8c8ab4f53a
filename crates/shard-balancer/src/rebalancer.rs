//! Movement-minimal shard rebalancing
//!
//! The rebalancer takes a snapshot, converts its assignment to group form,
//! runs the [`TransferEngine`] and returns a fresh snapshot in which every
//! member group owns `min` or `max` shards. The input is only ever borrowed,
//! so a failed call leaves nothing half-updated.

use tracing::{info, warn};

use crate::classifier::BalanceBounds;
use crate::codec;
use crate::config::{OrphanPolicy, RebalancerConfig};
use crate::error::{Error, Result};
use crate::snapshot::{ShardConfig, ShardId, ShardMove};
use crate::transfer::TransferEngine;

/// Result of planning a rebalance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebalanceOutcome {
    /// The balanced snapshot
    pub config: ShardConfig,
    /// Bounds the new assignment satisfies
    pub bounds: BalanceBounds,
    /// Shards whose owner changed, in ascending shard order
    pub moves: Vec<ShardMove>,
}

impl RebalanceOutcome {
    /// Number of shards that changed owner.
    #[must_use]
    pub fn moved_shards(&self) -> usize {
        self.moves.len()
    }
}

/// Rebalances shard assignments across member groups
#[derive(Debug, Clone, Default)]
pub struct Rebalancer {
    config: RebalancerConfig,
}

impl Rebalancer {
    /// Create a new rebalancer
    #[must_use]
    pub const fn new(config: RebalancerConfig) -> Self {
        Self { config }
    }

    /// The rebalancer's configuration
    #[must_use]
    pub const fn config(&self) -> &RebalancerConfig {
        &self.config
    }

    /// Produces a balanced copy of `current`.
    ///
    /// # Errors
    ///
    /// See [`Rebalancer::plan`].
    pub fn rebalance(&self, current: &ShardConfig) -> Result<ShardConfig> {
        self.plan(current).map(|outcome| outcome.config)
    }

    /// Produces a balanced copy of `current` along with the shard moves it
    /// takes to get there.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidGroupCount`] if `current` has no member groups.
    /// - [`Error::UnownedShard`] or [`Error::UnknownGroup`] if a shard is
    ///   orphaned and the orphan policy is [`OrphanPolicy::Reject`].
    pub fn plan(&self, current: &ShardConfig) -> Result<RebalanceOutcome> {
        let bounds = BalanceBounds::new(current.shard_count(), current.group_count())?;
        let (holdings, orphans) = codec::split_orphans(current);

        if let Some(&shard) = orphans.first() {
            match self.config.orphan_policy {
                OrphanPolicy::Reject => return Err(orphan_error(current, shard)),
                OrphanPolicy::Reassign => {
                    warn!(count = orphans.len(), "reassigning orphaned shards");
                }
            }
        }

        let (holdings, moved) = TransferEngine::new(holdings, orphans, bounds).run();

        let mut next = current.clone();
        next.shards = codec::to_array_form(&holdings, current.shard_count())?;
        let moves = current.movements(&next)?;
        debug_assert_eq!(moves.len(), moved);

        info!(
            groups = current.group_count(),
            shards = current.shard_count(),
            min = bounds.min,
            max = bounds.max,
            moved = moves.len(),
            "rebalanced shard assignment"
        );

        Ok(RebalanceOutcome {
            config: next,
            bounds,
            moves,
        })
    }
}

fn orphan_error(config: &ShardConfig, shard: ShardId) -> Error {
    match config.owner(shard) {
        Some(group) => Error::UnknownGroup { shard, group },
        None => Error::UnownedShard { shard },
    }
}

/// Produces a balanced copy of `current` with the default configuration.
///
/// # Errors
///
/// See [`Rebalancer::plan`].
pub fn rebalance(current: &ShardConfig) -> Result<ShardConfig> {
    Rebalancer::default().rebalance(current)
}

/// Whether every shard is owned by a member group and every member group owns
/// `min` or `max` shards. A snapshot without groups is never balanced.
#[must_use]
pub fn is_balanced(config: &ShardConfig) -> bool {
    let Ok(bounds) = BalanceBounds::new(config.shard_count(), config.group_count()) else {
        return false;
    };

    config.orphaned_shards().is_empty()
        && config
            .shard_counts()
            .values()
            .all(|&count| bounds.admits(count))
}

/// Fewest shard moves any rebalance of `config` can make.
///
/// Every orphaned shard has to move. Of the member groups, the `heavy`
/// groups holding the most shards keep up to `max` and the rest keep up to
/// `min`; everything above that has to move.
///
/// # Errors
///
/// Returns [`Error::InvalidGroupCount`] if `config` has no member groups.
pub fn minimum_movements(config: &ShardConfig) -> Result<usize> {
    let bounds = BalanceBounds::new(config.shard_count(), config.group_count())?;

    let mut counts: Vec<usize> = config.shard_counts().into_values().collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));

    let excess: usize = counts
        .iter()
        .enumerate()
        .map(|(rank, &count)| {
            let target = if rank < bounds.heavy {
                bounds.max
            } else {
                bounds.min
            };
            count.saturating_sub(target)
        })
        .sum();

    Ok(config.orphaned_shards().len() + excess)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use assert_matches::assert_matches;
    use tracing_test::traced_test;

    use super::*;
    use crate::codec::GroupForm;
    use crate::group_id::GroupId;

    fn gid(id: u64) -> GroupId {
        GroupId::new(id)
    }

    fn config_from(shard_count: usize, form: &GroupForm) -> ShardConfig {
        ShardConfig::from_group_form(shard_count, form).unwrap()
    }

    #[test]
    fn test_zero_groups_fails() {
        let config = ShardConfig::new(10);
        assert_matches!(rebalance(&config), Err(Error::InvalidGroupCount));
        assert_matches!(minimum_movements(&config), Err(Error::InvalidGroupCount));
        assert!(!is_balanced(&config));
    }

    #[test]
    fn test_reject_unowned_shard() {
        let config = ShardConfig::new(4).with_group(gid(1), vec![]);
        assert_matches!(rebalance(&config), Err(Error::UnownedShard { shard: 0 }));
    }

    #[test]
    fn test_reject_retired_group() {
        let form = GroupForm::from([(gid(1), vec![0, 1]), (gid(2), vec![2, 3])]);
        let config = config_from(4, &form).without_group(gid(2));

        assert_matches!(
            rebalance(&config),
            Err(Error::UnknownGroup { shard: 2, group }) if group == gid(2)
        );
    }

    #[traced_test]
    #[test]
    fn test_plan_reports_moves() {
        let form = GroupForm::from([(gid(1), vec![0, 1, 2, 3, 4, 5]), (gid(2), vec![6, 7, 8, 9])]);
        let config = config_from(10, &form);

        let outcome = Rebalancer::default().plan(&config).unwrap();

        assert_eq!(outcome.bounds, BalanceBounds { min: 5, max: 5, heavy: 0 });
        assert_eq!(outcome.moved_shards(), 1);
        assert_eq!(
            outcome.moves,
            vec![ShardMove {
                shard: 5,
                from: Some(gid(1)),
                to: Some(gid(2)),
            }]
        );
        assert_eq!(outcome.moves, config.movements(&outcome.config).unwrap());
        assert!(logs_contain("rebalanced shard assignment"));
    }

    #[traced_test]
    #[test]
    fn test_reassign_bootstrap() {
        let config = ShardConfig::new(10)
            .with_group(gid(1), vec!["a:1".to_string()])
            .with_group(gid(2), vec!["b:1".to_string()]);
        let rebalancer =
            Rebalancer::new(RebalancerConfig::default().with_orphan_policy(OrphanPolicy::Reassign));

        let outcome = rebalancer.plan(&config).unwrap();

        assert_eq!(outcome.moved_shards(), 10);
        assert!(is_balanced(&outcome.config));
        assert_eq!(outcome.config.shards_of(gid(1)).len(), 5);
        assert_eq!(outcome.config.groups, config.groups);
        assert!(logs_contain("reassigning orphaned shards"));
    }

    #[test]
    fn test_reassign_after_leave() {
        let form = GroupForm::from([
            (gid(1), vec![0, 1, 2, 3]),
            (gid(2), vec![4, 5, 6]),
            (gid(3), vec![7, 8, 9]),
        ]);
        let config = config_from(10, &form).without_group(gid(1));
        let rebalancer =
            Rebalancer::new(RebalancerConfig::default().with_orphan_policy(OrphanPolicy::Reassign));

        let next = rebalancer.rebalance(&config).unwrap();

        assert!(is_balanced(&next));
        assert_eq!(config.movements(&next).unwrap().len(), 4);
        assert_eq!(minimum_movements(&config).unwrap(), 4);
        assert_eq!(next.shard_counts(), BTreeMap::from([(gid(2), 5), (gid(3), 5)]));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let form = GroupForm::from([(gid(1), (0..10).collect()), (gid(2), vec![])]);
        let config = config_from(10, &form);
        let snapshot = config.clone();

        let next = rebalance(&config).unwrap();

        assert_eq!(config, snapshot);
        assert_ne!(next, config);
    }

    #[test]
    fn test_minimum_movements() {
        let form = GroupForm::from([
            (gid(1), vec![0, 1, 2, 3, 4]),
            (gid(2), vec![5, 6, 7, 8]),
            (gid(3), vec![9]),
        ]);
        assert_eq!(minimum_movements(&config_from(10, &form)).unwrap(), 2);
    }

    #[test]
    fn test_zero_shards() {
        let config = ShardConfig::new(0).with_group(gid(1), vec![]);
        let outcome = Rebalancer::default().plan(&config).unwrap();

        assert_eq!(outcome.config, config);
        assert!(outcome.moves.is_empty());
    }
}
