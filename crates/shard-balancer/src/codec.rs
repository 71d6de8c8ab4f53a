//! Conversions between array-form and group-form assignments
//!
//! Array form is `shards[s] = owner`; group form is `gid -> owned shards`.
//! Group form is keyed by a `BTreeMap`, so every traversal visits groups in
//! ascending id order and results are deterministic.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::group_id::GroupId;
use crate::snapshot::{ShardConfig, ShardId};

/// Group-form assignment: each group id mapped to the shards it owns
pub type GroupForm = BTreeMap<GroupId, Vec<ShardId>>;

/// Converts an array-form assignment into group form.
///
/// Every id in `groups` gets an entry, even when it owns nothing. Shards owned
/// by an id outside `groups` are filed under that id; unowned shards are left
/// out. Shard lists are in ascending order.
pub fn to_group_form<I>(shards: &[Option<GroupId>], groups: I) -> GroupForm
where
    I: IntoIterator<Item = GroupId>,
{
    let mut form: GroupForm = groups.into_iter().map(|gid| (gid, Vec::new())).collect();

    for (shard, owner) in shards.iter().enumerate() {
        if let Some(gid) = owner {
            form.entry(*gid).or_default().push(shard);
        }
    }

    form
}

/// Converts a group-form assignment back into array form.
///
/// Shards that no group lists stay `None`. If a shard is listed by more than
/// one group, the group with the highest id wins.
///
/// # Errors
///
/// Returns [`Error::ShardOutOfRange`] if a listed shard is not below
/// `shard_count`.
pub fn to_array_form(form: &GroupForm, shard_count: usize) -> Result<Vec<Option<GroupId>>> {
    let mut shards = vec![None; shard_count];

    for (&gid, owned) in form {
        for &shard in owned {
            let slot = shards
                .get_mut(shard)
                .ok_or(Error::ShardOutOfRange { shard, shard_count })?;
            *slot = Some(gid);
        }
    }

    Ok(shards)
}

/// Splits a snapshot into the group form of its member groups and the list of
/// orphaned shards (unowned, or owned by a group outside the membership).
pub fn split_orphans(config: &ShardConfig) -> (GroupForm, Vec<ShardId>) {
    let mut form = to_group_form(&config.shards, config.groups.keys().copied());

    let mut orphans: Vec<ShardId> = config
        .shards
        .iter()
        .enumerate()
        .filter(|(_, owner)| owner.is_none())
        .map(|(shard, _)| shard)
        .collect();

    let strays: Vec<GroupId> = form
        .keys()
        .filter(|gid| !config.groups.contains_key(*gid))
        .copied()
        .collect();
    for gid in strays {
        orphans.extend(form.remove(&gid).unwrap_or_default());
    }
    orphans.sort_unstable();

    (form, orphans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gid(id: u64) -> GroupId {
        GroupId::new(id)
    }

    #[test]
    fn test_group_form_keeps_empty_groups() {
        let shards = vec![Some(gid(1)), Some(gid(2)), Some(gid(1))];
        let form = to_group_form(&shards, [gid(1), gid(2), gid(3)]);

        assert_eq!(form[&gid(1)], vec![0, 2]);
        assert_eq!(form[&gid(2)], vec![1]);
        assert!(form[&gid(3)].is_empty());
    }

    #[test]
    fn test_group_form_files_non_members_under_their_id() {
        let shards = vec![Some(gid(1)), Some(gid(8)), None];
        let form = to_group_form(&shards, [gid(1)]);

        assert_eq!(form.len(), 2);
        assert_eq!(form[&gid(8)], vec![1]);
    }

    #[test]
    fn test_array_form_leaves_gaps_unowned() {
        let form = GroupForm::from([(gid(4), vec![2]), (gid(5), vec![0])]);
        let shards = to_array_form(&form, 4).unwrap();

        assert_eq!(shards, vec![Some(gid(5)), None, Some(gid(4)), None]);
    }

    #[test]
    fn test_array_form_rejects_out_of_range() {
        let form = GroupForm::from([(gid(1), vec![0, 10])]);
        assert_eq!(
            to_array_form(&form, 10),
            Err(Error::ShardOutOfRange {
                shard: 10,
                shard_count: 10
            })
        );
    }

    #[test]
    fn test_group_form_inverts_array_form() {
        let shards = vec![Some(gid(2)), Some(gid(1)), Some(gid(2)), Some(gid(3))];
        let form = to_group_form(&shards, [gid(1), gid(2), gid(3)]);
        assert_eq!(to_array_form(&form, shards.len()).unwrap(), shards);
    }

    #[test]
    fn test_split_orphans() {
        let config = ShardConfig {
            shards: vec![Some(gid(1)), Some(gid(7)), None, Some(gid(2)), Some(gid(7))],
            groups: BTreeMap::from([(gid(1), vec![]), (gid(2), vec![]), (gid(3), vec![])]),
        };

        let (form, orphans) = split_orphans(&config);

        assert_eq!(orphans, vec![1, 2, 4]);
        assert_eq!(form.keys().copied().collect::<Vec<_>>(), vec![gid(1), gid(2), gid(3)]);
        assert_eq!(form[&gid(1)], vec![0]);
        assert!(form[&gid(3)].is_empty());
    }
}
