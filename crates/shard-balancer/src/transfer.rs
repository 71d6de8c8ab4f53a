//! Greedy shard transfer engine
//!
//! Shards are moved in three greedy passes, each pairing donors with
//! recipients in ascending group id order and moving `min(excess, need)`
//! shards at a time:
//!
//! 1. Groups above `max` fill groups below `min`.
//! 2. Groups above `min` fill whatever is still below `min`.
//! 3. Groups still above `max` top up groups sitting at `min` to `max`.
//!
//! Orphaned shards (owned by no member group) form an extra donor with a floor
//! of zero that is always drained first. Every move takes a shard from a
//! holder above its final count to a group below its final count, so the
//! number of moves equals the lower bound.

use tracing::debug;

use crate::classifier::{BalanceBounds, Standing, classify};
use crate::codec::GroupForm;
use crate::group_id::GroupId;
use crate::snapshot::ShardId;

/// Something shards can be taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Donor {
    /// The pool of shards no member group owns
    Orphans,
    /// A member group
    Group(GroupId),
}

/// Moves shards between per-group buffers until the assignment is balanced
#[derive(Debug)]
pub struct TransferEngine {
    holdings: GroupForm,
    orphans: Vec<ShardId>,
    bounds: BalanceBounds,
}

impl TransferEngine {
    /// Creates an engine over the member holdings and the orphan pool.
    #[must_use]
    pub const fn new(holdings: GroupForm, orphans: Vec<ShardId>, bounds: BalanceBounds) -> Self {
        Self {
            holdings,
            orphans,
            bounds,
        }
    }

    /// Runs every pass and returns the balanced holdings with the move count.
    #[must_use]
    pub fn run(mut self) -> (GroupForm, usize) {
        let BalanceBounds { min, max, .. } = self.bounds;

        let donors = self.donors(Standing::PrimaryDonor);
        let recipients = self.members(Standing::Recipient);
        let primary = self.pass(&donors, max, &recipients, min);
        debug!(moved = primary, "filled deficits from primary donors");

        let donors = self.donors(Standing::SecondaryDonor);
        let recipients = self.members(Standing::Recipient);
        let secondary = self.pass(&donors, min, &recipients, min);
        debug!(moved = secondary, "filled deficits from secondary donors");

        let donors = self.donors(Standing::PrimaryDonor);
        let spares = if max > min {
            self.members(Standing::Spare)
        } else {
            Vec::new()
        };
        let surplus = self.pass(&donors, max, &spares, max);
        debug!(moved = surplus, "absorbed surpluses into spare groups");

        debug_assert!(self.orphans.is_empty());
        debug_assert!(
            self.holdings
                .values()
                .all(|shards| self.bounds.admits(shards.len()))
        );

        (self.holdings, primary + secondary + surplus)
    }

    /// Pairs `donors` with `recipients` until one side is exhausted.
    ///
    /// Groups donate down to `floor` (the orphan pool down to zero);
    /// recipients are filled up to `ceiling`.
    fn pass(
        &mut self,
        donors: &[Donor],
        floor: usize,
        recipients: &[GroupId],
        ceiling: usize,
    ) -> usize {
        let mut moved = 0;
        let (mut d, mut r) = (0, 0);

        while d < donors.len() && r < recipients.len() {
            let donor = donors[d];
            let recipient = recipients[r];

            let donor_floor = match donor {
                Donor::Orphans => 0,
                Donor::Group(_) => floor,
            };
            let excess = self.held(donor).saturating_sub(donor_floor);
            let need = ceiling.saturating_sub(self.held(Donor::Group(recipient)));
            let count = excess.min(need);

            self.transfer(donor, recipient, count);
            moved += count;

            if excess <= need {
                d += 1;
            }
            if need <= excess {
                r += 1;
            }
        }

        moved
    }

    /// Moves the `count` highest-numbered shards of `donor` to `recipient`.
    fn transfer(&mut self, donor: Donor, recipient: GroupId, count: usize) {
        if count == 0 {
            return;
        }

        let source = match donor {
            Donor::Orphans => Some(&mut self.orphans),
            Donor::Group(gid) => self.holdings.get_mut(&gid),
        };
        let Some(source) = source else {
            return;
        };
        let at = source.len().saturating_sub(count);
        let moving = source.split_off(at);

        if let Some(target) = self.holdings.get_mut(&recipient) {
            target.extend(moving);
            target.sort_unstable();
        }
    }

    fn held(&self, donor: Donor) -> usize {
        match donor {
            Donor::Orphans => self.orphans.len(),
            Donor::Group(gid) => self.holdings.get(&gid).map_or(0, Vec::len),
        }
    }

    /// Member groups currently in `standing`, in ascending id order.
    fn members(&self, standing: Standing) -> Vec<GroupId> {
        classify(&self.holdings, self.bounds)
            .bucket(standing)
            .to_vec()
    }

    /// Donors for a pass: the orphan pool (if any) followed by the member
    /// groups currently in `standing`.
    fn donors(&self, standing: Standing) -> Vec<Donor> {
        let orphans = (!self.orphans.is_empty()).then_some(Donor::Orphans);
        orphans
            .into_iter()
            .chain(self.members(standing).into_iter().map(Donor::Group))
            .collect()
    }
}
