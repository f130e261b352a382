//! # Two-Phase Committer
//!
//! Applies a [`ChangeSet`] to a store that checks slot uniqueness after every
//! single write. Writing reassignments directly can collide with a card that
//! has not moved yet, even when the final state is valid:
//!
//! ```text
//! {A:0, B:1}  swap  →  write A=1   ✗ B still holds 1
//! ```
//!
//! ## Protocol
//!
//! Inside one transaction scope:
//!
//! 1. Delete the change set's removals.
//! 2. **Phase 1**: park entry `n` of the reassignment set on `-(n + 1)`.
//!    Placeholders are negative and pairwise distinct, so they can only collide
//!    with each other, which they don't.
//! 3. **Phase 2**: write every entry's real target. All movers sit on
//!    placeholders and targets are distinct, so a collision here can only be
//!    with a card outside the batch, which means the plan was computed against
//!    stale state.
//! 4. Insert the change set's new cards.
//! 5. Bump the binder's `updated_at`.
//!
//! Every planner output goes through this path; there is no special case for
//! swaps or single moves.
//!
//! ## Failures
//!
//! | Where        | Surfaces as                                              |
//! |--------------|----------------------------------------------------------|
//! | Phase 1      | [`BinderError::PlaceholderCollision`], fatal             |
//! | Anywhere else| [`BinderError::TransactionFailure`], refetch and resubmit |
//!
//! In both cases the scope is discarded and nothing is observable.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{BinderError, Result};
use crate::planner::ChangeSet;
use crate::store::{DataStore, Transaction};

/// Placeholder for the entry at `batch_position`: -1, -2, -3, ...
pub fn placeholder(batch_position: usize) -> i64 {
    -(batch_position as i64) - 1
}

/// Commits `changes` for `binder_id` as one atomic scope.
pub fn commit<S: DataStore>(store: &mut S, binder_id: &Uuid, changes: &ChangeSet) -> Result<()> {
    if changes.is_empty() {
        debug!(%binder_id, "empty change set, nothing to commit");
        return Ok(());
    }

    let result = store.transaction(|tx| apply(tx, binder_id, changes));
    match result {
        Ok(()) => {
            info!(
                %binder_id,
                removed = changes.removals.len(),
                moved = changes.reassignments.len(),
                inserted = changes.insertions.len(),
                "committed change set"
            );
            Ok(())
        }
        Err(e @ BinderError::PlaceholderCollision { .. }) => {
            warn!(%binder_id, error = %e, "placeholder collision, plan rejected by store");
            Err(e)
        }
        Err(e @ BinderError::TransactionFailure(_)) => Err(e),
        Err(e) => {
            warn!(%binder_id, error = %e, "change set aborted");
            Err(BinderError::TransactionFailure(e.to_string()))
        }
    }
}

/// Runs the protocol inside an already open scope.
pub fn apply(tx: &mut dyn Transaction, binder_id: &Uuid, changes: &ChangeSet) -> Result<()> {
    for card_id in &changes.removals {
        tx.delete_card(card_id).map_err(aborted)?;
    }

    for (n, entry) in changes.reassignments.iter().enumerate() {
        let parked_at = placeholder(n);
        tx.write_position(&entry.card_id, parked_at)
            .map_err(|e| match e {
                BinderError::SlotConflict { position, .. } => BinderError::PlaceholderCollision {
                    card_id: entry.card_id,
                    position,
                },
                other => aborted(other),
            })?;
    }
    debug!(count = changes.reassignments.len(), "phase 1: parked on placeholders");

    for entry in &changes.reassignments {
        tx.write_position(&entry.card_id, entry.to.as_position())
            .map_err(aborted)?;
    }
    debug!(count = changes.reassignments.len(), "phase 2: targets written");

    for card in &changes.insertions {
        tx.save_card(card).map_err(aborted)?;
    }
    tx.touch_binder(binder_id).map_err(aborted)
}

fn aborted(e: BinderError) -> BinderError {
    match e {
        BinderError::TransactionFailure(_) => e,
        other => BinderError::TransactionFailure(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Binder, CatalogCard, Card, Layout};
    use crate::planner::{plan_delete_shift, plan_insert_shift, plan_swap, ReassignmentSet};
    use crate::slot::{Occupancy, SlotIndex};
    use crate::store::mem_backend::MemBackend;
    use crate::error::ErrorKind;
    use crate::store::record_store::RecordStore;
    use crate::test_utils::{Fault, FaultyStore};
    use std::collections::HashMap;

    /// Wraps a scope and checks slot uniqueness after every write, recording
    /// the writes in order.
    struct Recorder<'a> {
        inner: &'a mut dyn Transaction,
        positions: HashMap<Uuid, i64>,
        writes: Vec<(Uuid, i64)>,
    }

    impl Recorder<'_> {
        fn assert_unique(&self) {
            let mut seen = std::collections::HashSet::new();
            for position in self.positions.values() {
                assert!(seen.insert(*position), "two cards at {}", position);
            }
        }
    }

    impl Transaction for Recorder<'_> {
        fn save_card(&mut self, card: &Card) -> Result<()> {
            self.inner.save_card(card)?;
            self.positions.insert(card.id, card.position_index.as_position());
            self.writes.push((card.id, card.position_index.as_position()));
            self.assert_unique();
            Ok(())
        }

        fn write_position(&mut self, card_id: &Uuid, position: i64) -> Result<()> {
            self.inner.write_position(card_id, position)?;
            self.positions.insert(*card_id, position);
            self.writes.push((*card_id, position));
            self.assert_unique();
            Ok(())
        }

        fn delete_card(&mut self, card_id: &Uuid) -> Result<()> {
            self.inner.delete_card(card_id)?;
            self.positions.remove(card_id);
            Ok(())
        }

        fn touch_binder(&mut self, binder_id: &Uuid) -> Result<()> {
            self.inner.touch_binder(binder_id)
        }
    }

    fn setup(slots: &[u32]) -> (RecordStore<MemBackend>, Binder, Vec<Card>) {
        let mut store = RecordStore::with_backend(MemBackend::new());
        let binder = Binder::new("alice", "Main", Layout::ThreeByThree);
        store.save_binder(&binder).unwrap();
        let cards: Vec<Card> = slots
            .iter()
            .map(|s| {
                let card = Card::from_catalog(
                    binder.id,
                    SlotIndex::new(*s),
                    &CatalogCard::new("x", "X"),
                );
                store.save_card(&card).unwrap();
                card
            })
            .collect();
        (store, binder, cards)
    }

    fn occupancy(store: &RecordStore<MemBackend>, binder: &Binder) -> Occupancy {
        Occupancy::from_cards(&store.list_cards(&binder.id).unwrap()).unwrap()
    }

    fn slot_of(store: &RecordStore<MemBackend>, card: &Card) -> u32 {
        store.get_card(&card.id).unwrap().position_index.get()
    }

    #[test]
    fn test_placeholders_are_negative_and_distinct() {
        let values: Vec<i64> = (0..5).map(placeholder).collect();
        assert_eq!(values, vec![-1, -2, -3, -4, -5]);
    }

    #[test]
    fn test_swap_never_holds_two_cards_on_one_slot() {
        let (mut store, binder, cards) = setup(&[0, 1]);
        let (a, b) = (&cards[0], &cards[1]);
        let occ = occupancy(&store, &binder);
        let changes =
            ChangeSet::from_reassignments(plan_swap(&occ, &a.id, SlotIndex::new(1)).unwrap());

        let writes = store
            .transaction(|tx| {
                let mut recorder = Recorder {
                    inner: tx,
                    positions: HashMap::from([(a.id, 0), (b.id, 1)]),
                    writes: Vec::new(),
                };
                apply(&mut recorder, &binder.id, &changes)?;
                Ok(recorder.writes)
            })
            .unwrap();

        assert_eq!(writes, vec![(a.id, -1), (b.id, -2), (a.id, 1), (b.id, 0)]);
        assert_eq!(slot_of(&store, a), 1);
        assert_eq!(slot_of(&store, b), 0);
    }

    #[test]
    fn test_insert_shift_commits_through_constraint() {
        let (mut store, binder, cards) = setup(&[0, 1, 2, 3, 4, 5, 6]);
        let occ = occupancy(&store, &binder);
        let changes = ChangeSet::from_reassignments(
            plan_insert_shift(&occ, &cards[2].id, SlotIndex::new(6)).unwrap(),
        );

        commit(&mut store, &binder.id, &changes).unwrap();

        let got: Vec<u32> = cards.iter().map(|c| slot_of(&store, c)).collect();
        assert_eq!(got, vec![0, 1, 6, 2, 3, 4, 5]);
    }

    #[test]
    fn test_delete_shift_commit() {
        let (mut store, binder, cards) = setup(&[0, 1, 2, 3, 4, 5]);
        let occ = occupancy(&store, &binder);
        let changes = plan_delete_shift(&occ, &cards[3].id).unwrap();

        commit(&mut store, &binder.id, &changes).unwrap();

        assert!(store.get_card(&cards[3].id).is_err());
        assert_eq!(slot_of(&store, &cards[4]), 3);
        assert_eq!(slot_of(&store, &cards[5]), 4);
    }

    #[test]
    fn test_stale_plan_is_transaction_failure_and_rolls_back() {
        let (mut store, binder, cards) = setup(&[0, 1, 2]);
        // Planned as if slot 2 were free: moving card 0 there collides with
        // a card outside the batch.
        let mut set = ReassignmentSet::new();
        set.push(cards[0].id, SlotIndex::new(0), SlotIndex::new(2));
        let changes = ChangeSet::from_reassignments(set);

        let err = commit(&mut store, &binder.id, &changes).unwrap_err();
        assert!(matches!(err, BinderError::TransactionFailure(_)));
        assert!(err.is_retryable());
        assert_eq!(slot_of(&store, &cards[0]), 0);
    }

    #[test]
    fn test_missing_card_is_transaction_failure() {
        let (mut store, binder, cards) = setup(&[0]);
        let mut set = ReassignmentSet::new();
        set.push(Uuid::new_v4(), SlotIndex::new(4), SlotIndex::new(5));
        set.push(cards[0].id, SlotIndex::new(0), SlotIndex::new(1));

        let err = commit(&mut store, &binder.id, &ChangeSet::from_reassignments(set)).unwrap_err();
        assert!(matches!(err, BinderError::TransactionFailure(_)));
        assert_eq!(slot_of(&store, &cards[0]), 0);
    }

    #[test]
    fn test_phase_one_conflict_is_placeholder_collision() {
        let (store, binder, cards) = setup(&[0, 1]);
        let occ = occupancy(&store, &binder);
        let changes = ChangeSet::from_reassignments(
            plan_swap(&occ, &cards[0].id, SlotIndex::new(1)).unwrap(),
        );
        let saves = store.backend().save_count();
        let mut store = FaultyStore::new(store, Fault::Placeholder);

        let err = commit(&mut store, &binder.id, &changes).unwrap_err();

        assert!(matches!(
            err,
            BinderError::PlaceholderCollision { card_id, position: -1 } if card_id == cards[0].id
        ));
        assert_eq!(err.kind(), ErrorKind::PlaceholderCollision);
        assert!(!err.is_retryable());
        assert_eq!(store.inner.backend().save_count(), saves);
        assert_eq!(slot_of(&store.inner, &cards[0]), 0);
        assert_eq!(slot_of(&store.inner, &cards[1]), 1);
    }

    #[test]
    fn test_commit_bumps_binder_in_same_scope() {
        let (mut store, binder, cards) = setup(&[0, 1]);
        let occ = occupancy(&store, &binder);
        let changes = ChangeSet::from_reassignments(
            plan_swap(&occ, &cards[0].id, SlotIndex::new(1)).unwrap(),
        );
        let before = store.get_binder(&binder.id).unwrap().updated_at;
        let saves = store.backend().save_count();

        commit(&mut store, &binder.id, &changes).unwrap();

        assert_eq!(store.backend().save_count(), saves + 1);
        assert!(store.get_binder(&binder.id).unwrap().updated_at >= before);
    }

    #[test]
    fn test_empty_change_set_skips_storage() {
        let (mut store, binder, _) = setup(&[0]);
        let saves = store.backend().save_count();
        commit(&mut store, &binder.id, &ChangeSet::new()).unwrap();
        assert_eq!(store.backend().save_count(), saves);
    }

    #[test]
    fn test_write_failure_at_commit_is_transaction_failure() {
        let (mut store, binder, cards) = setup(&[0, 1]);
        let occ = occupancy(&store, &binder);
        let changes = ChangeSet::from_reassignments(
            plan_swap(&occ, &cards[0].id, SlotIndex::new(1)).unwrap(),
        );
        store.backend().set_simulate_write_error(true);

        let err = commit(&mut store, &binder.id, &changes).unwrap_err();
        assert!(matches!(err, BinderError::TransactionFailure(_)));
    }
}
