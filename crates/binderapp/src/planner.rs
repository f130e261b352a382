//! # Position Planner
//!
//! Pure functions that turn an edit intent into the exact set of position
//! changes needed to reach the post-state. Nothing here touches storage: every
//! function takes the binder's current [`Occupancy`] and returns a value the
//! caller can inspect, verify and hand to [`crate::committer`].
//!
//! ## Intents
//!
//! | Function                      | Effect                                                        |
//! |-------------------------------|---------------------------------------------------------------|
//! | [`plan_swap`]                 | Exchange two slots, or move into an empty one                 |
//! | [`plan_insert_shift`]         | Move `i → j`, sliding everything between by one toward `i`     |
//! | [`plan_delete_keep_empty`]    | Remove one card, leave a hole                                 |
//! | [`plan_delete_shift`]         | Remove one card, pull every later card back by one            |
//! | [`plan_insert_make_room`]     | Push every card at or after a slot forward by one             |
//! | [`plan_bulk_sequential_fill`] | Yield successive free slots for a multi-card add session      |
//!
//! ## Intermediate Collisions
//!
//! A [`ReassignmentSet`] describes the post-state only. Applied one entry at a
//! time against stored state it can collide (a swap writes A onto B's slot while
//! B still holds it). The planner does not order its output to avoid that;
//! the committer resolves it.
//!
//! ## Verification
//!
//! [`verify`] replays a [`ChangeSet`] against the occupancy it was planned from
//! and rejects anything that would leave two cards on one slot. Commands run it
//! before opening a transaction.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use uuid::Uuid;

use crate::error::{BinderError, Result};
use crate::model::Card;
use crate::slot::{Occupancy, SlotIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reassignment {
    pub card_id: Uuid,
    pub from: SlotIndex,
    pub to: SlotIndex,
}

/// Ordered batch of position changes for one intent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReassignmentSet(Vec<Reassignment>);

impl ReassignmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, card_id: Uuid, from: SlotIndex, to: SlotIndex) {
        self.0.push(Reassignment { card_id, from, to });
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reassignment> {
        self.0.iter()
    }

    pub fn target_of(&self, card_id: &Uuid) -> Option<SlotIndex> {
        self.0
            .iter()
            .find(|entry| entry.card_id == *card_id)
            .map(|entry| entry.to)
    }
}

impl<'a> IntoIterator for &'a ReassignmentSet {
    type Item = &'a Reassignment;
    type IntoIter = std::slice::Iter<'a, Reassignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Everything one intent does to a binder's cards, in commit order:
/// removals, then reassignments, then insertions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub removals: Vec<Uuid>,
    pub reassignments: ReassignmentSet,
    pub insertions: Vec<Card>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reassignments(reassignments: ReassignmentSet) -> Self {
        Self {
            reassignments,
            ..Default::default()
        }
    }

    pub fn with_insertion(mut self, card: Card) -> Self {
        self.insertions.push(card);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.reassignments.is_empty() && self.insertions.is_empty()
    }
}

/// Moves `card_id` to `target`; whatever sits there takes the card's old slot.
pub fn plan_swap(
    occupancy: &Occupancy,
    card_id: &Uuid,
    target: SlotIndex,
) -> Result<ReassignmentSet> {
    let from = occupancy.slot_of(card_id)?;
    let mut set = ReassignmentSet::new();
    if from == target {
        return Ok(set);
    }

    set.push(*card_id, from, target);
    if let Some(displaced) = occupancy.card_at(target) {
        set.push(displaced, target, from);
    }
    Ok(set)
}

/// Moves `card_id` to `target` and slides the cards in between by one slot to
/// close the gap it left.
pub fn plan_insert_shift(
    occupancy: &Occupancy,
    card_id: &Uuid,
    target: SlotIndex,
) -> Result<ReassignmentSet> {
    let from = occupancy.slot_of(card_id)?;
    let mut set = ReassignmentSet::new();
    if from == target {
        return Ok(set);
    }

    set.push(*card_id, from, target);
    if from < target {
        // (from, target] moves down
        for (slot, id) in occupancy.range(from..=target).filter(|(slot, _)| *slot > from) {
            set.push(id, slot, shifted(slot, -1)?);
        }
    } else {
        // [target, from) moves up
        for (slot, id) in occupancy.range(target..from) {
            set.push(id, slot, shifted(slot, 1)?);
        }
    }
    Ok(set)
}

pub fn plan_delete_keep_empty(occupancy: &Occupancy, card_id: &Uuid) -> Result<ChangeSet> {
    occupancy.slot_of(card_id)?;
    Ok(ChangeSet {
        removals: vec![*card_id],
        ..Default::default()
    })
}

/// Removes `card_id` and pulls every later card back by one.
pub fn plan_delete_shift(occupancy: &Occupancy, card_id: &Uuid) -> Result<ChangeSet> {
    let removed_at = occupancy.slot_of(card_id)?;
    let mut reassignments = ReassignmentSet::new();
    for (slot, id) in occupancy.range(removed_at..).filter(|(slot, _)| *slot > removed_at) {
        reassignments.push(id, slot, shifted(slot, -1)?);
    }
    Ok(ChangeSet {
        removals: vec![*card_id],
        reassignments,
        insertions: Vec::new(),
    })
}

/// Pushes every card at or after `target` forward by one, leaving `target` free.
pub fn plan_insert_make_room(occupancy: &Occupancy, target: SlotIndex) -> Result<ReassignmentSet> {
    let mut set = ReassignmentSet::new();
    for (slot, id) in occupancy.range(target..) {
        set.push(id, slot, shifted(slot, 1)?);
    }
    Ok(set)
}

/// Starts a fill session at `start`. See [`SlotFiller`].
pub fn plan_bulk_sequential_fill(occupancy: &Occupancy, start: SlotIndex) -> SlotFiller {
    SlotFiller::new(occupancy, start)
}

fn shifted(slot: SlotIndex, delta: i8) -> Result<SlotIndex> {
    let moved = if delta < 0 { slot.prev() } else { slot.next() };
    moved.ok_or_else(|| {
        BinderError::InvalidInput(format!("slot {} cannot shift past the index range", slot))
    })
}

/// Lazy "next free slot" generator for placing several cards in one session.
///
/// Each yielded slot counts as occupied from then on, so a session never hands
/// out the same slot twice, even after [`restart_at`](Self::restart_at) moves the
/// cursor back. The sequence only ends when the index range is exhausted.
#[derive(Debug, Clone)]
pub struct SlotFiller {
    occupied: BTreeSet<SlotIndex>,
    cursor: Option<SlotIndex>,
}

impl SlotFiller {
    pub fn new(occupancy: &Occupancy, start: SlotIndex) -> Self {
        Self {
            occupied: occupancy.iter().map(|(slot, _)| slot).collect(),
            cursor: Some(start),
        }
    }

    pub fn restart_at(&mut self, start: SlotIndex) {
        self.cursor = Some(start);
    }

    /// The slot the next call to `next()` would yield, without claiming it.
    pub fn peek(&self) -> Option<SlotIndex> {
        let mut candidate = self.cursor?;
        while self.occupied.contains(&candidate) {
            candidate = candidate.next()?;
        }
        Some(candidate)
    }
}

impl Iterator for SlotFiller {
    type Item = SlotIndex;

    fn next(&mut self) -> Option<SlotIndex> {
        let Some(slot) = self.peek() else {
            self.cursor = None;
            return None;
        };
        self.occupied.insert(slot);
        self.cursor = slot.next();
        Some(slot)
    }
}

/// Replays `changes` against `occupancy` and fails if the result would break
/// slot uniqueness or reference cards that are not in the binder.
pub fn verify(occupancy: &Occupancy, changes: &ChangeSet) -> Result<()> {
    let mut positions: HashMap<Uuid, SlotIndex> =
        occupancy.iter().map(|(slot, id)| (id, slot)).collect();

    for id in &changes.removals {
        if positions.remove(id).is_none() {
            return Err(violation(format!("removed card {} is not in the binder", id)));
        }
    }

    let mut moved = HashSet::new();
    for entry in &changes.reassignments {
        if !moved.insert(entry.card_id) {
            return Err(violation(format!(
                "card {} is reassigned more than once",
                entry.card_id
            )));
        }
        match positions.get_mut(&entry.card_id) {
            Some(current) if *current == entry.from => *current = entry.to,
            Some(current) => {
                return Err(violation(format!(
                    "card {} is planned from slot {} but sits in {}",
                    entry.card_id, entry.from, current
                )))
            }
            None => {
                return Err(violation(format!(
                    "reassigned card {} is not a live card of the binder",
                    entry.card_id
                )))
            }
        }
    }

    for card in &changes.insertions {
        if positions.insert(card.id, card.position_index).is_some() {
            return Err(violation(format!("inserted card {} already exists", card.id)));
        }
    }

    let mut taken = HashSet::with_capacity(positions.len());
    for slot in positions.values() {
        if !taken.insert(*slot) {
            return Err(violation(format!("slot {} would hold two cards", slot)));
        }
    }
    Ok(())
}

fn violation(message: String) -> BinderError {
    BinderError::InvariantViolation(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CatalogCard;

    /// Builds a binder occupied at `slots`, returning the occupancy and the card
    /// ids in the same order as `slots`.
    fn occupied(slots: &[u32]) -> (Occupancy, Vec<Uuid>) {
        let binder_id = Uuid::new_v4();
        let cards: Vec<Card> = slots
            .iter()
            .map(|slot| {
                Card::from_catalog(
                    binder_id,
                    SlotIndex::new(*slot),
                    &CatalogCard::new("x", "X"),
                )
            })
            .collect();
        let ids = cards.iter().map(|c| c.id).collect();
        (Occupancy::from_cards(&cards).unwrap(), ids)
    }

    fn apply(occupancy: &Occupancy, changes: &ChangeSet) -> HashMap<Uuid, SlotIndex> {
        verify(occupancy, changes).unwrap();
        let mut positions: HashMap<Uuid, SlotIndex> =
            occupancy.iter().map(|(slot, id)| (id, slot)).collect();
        for id in &changes.removals {
            positions.remove(id);
        }
        for entry in &changes.reassignments {
            positions.insert(entry.card_id, entry.to);
        }
        for card in &changes.insertions {
            positions.insert(card.id, card.position_index);
        }
        positions
    }

    fn slot(n: u32) -> SlotIndex {
        SlotIndex::new(n)
    }

    #[test]
    fn test_swap_two_occupied_slots() {
        let (occ, ids) = occupied(&[0, 1]);
        let set = plan_swap(&occ, &ids[0], slot(1)).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.target_of(&ids[0]), Some(slot(1)));
        assert_eq!(set.target_of(&ids[1]), Some(slot(0)));
    }

    #[test]
    fn test_swap_into_empty_slot_is_a_move() {
        let (occ, ids) = occupied(&[0, 1, 2]);
        let set = plan_swap(&occ, &ids[1], slot(8)).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.target_of(&ids[1]), Some(slot(8)));
    }

    #[test]
    fn test_swap_onto_own_slot_is_empty() {
        let (occ, ids) = occupied(&[4]);
        assert!(plan_swap(&occ, &ids[0], slot(4)).unwrap().is_empty());
    }

    #[test]
    fn test_swap_unknown_card_is_not_found() {
        let (occ, _) = occupied(&[0]);
        let err = plan_swap(&occ, &Uuid::new_v4(), slot(1)).unwrap_err();
        assert!(matches!(err, BinderError::CardNotFound(_)));
    }

    #[test]
    fn test_swap_involution() {
        let (occ, ids) = occupied(&[2, 7]);
        let (a, b) = (ids[0], ids[1]);
        let (slot_a, slot_b) = (slot(2), slot(7));

        let first = ChangeSet::from_reassignments(plan_swap(&occ, &a, slot_b).unwrap());
        let after_first = apply(&occ, &first);
        let cards: Vec<Card> = after_first
            .iter()
            .map(|(id, s)| {
                let mut card = Card::from_catalog(Uuid::nil(), *s, &CatalogCard::new("x", "X"));
                card.id = *id;
                card
            })
            .collect();
        let occ_after = Occupancy::from_cards(&cards).unwrap();

        let second = ChangeSet::from_reassignments(plan_swap(&occ_after, &b, slot_a).unwrap());
        let restored = apply(&occ_after, &second);

        assert_eq!(restored[&a], slot_a);
        assert_eq!(restored[&b], slot_b);
    }

    #[test]
    fn test_insert_shift_forward_preserves_order() {
        let (occ, ids) = occupied(&[0, 1, 2, 3, 4, 5, 6]);
        let set = plan_insert_shift(&occ, &ids[2], slot(6)).unwrap();
        let after = apply(&occ, &ChangeSet::from_reassignments(set.clone()));

        assert_eq!(after[&ids[2]], slot(6));
        assert_eq!(after[&ids[3]], slot(2));
        assert_eq!(after[&ids[4]], slot(3));
        assert_eq!(after[&ids[5]], slot(4));
        assert_eq!(after[&ids[6]], slot(5));
        assert_eq!(after[&ids[0]], slot(0));
        assert_eq!(after[&ids[1]], slot(1));
        // Only the moved card and the four it passed over
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn test_insert_shift_backward() {
        let (occ, ids) = occupied(&[0, 1, 2, 3, 4]);
        let set = plan_insert_shift(&occ, &ids[4], slot(1)).unwrap();
        let after = apply(&occ, &ChangeSet::from_reassignments(set));

        assert_eq!(after[&ids[4]], slot(1));
        assert_eq!(after[&ids[1]], slot(2));
        assert_eq!(after[&ids[2]], slot(3));
        assert_eq!(after[&ids[3]], slot(4));
        assert_eq!(after[&ids[0]], slot(0));
    }

    #[test]
    fn test_insert_shift_adjacent() {
        let (occ, ids) = occupied(&[3, 4]);
        let set = plan_insert_shift(&occ, &ids[0], slot(4)).unwrap();
        let after = apply(&occ, &ChangeSet::from_reassignments(set));
        assert_eq!(after[&ids[0]], slot(4));
        assert_eq!(after[&ids[1]], slot(3));
    }

    #[test]
    fn test_insert_shift_to_current_slot_is_empty() {
        let (occ, ids) = occupied(&[0, 1, 2]);
        assert!(plan_insert_shift(&occ, &ids[1], slot(1)).unwrap().is_empty());
    }

    #[test]
    fn test_insert_shift_sparse_leaves_outside_untouched() {
        let (occ, ids) = occupied(&[0, 2, 5, 9]);
        let set = plan_insert_shift(&occ, &ids[0], slot(5)).unwrap();
        let after = apply(&occ, &ChangeSet::from_reassignments(set.clone()));

        assert_eq!(after[&ids[0]], slot(5));
        assert_eq!(after[&ids[1]], slot(1));
        assert_eq!(after[&ids[2]], slot(4));
        assert_eq!(after[&ids[3]], slot(9));
        assert!(set.target_of(&ids[3]).is_none());
    }

    #[test]
    fn test_delete_keep_empty_touches_nothing_else() {
        let (occ, ids) = occupied(&[0, 1, 2]);
        let changes = plan_delete_keep_empty(&occ, &ids[1]).unwrap();
        assert_eq!(changes.removals, vec![ids[1]]);
        assert!(changes.reassignments.is_empty());
    }

    #[test]
    fn test_delete_shift_contiguity() {
        let (occ, ids) = occupied(&[0, 1, 2, 3, 4, 5]);
        let changes = plan_delete_shift(&occ, &ids[3]).unwrap();
        let after = apply(&occ, &changes);

        assert_eq!(after.len(), 5);
        assert_eq!(after[&ids[4]], slot(3));
        assert_eq!(after[&ids[5]], slot(4));
        let mut slots: Vec<u32> = after.values().map(|s| s.get()).collect();
        slots.sort();
        assert_eq!(slots, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_make_room_opens_hole() {
        let (occ, ids) = occupied(&[0, 1, 2, 3]);
        let set = plan_insert_make_room(&occ, slot(2)).unwrap();
        let after = apply(&occ, &ChangeSet::from_reassignments(set));

        assert_eq!(after[&ids[0]], slot(0));
        assert_eq!(after[&ids[1]], slot(1));
        assert_eq!(after[&ids[2]], slot(3));
        assert_eq!(after[&ids[3]], slot(4));
        assert!(!after.values().any(|s| *s == slot(2)));
    }

    #[test]
    fn test_make_room_past_end_is_empty() {
        let (occ, _) = occupied(&[0, 1]);
        assert!(plan_insert_make_room(&occ, slot(5)).unwrap().is_empty());
    }

    #[test]
    fn test_fill_skips_occupied_and_claimed() {
        let (occ, _) = occupied(&[1, 2, 4]);
        let mut filler = plan_bulk_sequential_fill(&occ, slot(1));

        assert_eq!(filler.next(), Some(slot(3)));
        assert_eq!(filler.next(), Some(slot(5)));

        filler.restart_at(slot(0));
        assert_eq!(filler.next(), Some(slot(0)));
        assert_eq!(filler.next(), Some(slot(6)));
    }

    #[test]
    fn test_fill_peek_does_not_claim() {
        let (occ, _) = occupied(&[0]);
        let mut filler = SlotFiller::new(&occ, slot(0));
        assert_eq!(filler.peek(), Some(slot(1)));
        assert_eq!(filler.next(), Some(slot(1)));
    }

    #[test]
    fn test_fill_ends_at_index_range() {
        let filler = SlotFiller::new(&Occupancy::new(), SlotIndex::new(u32::MAX - 1));
        let slots: Vec<SlotIndex> = filler.collect();
        assert_eq!(slots, vec![SlotIndex::new(u32::MAX - 1), SlotIndex::new(u32::MAX)]);
    }

    #[test]
    fn test_verify_rejects_duplicate_target() {
        let (occ, ids) = occupied(&[0, 1]);
        let mut set = ReassignmentSet::new();
        set.push(ids[0], slot(0), slot(1));
        let err = verify(&occ, &ChangeSet::from_reassignments(set)).unwrap_err();
        assert!(matches!(err, BinderError::InvariantViolation(_)));
    }

    #[test]
    fn test_verify_rejects_stale_source() {
        let (occ, ids) = occupied(&[0]);
        let mut set = ReassignmentSet::new();
        set.push(ids[0], slot(3), slot(4));
        assert!(verify(&occ, &ChangeSet::from_reassignments(set)).is_err());
    }

    #[test]
    fn test_verify_rejects_move_of_removed_card() {
        let (occ, ids) = occupied(&[0, 1]);
        let mut changes = plan_delete_keep_empty(&occ, &ids[0]).unwrap();
        changes.reassignments.push(ids[0], slot(0), slot(5));
        assert!(verify(&occ, &changes).is_err());
    }

    #[test]
    fn test_verify_rejects_insert_onto_occupied_slot() {
        let (occ, _) = occupied(&[0]);
        let card = Card::from_catalog(Uuid::new_v4(), slot(0), &CatalogCard::new("x", "X"));
        let err = verify(&occ, &ChangeSet::new().with_insertion(card)).unwrap_err();
        assert!(matches!(err, BinderError::InvariantViolation(_)));
    }
}
