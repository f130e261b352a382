//! Moving cards between slots.
//!
//! - [`swap`]: the card at `from` and the card at `to` trade places. An empty
//!   `to` makes it a plain move.
//! - [`insert`]: the card at `from` lands on `to`, and the cards in between
//!   slide one slot toward `from`.
//! - [`make_room`]: every card at or after a slot moves up one, leaving the slot
//!   empty.
//!
//! All three go through the same verify + two-phase commit path.

use crate::commands::helpers::{
    commit_plan, committed_cards, load_occupancy, owned_binder,
};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::planner::{
    plan_insert_make_room, plan_insert_shift, plan_swap, ChangeSet, ReassignmentSet,
};
use crate::slot::{Occupancy, SlotIndex};
use crate::store::DataStore;
use uuid::Uuid;

fn apply<S: DataStore>(
    store: &mut S,
    user: &str,
    binder_id: &Uuid,
    plan: impl FnOnce(&Occupancy) -> Result<ReassignmentSet>,
) -> Result<ChangeSet> {
    let binder = owned_binder(store, user, binder_id)?;
    let (_, occupancy) = load_occupancy(store, &binder.id)?;
    let changes = ChangeSet::from_reassignments(plan(&occupancy)?);
    if changes.is_empty() {
        return Ok(changes);
    }
    commit_plan(store, &binder, &occupancy, &changes)?;
    Ok(changes)
}

fn report<S: DataStore>(store: &S, changes: &ChangeSet, done: String) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if changes.is_empty() {
        result.add_message(CmdMessage::info("Nothing to move."));
    } else {
        result.add_message(CmdMessage::success(done));
    }
    Ok(result.with_affected_cards(committed_cards(store, changes)?))
}

pub fn swap<S: DataStore>(
    store: &mut S,
    user: &str,
    binder_id: &Uuid,
    from: SlotIndex,
    to: SlotIndex,
) -> Result<CmdResult> {
    let changes = apply(store, user, binder_id, |occupancy| {
        let card_id = occupancy.require_card_at(from)?;
        plan_swap(occupancy, &card_id, to)
    })?;
    let done = if changes.reassignments.len() == 2 {
        format!("Swapped slots {} and {}", from, to)
    } else {
        format!("Moved slot {} to {}", from, to)
    };
    report(store, &changes, done)
}

pub fn insert<S: DataStore>(
    store: &mut S,
    user: &str,
    binder_id: &Uuid,
    from: SlotIndex,
    to: SlotIndex,
) -> Result<CmdResult> {
    let changes = apply(store, user, binder_id, |occupancy| {
        let card_id = occupancy.require_card_at(from)?;
        plan_insert_shift(occupancy, &card_id, to)
    })?;
    let done = format!(
        "Moved slot {} to {}, shifting {} card(s)",
        from,
        to,
        changes.reassignments.len().saturating_sub(1)
    );
    report(store, &changes, done)
}

/// Opens an empty slot at `at`. Applies even when `at` is already empty, so the
/// cards after it always move.
pub fn make_room<S: DataStore>(
    store: &mut S,
    user: &str,
    binder_id: &Uuid,
    at: SlotIndex,
) -> Result<CmdResult> {
    let changes = apply(store, user, binder_id, |occupancy| {
        plan_insert_make_room(occupancy, at)
    })?;
    let done = format!(
        "Opened slot {}, moving {} card(s) up",
        at,
        changes.reassignments.len()
    );
    report(store, &changes, done)
}
