use crate::committer;
use crate::error::{BinderError, Result};
use crate::model::{Binder, Card};
use crate::planner::{verify, ChangeSet};
use crate::slot::Occupancy;
use crate::store::DataStore;
use tracing::debug;
use uuid::Uuid;

/// Loads `binder_id` and checks that `user` owns it.
pub fn owned_binder<S: DataStore>(store: &S, user: &str, binder_id: &Uuid) -> Result<Binder> {
    let binder = store.get_binder(binder_id)?;
    if !binder.is_owned_by(user) {
        return Err(BinderError::Unauthorized {
            user: user.to_string(),
            binder_id: *binder_id,
        });
    }
    Ok(binder)
}

/// Live cards in slot order together with their occupancy map.
pub fn load_occupancy<S: DataStore>(store: &S, binder_id: &Uuid) -> Result<(Vec<Card>, Occupancy)> {
    let cards = store.list_cards(binder_id)?;
    let occupancy = Occupancy::from_cards(&cards)?;
    Ok((cards, occupancy))
}

/// Verifies `changes` against the occupancy they were planned from, then
/// commits them. Nothing is written when verification fails.
pub fn commit_plan<S: DataStore>(
    store: &mut S,
    binder: &Binder,
    occupancy: &Occupancy,
    changes: &ChangeSet,
) -> Result<()> {
    verify(occupancy, changes)?;
    debug!(
        binder = %binder.id,
        removals = changes.removals.len(),
        reassignments = changes.reassignments.len(),
        insertions = changes.insertions.len(),
        "change set verified"
    );
    committer::commit(store, &binder.id, changes)
}

/// Cards touched by `changes`, re-read after commit, in slot order.
pub fn committed_cards<S: DataStore>(store: &S, changes: &ChangeSet) -> Result<Vec<Card>> {
    let ids = changes
        .reassignments
        .iter()
        .map(|entry| entry.card_id)
        .chain(changes.insertions.iter().map(|card| card.id));

    let mut cards = ids
        .map(|id| store.get_card(&id))
        .collect::<Result<Vec<_>>>()?;
    cards.sort_by_key(|card| card.position_index);
    Ok(cards)
}
