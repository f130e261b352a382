use crate::catalog::CatalogProvider;
use crate::commands::helpers::{
    commit_plan, committed_cards, load_occupancy, owned_binder,
};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{BinderError, Result};
use crate::model::Card;
use crate::planner::{plan_insert_make_room, ChangeSet};
use crate::slot::SlotIndex;
use crate::store::DataStore;
use uuid::Uuid;

/// Places catalog card `catalog_id` at `slot`.
///
/// An occupied slot is an error unless `shift` is set, in which case every card
/// from `slot` onward moves up one and the new card goes into the hole, all in
/// one commit.
pub fn run<S: DataStore, C: CatalogProvider>(
    store: &mut S,
    catalog: &C,
    user: &str,
    binder_id: &Uuid,
    catalog_id: &str,
    slot: SlotIndex,
    shift: bool,
) -> Result<CmdResult> {
    let binder = owned_binder(store, user, binder_id)?;
    let entry = catalog.lookup(catalog_id)?;
    let (_, occupancy) = load_occupancy(store, &binder.id)?;

    let changes = if occupancy.is_occupied(slot) {
        if !shift {
            return Err(BinderError::SlotOccupied { slot });
        }
        ChangeSet::from_reassignments(plan_insert_make_room(&occupancy, slot)?)
    } else {
        ChangeSet::new()
    };
    let card = Card::from_catalog(binder.id, slot, &entry);
    let changes = changes.with_insertion(card.clone());

    commit_plan(store, &binder, &occupancy, &changes)?;

    let mut result = CmdResult::default();
    let shifted = changes.reassignments.len();
    result.add_message(CmdMessage::success(format!(
        "Added {} to slot {}",
        card.name, slot
    )));
    if shifted > 0 {
        result.add_message(CmdMessage::info(format!(
            "Moved {} card(s) up one slot",
            shifted
        )));
    }
    Ok(result.with_affected_cards(committed_cards(store, &changes)?))
}
