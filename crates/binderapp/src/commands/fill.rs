use crate::catalog::CatalogProvider;
use crate::commands::helpers::{
    commit_plan, committed_cards, load_occupancy, owned_binder,
};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{BinderError, Result};
use crate::model::Card;
use crate::planner::{plan_bulk_sequential_fill, ChangeSet};
use crate::slot::SlotIndex;
use crate::store::DataStore;
use uuid::Uuid;

/// Places each of `catalog_ids`, in order, into the next free slot at or after
/// `start`. Existing cards never move. All cards land in one commit or none do.
pub fn run<S: DataStore, C: CatalogProvider, I: AsRef<str>>(
    store: &mut S,
    catalog: &C,
    user: &str,
    binder_id: &Uuid,
    catalog_ids: &[I],
    start: SlotIndex,
) -> Result<CmdResult> {
    let binder = owned_binder(store, user, binder_id)?;
    if catalog_ids.is_empty() {
        return Err(BinderError::InvalidInput(
            "nothing to fill, give at least one catalog id".to_string(),
        ));
    }
    let entries = catalog_ids
        .iter()
        .map(|id| catalog.lookup(id.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let (_, occupancy) = load_occupancy(store, &binder.id)?;
    let mut slots = plan_bulk_sequential_fill(&occupancy, start);

    let mut changes = ChangeSet::new();
    for entry in &entries {
        let slot = slots.next().ok_or_else(|| {
            BinderError::InvalidInput("no free slots left in the index range".to_string())
        })?;
        changes = changes.with_insertion(Card::from_catalog(binder.id, slot, entry));
    }

    commit_plan(store, &binder, &occupancy, &changes)?;

    let cards = committed_cards(store, &changes)?;
    let mut result = CmdResult::default();
    if let (Some(first), Some(last)) = (cards.first(), cards.last()) {
        result.add_message(CmdMessage::success(format!(
            "Added {} card(s) between slots {} and {}",
            cards.len(),
            first.position_index,
            last.position_index
        )));
    }
    Ok(result.with_affected_cards(cards))
}
