use crate::catalog::CatalogProvider;
use crate::commands::helpers::{load_occupancy, owned_binder};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{BinderError, Result};
use crate::model::Card;
use crate::slot::SlotIndex;
use crate::store::DataStore;
use tracing::warn;
use uuid::Uuid;

/// Re-reads prices from the catalog for the card at `slot`, or for every card
/// in the binder when `slot` is `None`.
///
/// Whole-binder refreshes skip cards the catalog no longer knows and report
/// them as warnings; a single-slot refresh fails instead. Changed cards are
/// written in one scope.
pub fn refresh<S: DataStore, C: CatalogProvider>(
    store: &mut S,
    catalog: &C,
    user: &str,
    binder_id: &Uuid,
    slot: Option<SlotIndex>,
) -> Result<CmdResult> {
    let binder = owned_binder(store, user, binder_id)?;
    let (cards, occupancy) = load_occupancy(store, &binder.id)?;

    let targets: Vec<Card> = match slot {
        Some(slot) => {
            let card_id = occupancy.require_card_at(slot)?;
            cards.into_iter().filter(|card| card.id == card_id).collect()
        }
        None => cards,
    };

    let mut result = CmdResult::default();
    let mut changed = Vec::new();
    let mut checked = 0;
    for mut card in targets {
        let entry = match catalog.lookup(&card.catalog_id) {
            Ok(entry) => entry,
            Err(BinderError::CatalogNotFound(id)) if slot.is_none() => {
                warn!(card = %card.id, catalog_id = %id, "card missing from catalog");
                result.add_message(CmdMessage::warning(format!(
                    "No catalog entry for {} (slot {}), price kept",
                    card.name, card.position_index
                )));
                continue;
            }
            Err(e) => return Err(e),
        };
        checked += 1;
        if card.price_cents != entry.price_cents {
            card.price_cents = entry.price_cents;
            card.touch();
            changed.push(card);
        }
    }

    if !changed.is_empty() {
        store.transaction(|tx| {
            for card in &changed {
                tx.save_card(card)?;
            }
            Ok(())
        })?;
    }

    result.add_message(CmdMessage::success(format!(
        "Checked {} card(s), {} price(s) updated",
        checked,
        changed.len()
    )));
    Ok(result.with_affected_cards(changed))
}
