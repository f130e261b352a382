use crate::commands::helpers::{load_occupancy, owned_binder};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{validate_purchase_link, Card};
use crate::slot::SlotIndex;
use crate::store::DataStore;
use uuid::Uuid;

fn card_at<S: DataStore>(store: &S, user: &str, binder_id: &Uuid, slot: SlotIndex) -> Result<Card> {
    let binder = owned_binder(store, user, binder_id)?;
    let (_, occupancy) = load_occupancy(store, &binder.id)?;
    let card_id = occupancy.require_card_at(slot)?;
    store.get_card(&card_id)
}

/// Sets the purchased flag of the card at `slot`, or flips it when `purchased`
/// is `None`.
pub fn set_purchased<S: DataStore>(
    store: &mut S,
    user: &str,
    binder_id: &Uuid,
    slot: SlotIndex,
    purchased: Option<bool>,
) -> Result<CmdResult> {
    let mut card = card_at(store, user, binder_id, slot)?;
    card.purchased = purchased.unwrap_or(!card.purchased);
    card.touch();
    store.save_card(&card)?;

    let mut result = CmdResult::default();
    let state = if card.purchased { "purchased" } else { "not purchased" };
    result.add_message(CmdMessage::success(format!(
        "Marked {} as {}",
        card.name, state
    )));
    Ok(result.with_affected_cards(vec![card]))
}

/// Sets or, with `None`, clears the purchase link of the card at `slot`.
pub fn set_link<S: DataStore>(
    store: &mut S,
    user: &str,
    binder_id: &Uuid,
    slot: SlotIndex,
    link: Option<&str>,
) -> Result<CmdResult> {
    let link = link.map(validate_purchase_link).transpose()?;
    let mut card = card_at(store, user, binder_id, slot)?;
    card.purchase_link = link;
    card.touch();
    store.save_card(&card)?;

    let mut result = CmdResult::default();
    let message = match &card.purchase_link {
        Some(link) => format!("Purchase link for {} set to {}", card.name, link),
        None => format!("Purchase link for {} cleared", card.name),
    };
    result.add_message(CmdMessage::success(message));
    Ok(result.with_affected_cards(vec![card]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BinderError;
    use crate::test_utils::{binder_with_cards, mem_store};

    #[test]
    fn test_toggle_and_set_purchased() {
        let mut store = mem_store();
        let (binder, cards) = binder_with_cards(&mut store, "alice", &[0, 1]);

        set_purchased(&mut store, "alice", &binder.id, SlotIndex::new(1), None).unwrap();
        assert!(store.get_card(&cards[1].id).unwrap().purchased);

        set_purchased(&mut store, "alice", &binder.id, SlotIndex::new(1), None).unwrap();
        assert!(!store.get_card(&cards[1].id).unwrap().purchased);

        set_purchased(&mut store, "alice", &binder.id, SlotIndex::new(1), Some(true)).unwrap();
        set_purchased(&mut store, "alice", &binder.id, SlotIndex::new(1), Some(true)).unwrap();
        assert!(store.get_card(&cards[1].id).unwrap().purchased);
        assert!(!store.get_card(&cards[0].id).unwrap().purchased);
    }

    #[test]
    fn test_purchase_does_not_move_card() {
        let mut store = mem_store();
        let (binder, cards) = binder_with_cards(&mut store, "alice", &[4]);

        let res = set_purchased(
            &mut store,
            "alice",
            &binder.id,
            SlotIndex::new(4),
            Some(true),
        )
        .unwrap();
        assert_eq!(res.affected_cards[0].position_index, cards[0].position_index);
    }

    #[test]
    fn test_set_and_clear_link() {
        let mut store = mem_store();
        let (binder, cards) = binder_with_cards(&mut store, "alice", &[0]);

        set_link(
            &mut store,
            "alice",
            &binder.id,
            SlotIndex::ZERO,
            Some("https://shop.example/x"),
        )
        .unwrap();
        assert_eq!(
            store.get_card(&cards[0].id).unwrap().purchase_link.as_deref(),
            Some("https://shop.example/x")
        );

        set_link(&mut store, "alice", &binder.id, SlotIndex::ZERO, None).unwrap();
        assert!(store.get_card(&cards[0].id).unwrap().purchase_link.is_none());
    }

    #[test]
    fn test_bad_link_is_rejected() {
        let mut store = mem_store();
        let (binder, _) = binder_with_cards(&mut store, "alice", &[0]);

        let err = set_link(
            &mut store,
            "alice",
            &binder.id,
            SlotIndex::ZERO,
            Some("javascript:alert(1)"),
        )
        .unwrap_err();
        assert!(matches!(err, BinderError::InvalidInput(_)));
    }

    #[test]
    fn test_purchase_requires_ownership_and_card() {
        let mut store = mem_store();
        let (binder, _) = binder_with_cards(&mut store, "alice", &[0]);

        assert!(matches!(
            set_purchased(&mut store, "bob", &binder.id, SlotIndex::ZERO, None),
            Err(BinderError::Unauthorized { .. })
        ));
        assert!(matches!(
            set_purchased(&mut store, "alice", &binder.id, SlotIndex::new(2), None),
            Err(BinderError::SlotEmpty { .. })
        ));
    }
}
