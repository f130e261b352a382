use crate::commands::helpers::{
    commit_plan, committed_cards, load_occupancy, owned_binder,
};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::planner::{plan_delete_keep_empty, plan_delete_shift};
use crate::slot::SlotIndex;
use crate::store::DataStore;
use uuid::Uuid;

/// Removes the card at `slot`. With `shift`, every later card moves back one
/// slot to close the hole; otherwise the slot is left empty.
pub fn run<S: DataStore>(
    store: &mut S,
    user: &str,
    binder_id: &Uuid,
    slot: SlotIndex,
    shift: bool,
) -> Result<CmdResult> {
    let binder = owned_binder(store, user, binder_id)?;
    let (cards, occupancy) = load_occupancy(store, &binder.id)?;
    let card_id = occupancy.require_card_at(slot)?;

    let changes = if shift {
        plan_delete_shift(&occupancy, &card_id)?
    } else {
        plan_delete_keep_empty(&occupancy, &card_id)?
    };
    commit_plan(store, &binder, &occupancy, &changes)?;

    let removed: Vec<_> = cards.into_iter().filter(|card| card.id == card_id).collect();
    let mut result = CmdResult::default();
    if let Some(card) = removed.first() {
        result.add_message(CmdMessage::success(format!(
            "Removed {} from slot {}",
            card.name, slot
        )));
    }
    if !changes.reassignments.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "Moved {} card(s) back one slot",
            changes.reassignments.len()
        )));
    }
    result.removed_cards = removed;
    Ok(result.with_affected_cards(committed_cards(store, &changes)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BinderError;
    use crate::test_utils::{binder_with_cards, mem_store};

    fn slots<S: DataStore>(store: &S, binder_id: &Uuid) -> Vec<u32> {
        store
            .list_cards(binder_id)
            .unwrap()
            .iter()
            .map(|c| c.position_index.get())
            .collect()
    }

    #[test]
    fn test_remove_keeps_hole() {
        let mut store = mem_store();
        let (binder, cards) = binder_with_cards(&mut store, "alice", &[0, 1, 2]);

        let res = run(&mut store, "alice", &binder.id, SlotIndex::new(1), false).unwrap();

        assert_eq!(res.removed_cards[0].id, cards[1].id);
        assert!(res.affected_cards.is_empty());
        assert_eq!(slots(&store, &binder.id), vec![0, 2]);
    }

    #[test]
    fn test_remove_with_shift_closes_hole() {
        let mut store = mem_store();
        let (binder, cards) = binder_with_cards(&mut store, "alice", &[0, 1, 2, 3, 4, 5]);

        let res = run(&mut store, "alice", &binder.id, SlotIndex::new(3), true).unwrap();

        assert_eq!(slots(&store, &binder.id), vec![0, 1, 2, 3, 4]);
        assert_eq!(store.get_card(&cards[4].id).unwrap().position_index.get(), 3);
        assert_eq!(store.get_card(&cards[5].id).unwrap().position_index.get(), 4);
        assert_eq!(res.affected_cards.len(), 2);
    }

    #[test]
    fn test_remove_empty_slot() {
        let mut store = mem_store();
        let (binder, _) = binder_with_cards(&mut store, "alice", &[0]);

        let err = run(&mut store, "alice", &binder.id, SlotIndex::new(7), false).unwrap_err();
        assert!(matches!(err, BinderError::SlotEmpty { .. }));
    }

    #[test]
    fn test_remove_requires_ownership() {
        let mut store = mem_store();
        let (binder, _) = binder_with_cards(&mut store, "alice", &[0]);

        let err = run(&mut store, "bob", &binder.id, SlotIndex::ZERO, true).unwrap_err();
        assert!(matches!(err, BinderError::Unauthorized { .. }));
        assert_eq!(slots(&store, &binder.id), vec![0]);
    }
}
