use crate::commands::helpers::owned_binder;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{BinderError, Result};
use crate::model::{Binder, Layout};
use crate::store::DataStore;
use tracing::info;
use uuid::Uuid;

fn clean_name<S: DataStore>(
    store: &S,
    user: &str,
    name: &str,
    except: Option<Uuid>,
) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BinderError::InvalidInput(
            "binder name cannot be empty".to_string(),
        ));
    }
    let taken = store
        .list_binders(user)?
        .iter()
        .any(|b| Some(b.id) != except && b.name.eq_ignore_ascii_case(name));
    if taken {
        return Err(BinderError::InvalidInput(format!(
            "you already have a binder named '{}'",
            name
        )));
    }
    Ok(name.to_string())
}

/// Creates an empty binder. Without an explicit layout the stored default is
/// used, then `fallback`.
pub fn create<S: DataStore>(
    store: &mut S,
    user: &str,
    name: &str,
    layout: Option<Layout>,
    fallback: Layout,
) -> Result<CmdResult> {
    let name = clean_name(store, user, name, None)?;
    let layout = match layout {
        Some(layout) => layout,
        None => store.default_layout()?.unwrap_or(fallback),
    };

    let binder = Binder::new(user, name, layout);
    store.save_binder(&binder)?;
    info!(binder = %binder.id, %layout, "binder created");

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Binder created: {} ({})",
        binder.name, binder.layout
    )));
    Ok(result.with_binders(vec![binder]))
}

pub fn list<S: DataStore>(store: &S, user: &str) -> Result<CmdResult> {
    let binders = store.list_binders(user)?;
    let mut result = CmdResult::default();
    if binders.is_empty() {
        result.add_message(CmdMessage::info("No binders yet."));
    }
    Ok(result.with_binders(binders))
}

pub fn rename<S: DataStore>(
    store: &mut S,
    user: &str,
    binder_id: &Uuid,
    name: &str,
) -> Result<CmdResult> {
    let mut binder = owned_binder(store, user, binder_id)?;
    let name = clean_name(store, user, name, Some(binder.id))?;
    let old = std::mem::replace(&mut binder.name, name);
    binder.touch();
    store.save_binder(&binder)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Renamed '{}' to '{}'",
        old, binder.name
    )));
    Ok(result.with_binders(vec![binder]))
}

pub fn set_gray_out<S: DataStore>(
    store: &mut S,
    user: &str,
    binder_id: &Uuid,
    gray_out: bool,
) -> Result<CmdResult> {
    let mut binder = owned_binder(store, user, binder_id)?;
    binder.gray_out_unpurchased = gray_out;
    binder.touch();
    store.save_binder(&binder)?;

    let mut result = CmdResult::default();
    let state = if gray_out { "grayed out" } else { "shown normally" };
    result.add_message(CmdMessage::success(format!(
        "Unpurchased cards in '{}' are now {}",
        binder.name, state
    )));
    Ok(result.with_binders(vec![binder]))
}

/// Changes the page geometry. Slots keep their indexes; only the pages they
/// fall on change.
pub fn set_layout<S: DataStore>(
    store: &mut S,
    user: &str,
    binder_id: &Uuid,
    layout: Layout,
) -> Result<CmdResult> {
    let mut binder = owned_binder(store, user, binder_id)?;
    binder.layout = layout;
    binder.touch();
    store.save_binder(&binder)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "'{}' now uses the {} layout",
        binder.name, layout
    )));
    Ok(result.with_binders(vec![binder]))
}

/// Deletes the binder and every card in it.
pub fn delete<S: DataStore>(store: &mut S, user: &str, binder_id: &Uuid) -> Result<CmdResult> {
    let binder = owned_binder(store, user, binder_id)?;
    let removed = store.delete_binder(&binder.id)?;
    info!(binder = %binder.id, cards = removed.len(), "binder deleted");

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Deleted '{}' and {} card(s)",
        binder.name,
        removed.len()
    )));
    result.removed_cards = removed;
    Ok(result.with_binders(vec![binder]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{binder_with_cards, mem_store};

    #[test]
    fn test_create_uses_explicit_layout() {
        let mut store = mem_store();
        let res = create(
            &mut store,
            "alice",
            "Modern",
            Some(Layout::TwoByTwo),
            Layout::ThreeByThree,
        )
        .unwrap();

        assert_eq!(res.binders[0].layout, Layout::TwoByTwo);
        assert_eq!(store.list_binders("alice").unwrap().len(), 1);
    }

    #[test]
    fn test_create_prefers_stored_default_over_fallback() {
        let mut store = mem_store();
        let res = create(&mut store, "alice", "A", None, Layout::TwoByTwo).unwrap();
        assert_eq!(res.binders[0].layout, Layout::TwoByTwo);

        store.set_default_layout(Layout::FourByThree).unwrap();
        let res = create(&mut store, "alice", "B", None, Layout::TwoByTwo).unwrap();
        assert_eq!(res.binders[0].layout, Layout::FourByThree);
    }

    #[test]
    fn test_create_rejects_blank_and_duplicate_names() {
        let mut store = mem_store();
        assert!(create(&mut store, "alice", "  ", None, Layout::default()).is_err());

        create(&mut store, "alice", "Modern", None, Layout::default()).unwrap();
        let err = create(&mut store, "alice", "modern", None, Layout::default()).unwrap_err();
        assert!(matches!(err, BinderError::InvalidInput(_)));

        // Names are per owner.
        create(&mut store, "bob", "Modern", None, Layout::default()).unwrap();
    }

    #[test]
    fn test_list_only_own_binders() {
        let mut store = mem_store();
        create(&mut store, "alice", "A", None, Layout::default()).unwrap();
        create(&mut store, "bob", "B", None, Layout::default()).unwrap();

        let res = list(&store, "alice").unwrap();
        assert_eq!(res.binders.len(), 1);
        assert_eq!(res.binders[0].name, "A");

        let res = list(&store, "carol").unwrap();
        assert!(res.binders.is_empty());
        assert_eq!(res.messages.len(), 1);
    }

    #[test]
    fn test_rename_and_flags_require_ownership() {
        let mut store = mem_store();
        let (binder, _) = binder_with_cards(&mut store, "alice", &[]);

        assert!(matches!(
            rename(&mut store, "bob", &binder.id, "Stolen"),
            Err(BinderError::Unauthorized { .. })
        ));
        assert!(matches!(
            set_gray_out(&mut store, "bob", &binder.id, true),
            Err(BinderError::Unauthorized { .. })
        ));

        rename(&mut store, "alice", &binder.id, "Vintage").unwrap();
        set_gray_out(&mut store, "alice", &binder.id, true).unwrap();
        let stored = store.get_binder(&binder.id).unwrap();
        assert_eq!(stored.name, "Vintage");
        assert!(stored.gray_out_unpurchased);
    }

    #[test]
    fn test_rename_to_same_name_is_allowed() {
        let mut store = mem_store();
        let (binder, _) = binder_with_cards(&mut store, "alice", &[]);
        rename(&mut store, "alice", &binder.id, "Test Binder").unwrap();
    }

    #[test]
    fn test_set_layout_keeps_slots() {
        let mut store = mem_store();
        let (binder, cards) = binder_with_cards(&mut store, "alice", &[0, 10]);

        set_layout(&mut store, "alice", &binder.id, Layout::TwoByTwo).unwrap();
        assert_eq!(store.get_binder(&binder.id).unwrap().layout, Layout::TwoByTwo);
        assert_eq!(store.get_card(&cards[1].id).unwrap().position_index.get(), 10);
    }

    #[test]
    fn test_delete_cascades_and_reports_cards() {
        let mut store = mem_store();
        let (binder, _) = binder_with_cards(&mut store, "alice", &[0, 1, 2]);

        assert!(matches!(
            delete(&mut store, "bob", &binder.id),
            Err(BinderError::Unauthorized { .. })
        ));

        let res = delete(&mut store, "alice", &binder.id).unwrap();
        assert_eq!(res.removed_cards.len(), 3);
        assert!(store.get_binder(&binder.id).is_err());
        assert!(store.list_cards(&binder.id).unwrap().is_empty());
    }
}
