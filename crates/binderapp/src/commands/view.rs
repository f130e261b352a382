use crate::commands::helpers::load_occupancy;
use crate::commands::{BinderView, CmdResult};
use crate::error::Result;
use crate::pages;
use crate::store::DataStore;
use uuid::Uuid;

/// Cards in slot order plus the page geometry derived from the highest
/// occupied slot. Read-only, so no ownership check.
pub fn run<S: DataStore>(store: &S, binder_id: &Uuid) -> Result<CmdResult> {
    let binder = store.get_binder(binder_id)?;
    let (cards, occupancy) = load_occupancy(store, &binder.id)?;
    let pages = pages::derive(binder.layout, occupancy.max_index());

    Ok(CmdResult {
        view: Some(BinderView {
            binder,
            cards,
            pages,
        }),
        ..Default::default()
    })
}
