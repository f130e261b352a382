use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::Layout;
use crate::store::DataStore;

/// The stored default layout, or `fallback` when none is stored.
pub fn default_layout<S: DataStore>(store: &S, fallback: Layout) -> Result<CmdResult> {
    let stored = store.default_layout()?;
    let mut result = CmdResult {
        layout: Some(stored.unwrap_or(fallback)),
        ..Default::default()
    };
    if stored.is_none() {
        result.add_message(CmdMessage::info(format!(
            "No default stored, using configured {}",
            fallback
        )));
    }
    Ok(result)
}

pub fn set_default_layout<S: DataStore>(store: &mut S, layout: Layout) -> Result<CmdResult> {
    store.set_default_layout(layout)?;
    let mut result = CmdResult {
        layout: Some(layout),
        ..Default::default()
    };
    result.add_message(CmdMessage::success(format!(
        "New binders will use the {} layout",
        layout
    )));
    Ok(result)
}
