//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single
//! entry point for every binder operation, whatever UI sits on top.
//!
//! ## Role and Responsibilities
//!
//! - **Dispatches** to the matching `commands::*` function
//! - **Normalizes inputs**: binder references, slot numbers and layout tags
//!   arrive as strings and are resolved here
//! - **Carries the caller identity** so commands can check ownership
//!
//! Business logic stays in `commands/`; presentation stays in the client.
//!
//! ## Binder References
//!
//! A binder can be named by:
//!
//! - its **UUID**, which resolves any binder (viewing another user's binder is
//!   allowed, editing it is not), or
//! - its **name**, matched case-insensitively among the caller's own binders.
//!
//! ## Generic Over Store and Catalog
//!
//! `BinderApi<S: DataStore, C: CatalogProvider>`:
//! - Production: `BinderApi<AnyStore, StaticCatalog>`
//! - Testing: `BinderApi<RecordStore<MemBackend>, StaticCatalog>`

use crate::catalog::CatalogProvider;
use crate::commands;
use crate::error::{BinderError, Result};
use crate::model::Layout;
use crate::slot::SlotIndex;
use crate::store::DataStore;
use uuid::Uuid;

pub use commands::{BinderView, CmdMessage, CmdResult, MessageLevel};

pub struct BinderApi<S: DataStore, C: CatalogProvider> {
    store: S,
    catalog: C,
    user: String,
    fallback_layout: Layout,
}

impl<S: DataStore, C: CatalogProvider> BinderApi<S, C> {
    pub fn new(store: S, catalog: C, user: impl Into<String>) -> Self {
        Self {
            store,
            catalog,
            user: user.into(),
            fallback_layout: Layout::default(),
        }
    }

    /// Layout used for new binders when the store has no default.
    pub fn with_fallback_layout(mut self, layout: Layout) -> Self {
        self.fallback_layout = layout;
        self
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn create_binder(&mut self, name: &str, layout: Option<&str>) -> Result<CmdResult> {
        let layout = layout.map(str::parse::<Layout>).transpose()?;
        commands::binders::create(&mut self.store, &self.user, name, layout, self.fallback_layout)
    }

    pub fn list_binders(&self) -> Result<CmdResult> {
        commands::binders::list(&self.store, &self.user)
    }

    pub fn view_binder(&self, binder: &str) -> Result<CmdResult> {
        let id = self.resolve_binder(binder)?;
        commands::view::run(&self.store, &id)
    }

    pub fn rename_binder(&mut self, binder: &str, name: &str) -> Result<CmdResult> {
        let id = self.resolve_binder(binder)?;
        commands::binders::rename(&mut self.store, &self.user, &id, name)
    }

    pub fn set_gray_out(&mut self, binder: &str, gray_out: bool) -> Result<CmdResult> {
        let id = self.resolve_binder(binder)?;
        commands::binders::set_gray_out(&mut self.store, &self.user, &id, gray_out)
    }

    pub fn set_layout(&mut self, binder: &str, layout: &str) -> Result<CmdResult> {
        let id = self.resolve_binder(binder)?;
        let layout: Layout = layout.parse()?;
        commands::binders::set_layout(&mut self.store, &self.user, &id, layout)
    }

    pub fn delete_binder(&mut self, binder: &str) -> Result<CmdResult> {
        let id = self.resolve_binder(binder)?;
        commands::binders::delete(&mut self.store, &self.user, &id)
    }

    pub fn add_card(
        &mut self,
        binder: &str,
        catalog_id: &str,
        slot: &str,
        shift: bool,
    ) -> Result<CmdResult> {
        let id = self.resolve_binder(binder)?;
        let slot: SlotIndex = slot.parse()?;
        commands::add::run(
            &mut self.store,
            &self.catalog,
            &self.user,
            &id,
            catalog_id,
            slot,
            shift,
        )
    }

    pub fn fill<I: AsRef<str>>(
        &mut self,
        binder: &str,
        catalog_ids: &[I],
        start: &str,
    ) -> Result<CmdResult> {
        let id = self.resolve_binder(binder)?;
        let start: SlotIndex = start.parse()?;
        commands::fill::run(
            &mut self.store,
            &self.catalog,
            &self.user,
            &id,
            catalog_ids,
            start,
        )
    }

    pub fn remove_card(&mut self, binder: &str, slot: &str, shift: bool) -> Result<CmdResult> {
        let id = self.resolve_binder(binder)?;
        let slot: SlotIndex = slot.parse()?;
        commands::remove::run(&mut self.store, &self.user, &id, slot, shift)
    }

    pub fn swap(&mut self, binder: &str, from: &str, to: &str) -> Result<CmdResult> {
        let id = self.resolve_binder(binder)?;
        let (from, to) = (from.parse()?, to.parse()?);
        commands::reorder::swap(&mut self.store, &self.user, &id, from, to)
    }

    pub fn insert(&mut self, binder: &str, from: &str, to: &str) -> Result<CmdResult> {
        let id = self.resolve_binder(binder)?;
        let (from, to) = (from.parse()?, to.parse()?);
        commands::reorder::insert(&mut self.store, &self.user, &id, from, to)
    }

    pub fn make_room(&mut self, binder: &str, at: &str) -> Result<CmdResult> {
        let id = self.resolve_binder(binder)?;
        commands::reorder::make_room(&mut self.store, &self.user, &id, at.parse()?)
    }

    pub fn set_purchased(
        &mut self,
        binder: &str,
        slot: &str,
        purchased: Option<bool>,
    ) -> Result<CmdResult> {
        let id = self.resolve_binder(binder)?;
        let slot: SlotIndex = slot.parse()?;
        commands::purchase::set_purchased(&mut self.store, &self.user, &id, slot, purchased)
    }

    pub fn set_purchase_link(
        &mut self,
        binder: &str,
        slot: &str,
        link: Option<&str>,
    ) -> Result<CmdResult> {
        let id = self.resolve_binder(binder)?;
        commands::purchase::set_link(&mut self.store, &self.user, &id, slot.parse()?, link)
    }

    pub fn refresh_prices(&mut self, binder: &str, slot: Option<&str>) -> Result<CmdResult> {
        let id = self.resolve_binder(binder)?;
        let slot = slot.map(str::parse::<SlotIndex>).transpose()?;
        commands::price::refresh(&mut self.store, &self.catalog, &self.user, &id, slot)
    }

    pub fn default_layout(&self) -> Result<CmdResult> {
        commands::settings::default_layout(&self.store, self.fallback_layout)
    }

    pub fn set_default_layout(&mut self, layout: &str) -> Result<CmdResult> {
        commands::settings::set_default_layout(&mut self.store, layout.parse()?)
    }

    /// Resolves a binder reference to an id. See the module docs.
    pub fn resolve_binder(&self, reference: &str) -> Result<Uuid> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(BinderError::InvalidInput(
                "binder reference cannot be empty".to_string(),
            ));
        }
        if let Ok(id) = Uuid::parse_str(reference) {
            return Ok(id);
        }
        self.store
            .list_binders(&self.user)?
            .into_iter()
            .find(|binder| binder.name.eq_ignore_ascii_case(reference))
            .map(|binder| binder.id)
            .ok_or_else(|| BinderError::BinderNotFound(reference.to_string()))
    }
}
