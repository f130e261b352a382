//! # Command Layer
//!
//! This module contains the **business logic** of binder. Each command lives in
//! its own submodule as plain functions over a [`DataStore`](crate::store::DataStore).
//!
//! ## Role and Responsibilities
//!
//! Every mutating command follows the same pipeline:
//!
//! 1. **Authorize**: load the binder and check the caller owns it.
//! 2. **Load occupancy**: build the slot ↔ card map from the live cards.
//! 3. **Plan**: call a [`crate::planner`] function for the intent.
//! 4. **Verify**: replay the change set against the occupancy; an
//!    `InvariantViolation` here means nothing was written.
//! 5. **Commit**: hand the change set to [`crate::committer`].
//! 6. **Report**: re-read the affected cards and return them with their final
//!    slots.
//!
//! Steps 2 to 5 live in [`helpers`] so no command writes positions on its own.
//!
//! ## What Commands Do NOT Do
//!
//! - **Any I/O**: no stdout, stderr or terminal concerns
//! - **Argument parsing**: binder names and slot strings are resolved by [`crate::api`]
//! - **Retries**: a `TransactionFailure` goes back to the caller untouched
//!
//! ## Testing Strategy
//!
//! Command tests run against the in-memory backend and check both the
//! returned [`CmdResult`] and the stored state afterwards.
//!
//! ## Command Modules
//!
//! - [`binders`]: create, list, rename, gray-out, layout, delete
//! - [`add`]: place a catalog card into a slot
//! - [`fill`]: place several catalog cards into successive free slots
//! - [`remove`]: take a card out, keeping the hole or closing it
//! - [`reorder`]: swap, insert-shift and make-room
//! - [`purchase`]: purchased flag and purchase link
//! - [`price`]: refresh prices from the catalog
//! - [`view`]: cards in slot order plus derived pages
//! - [`settings`]: stored default layout

use crate::model::{Binder, Card, Layout};
use crate::pages::PageLayout;
use serde::Serialize;

pub mod add;
pub mod binders;
pub mod fill;
pub mod helpers;
pub mod price;
pub mod purchase;
pub mod remove;
pub mod reorder;
pub mod settings;
pub mod view;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }
}

/// A binder with its cards in slot order and the derived page geometry.
#[derive(Debug, Clone, Serialize)]
pub struct BinderView {
    pub binder: Binder,
    pub cards: Vec<Card>,
    pub pages: PageLayout,
}

#[derive(Debug, Default, Serialize)]
pub struct CmdResult {
    /// Binders created, modified or listed.
    pub binders: Vec<Binder>,
    /// Cards whose slot or fields changed, with their post-commit state.
    pub affected_cards: Vec<Card>,
    /// Cards that no longer exist.
    pub removed_cards: Vec<Card>,
    pub view: Option<BinderView>,
    pub layout: Option<Layout>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_binders(mut self, binders: Vec<Binder>) -> Self {
        self.binders = binders;
        self
    }

    pub fn with_affected_cards(mut self, cards: Vec<Card>) -> Self {
        self.affected_cards = cards;
        self
    }
}
