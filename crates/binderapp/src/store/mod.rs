//! # Storage Layer
//!
//! This module defines the storage abstraction for binders. The [`DataStore`]
//! trait lets the engine run against different backends without knowing how
//! records are laid out.
//!
//! ## The Uniqueness Constraint
//!
//! Every store enforces `(binder_id, position_index)` uniqueness as a hard
//! constraint, checked after **each individual write**, including writes made
//! inside a transaction, the way a relational `UNIQUE` index behaves.
//!
//! A consequence is that a batch which is valid as a whole (swap A and B) can
//! still fail if written naively, one record at a time. The two-phase protocol
//! in [`crate::committer`] exists for exactly this reason.
//!
//! ## Transactions
//!
//! [`DataStore::transaction`] runs a closure against a [`Transaction`]. Either
//! every write made through it becomes visible, or none does:
//!
//! - Closure returns `Err` → scope is discarded.
//! - Closure returns `Ok` but a card is still parked on a negative position →
//!   scope is discarded with a store error.
//! - Otherwise the scope is committed.
//!
//! Positions passed to [`Transaction::write_position`] are `i64`; negative
//! values are legal *inside* a scope only.
//!
//! ## Implementations
//!
//! - [`record_store::RecordStore`]: a JSON document store over a
//!   [`backend::StorageBackend`]:
//!   - [`fs_backend::FsBackend`]: production, one `binders.json` replaced atomically.
//!   - [`mem_backend::MemBackend`]: for testing logic without filesystem I/O.
//! - [`sqlite::SqliteStore`]: SQLite with a real `UNIQUE` index and
//!   `IMMEDIATE` transactions.
//! - [`AnyStore`]: runtime choice between the two production stores.
//!
//! ## Storage Layout (JSON)
//!
//! ```text
//! <data dir>/
//! ├── binder.toml         # Configuration
//! └── binders.json        # Binders, cards and settings
//! ```

use uuid::Uuid;

use crate::error::Result;
use crate::model::{Binder, Card, Layout};

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod record_store;
pub mod sqlite;

/// Writes allowed inside an atomic scope.
pub trait Transaction {
    /// Insert or update a card. Its position is checked against the constraint.
    fn save_card(&mut self, card: &Card) -> Result<()>;

    /// Move one card to `position`. This is the primitive batch moves are
    /// built from; negative positions are placeholders.
    fn write_position(&mut self, card_id: &Uuid, position: i64) -> Result<()>;

    fn delete_card(&mut self, card_id: &Uuid) -> Result<()>;

    /// Bump the binder's `updated_at` as part of this scope.
    fn touch_binder(&mut self, binder_id: &Uuid) -> Result<()>;
}

/// Abstract interface for binder storage.
pub trait DataStore {
    fn get_binder(&self, id: &Uuid) -> Result<Binder>;

    /// Binders owned by `owner_id`, oldest first.
    fn list_binders(&self, owner_id: &str) -> Result<Vec<Binder>>;

    /// Create or update a binder record.
    fn save_binder(&mut self, binder: &Binder) -> Result<()>;

    /// Delete a binder and every card in it. Returns the removed cards.
    fn delete_binder(&mut self, id: &Uuid) -> Result<Vec<Card>>;

    fn get_card(&self, id: &Uuid) -> Result<Card>;

    /// Live cards of a binder, ordered by position.
    fn list_cards(&self, binder_id: &Uuid) -> Result<Vec<Card>>;

    fn default_layout(&self) -> Result<Option<Layout>>;

    fn set_default_layout(&mut self, layout: Layout) -> Result<()>;

    /// Run `f` as one all-or-nothing scope.
    fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T>;

    /// Single-record write, for edits that never change positions.
    fn save_card(&mut self, card: &Card) -> Result<()> {
        self.transaction(|tx| tx.save_card(card))
    }
}

/// Store selected at runtime from configuration.
pub enum AnyStore {
    Json(record_store::RecordStore<fs_backend::FsBackend>),
    Sqlite(sqlite::SqliteStore),
}

impl DataStore for AnyStore {
    fn get_binder(&self, id: &Uuid) -> Result<Binder> {
        match self {
            AnyStore::Json(store) => store.get_binder(id),
            AnyStore::Sqlite(store) => store.get_binder(id),
        }
    }

    fn list_binders(&self, owner_id: &str) -> Result<Vec<Binder>> {
        match self {
            AnyStore::Json(store) => store.list_binders(owner_id),
            AnyStore::Sqlite(store) => store.list_binders(owner_id),
        }
    }

    fn save_binder(&mut self, binder: &Binder) -> Result<()> {
        match self {
            AnyStore::Json(store) => store.save_binder(binder),
            AnyStore::Sqlite(store) => store.save_binder(binder),
        }
    }

    fn delete_binder(&mut self, id: &Uuid) -> Result<Vec<Card>> {
        match self {
            AnyStore::Json(store) => store.delete_binder(id),
            AnyStore::Sqlite(store) => store.delete_binder(id),
        }
    }

    fn get_card(&self, id: &Uuid) -> Result<Card> {
        match self {
            AnyStore::Json(store) => store.get_card(id),
            AnyStore::Sqlite(store) => store.get_card(id),
        }
    }

    fn list_cards(&self, binder_id: &Uuid) -> Result<Vec<Card>> {
        match self {
            AnyStore::Json(store) => store.list_cards(binder_id),
            AnyStore::Sqlite(store) => store.list_cards(binder_id),
        }
    }

    fn default_layout(&self) -> Result<Option<Layout>> {
        match self {
            AnyStore::Json(store) => store.default_layout(),
            AnyStore::Sqlite(store) => store.default_layout(),
        }
    }

    fn set_default_layout(&mut self, layout: Layout) -> Result<()> {
        match self {
            AnyStore::Json(store) => store.set_default_layout(layout),
            AnyStore::Sqlite(store) => store.set_default_layout(layout),
        }
    }

    fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T>,
    {
        match self {
            AnyStore::Json(store) => store.transaction(f),
            AnyStore::Sqlite(store) => store.transaction(f),
        }
    }
}
