//! Fixtures shared by unit tests and, behind the `test_utils` feature, by
//! downstream crates.

use crate::catalog::StaticCatalog;
use crate::error::{BinderError, Result};
use crate::model::{Binder, CatalogCard, Card, Layout};
use crate::slot::SlotIndex;
use crate::store::mem_backend::MemBackend;
use crate::store::record_store::RecordStore;
use crate::store::{DataStore, Transaction};
use uuid::Uuid;

pub type MemStore = RecordStore<MemBackend>;

pub fn mem_store() -> MemStore {
    RecordStore::with_backend(MemBackend::new())
}

/// Creates a 3x3 binder owned by `owner` with one card at each of `slots`.
/// Cards are returned in the order of `slots` and named `card-<slot>`.
pub fn binder_with_cards<S: DataStore>(
    store: &mut S,
    owner: &str,
    slots: &[u32],
) -> (Binder, Vec<Card>) {
    let binder = Binder::new(owner, "Test Binder", Layout::ThreeByThree);
    store.save_binder(&binder).expect("save binder");

    let cards = slots
        .iter()
        .map(|slot| {
            let entry = CatalogCard::new(format!("cat-{}", slot), format!("card-{}", slot));
            let card = Card::from_catalog(binder.id, SlotIndex::new(*slot), &entry);
            store.save_card(&card).expect("save card");
            card
        })
        .collect();
    (binder, cards)
}

/// Catalog with three priced entries: `bolt`, `counterspell` and `ritual`.
pub fn sample_catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with(
            CatalogCard::new("bolt", "Lightning Bolt")
                .with_price(250)
                .with_set("lea", "161"),
        )
        .with(
            CatalogCard::new("counterspell", "Counterspell")
                .with_price(120)
                .with_set("lea", "54"),
        )
        .with(CatalogCard::new("ritual", "Dark Ritual").with_price(40))
}

/// Slot of every card in the binder, keyed by card name, in slot order.
pub fn slots_by_name<S: DataStore>(store: &S, binder: &Binder) -> Vec<(String, u32)> {
    store
        .list_cards(&binder.id)
        .expect("list cards")
        .into_iter()
        .map(|card| (card.name, card.position_index.get()))
        .collect()
}

/// Write that [`FaultyStore`] fails inside every transaction scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Any write to a negative position reports a slot conflict.
    Placeholder,
    /// Bumping the binder's `updated_at` fails.
    TouchBinder,
}

/// Memory store whose transaction scopes fail on one kind of write. Reads and
/// writes outside a scope go straight to the wrapped store.
pub struct FaultyStore {
    pub inner: MemStore,
    pub fault: Fault,
}

impl FaultyStore {
    pub fn new(inner: MemStore, fault: Fault) -> Self {
        Self { inner, fault }
    }
}

struct FaultyTx<'a> {
    inner: &'a mut dyn Transaction,
    fault: Fault,
}

impl Transaction for FaultyTx<'_> {
    fn save_card(&mut self, card: &Card) -> Result<()> {
        self.inner.save_card(card)
    }

    fn write_position(&mut self, card_id: &Uuid, position: i64) -> Result<()> {
        if self.fault == Fault::Placeholder && position < 0 {
            return Err(BinderError::SlotConflict {
                binder_id: Uuid::nil(),
                position,
            });
        }
        self.inner.write_position(card_id, position)
    }

    fn delete_card(&mut self, card_id: &Uuid) -> Result<()> {
        self.inner.delete_card(card_id)
    }

    fn touch_binder(&mut self, binder_id: &Uuid) -> Result<()> {
        if self.fault == Fault::TouchBinder {
            return Err(BinderError::Store("binder write failed".to_string()));
        }
        self.inner.touch_binder(binder_id)
    }
}

impl DataStore for FaultyStore {
    fn get_binder(&self, id: &Uuid) -> Result<Binder> {
        self.inner.get_binder(id)
    }

    fn list_binders(&self, owner_id: &str) -> Result<Vec<Binder>> {
        self.inner.list_binders(owner_id)
    }

    fn save_binder(&mut self, binder: &Binder) -> Result<()> {
        self.inner.save_binder(binder)
    }

    fn delete_binder(&mut self, id: &Uuid) -> Result<Vec<Card>> {
        self.inner.delete_binder(id)
    }

    fn get_card(&self, id: &Uuid) -> Result<Card> {
        self.inner.get_card(id)
    }

    fn list_cards(&self, binder_id: &Uuid) -> Result<Vec<Card>> {
        self.inner.list_cards(binder_id)
    }

    fn default_layout(&self) -> Result<Option<Layout>> {
        self.inner.default_layout()
    }

    fn set_default_layout(&mut self, layout: Layout) -> Result<()> {
        self.inner.set_default_layout(layout)
    }

    fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T>,
    {
        let fault = self.fault;
        self.inner
            .transaction(|tx| f(&mut FaultyTx { inner: tx, fault }))
    }
}
