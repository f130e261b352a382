use super::backend::{StorageBackend, StoreState};
use super::{DataStore, Transaction};
use crate::error::{BinderError, Result};
use crate::model::{Binder, Card, Layout};
use crate::slot::SlotIndex;
use chrono::Utc;
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// Document store enforcing slot uniqueness on every write.
///
/// Each scope works on a private copy of the document and persists it with a
/// single `save_state` call, so an aborted scope leaves the backend untouched.
pub struct RecordStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
}

impl<B: StorageBackend> RecordStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: StorageBackend> DataStore for RecordStore<B> {
    fn get_binder(&self, id: &Uuid) -> Result<Binder> {
        let state = self.backend.load_state()?;
        state
            .binders
            .get(id)
            .cloned()
            .ok_or_else(|| BinderError::BinderNotFound(id.to_string()))
    }

    fn list_binders(&self, owner_id: &str) -> Result<Vec<Binder>> {
        let state = self.backend.load_state()?;
        let mut binders: Vec<Binder> = state
            .binders
            .into_values()
            .filter(|binder| binder.owner_id == owner_id)
            .collect();
        binders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(binders)
    }

    fn save_binder(&mut self, binder: &Binder) -> Result<()> {
        let mut state = self.backend.load_state()?;
        state.binders.insert(binder.id, binder.clone());
        self.backend.save_state(&state)
    }

    fn delete_binder(&mut self, id: &Uuid) -> Result<Vec<Card>> {
        let mut state = self.backend.load_state()?;
        if state.binders.remove(id).is_none() {
            return Err(BinderError::BinderNotFound(id.to_string()));
        }

        let card_ids: Vec<Uuid> = state
            .cards
            .values()
            .filter(|card| card.binder_id == *id)
            .map(|card| card.id)
            .collect();
        let mut removed: Vec<Card> = card_ids
            .iter()
            .filter_map(|card_id| state.cards.remove(card_id))
            .collect();
        removed.sort_by_key(|card| card.position_index);

        self.backend.save_state(&state)?;
        Ok(removed)
    }

    fn get_card(&self, id: &Uuid) -> Result<Card> {
        let state = self.backend.load_state()?;
        state
            .cards
            .get(id)
            .cloned()
            .ok_or(BinderError::CardNotFound(*id))
    }

    fn list_cards(&self, binder_id: &Uuid) -> Result<Vec<Card>> {
        let state = self.backend.load_state()?;
        let mut cards: Vec<Card> = state
            .cards
            .into_values()
            .filter(|card| card.binder_id == *binder_id)
            .collect();
        cards.sort_by_key(|card| card.position_index);
        Ok(cards)
    }

    fn default_layout(&self) -> Result<Option<Layout>> {
        Ok(self.backend.load_state()?.settings.default_layout)
    }

    fn set_default_layout(&mut self, layout: Layout) -> Result<()> {
        let mut state = self.backend.load_state()?;
        state.settings.default_layout = Some(layout);
        self.backend.save_state(&state)
    }

    fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T>,
    {
        let mut state = self.backend.load_state()?;
        let mut scope = RecordTx::begin(&mut state)?;

        let out = match f(&mut scope) {
            Ok(out) => out,
            Err(e) => {
                warn!(error = %e, "discarding aborted scope");
                return Err(e);
            }
        };
        scope.finish()?;

        self.backend.save_state(&state)?;
        Ok(out)
    }
}

/// Write scope over a private copy of the document.
///
/// `slots` mirrors a unique index on `(binder_id, position)`. Cards written to a
/// negative position are tracked in `parked` until they get a real slot again.
struct RecordTx<'a> {
    state: &'a mut StoreState,
    slots: HashMap<(Uuid, i64), Uuid>,
    parked: HashMap<Uuid, i64>,
}

impl<'a> RecordTx<'a> {
    fn begin(state: &'a mut StoreState) -> Result<Self> {
        let mut slots = HashMap::with_capacity(state.cards.len());
        for card in state.cards.values() {
            let key = (card.binder_id, card.position_index.as_position());
            if let Some(other) = slots.insert(key, card.id) {
                return Err(BinderError::Store(format!(
                    "stored cards {} and {} share slot {}",
                    other, card.id, card.position_index
                )));
            }
        }
        Ok(Self {
            state,
            slots,
            parked: HashMap::new(),
        })
    }

    fn position_of(&self, card: &Card) -> i64 {
        self.parked
            .get(&card.id)
            .copied()
            .unwrap_or_else(|| card.position_index.as_position())
    }

    /// The per-write constraint check.
    fn claim(&mut self, binder_id: Uuid, card_id: Uuid, old: Option<i64>, new: i64) -> Result<()> {
        if let Some(holder) = self.slots.get(&(binder_id, new)) {
            if *holder != card_id {
                return Err(BinderError::SlotConflict {
                    binder_id,
                    position: new,
                });
            }
        }
        if let Some(old) = old {
            self.slots.remove(&(binder_id, old));
        }
        self.slots.insert((binder_id, new), card_id);
        Ok(())
    }

    fn finish(self) -> Result<()> {
        if !self.parked.is_empty() {
            return Err(BinderError::Store(format!(
                "{} card(s) left on placeholder positions",
                self.parked.len()
            )));
        }
        Ok(())
    }
}

impl Transaction for RecordTx<'_> {
    fn save_card(&mut self, card: &Card) -> Result<()> {
        if !self.state.binders.contains_key(&card.binder_id) {
            return Err(BinderError::BinderNotFound(card.binder_id.to_string()));
        }

        let old = match self.state.cards.get(&card.id) {
            Some(existing) if existing.binder_id != card.binder_id => {
                return Err(BinderError::InvalidInput(format!(
                    "card {} cannot change binders",
                    card.id
                )))
            }
            Some(existing) => Some(self.position_of(existing)),
            None => None,
        };

        self.claim(
            card.binder_id,
            card.id,
            old,
            card.position_index.as_position(),
        )?;
        self.parked.remove(&card.id);
        self.state.cards.insert(card.id, card.clone());
        Ok(())
    }

    fn write_position(&mut self, card_id: &Uuid, position: i64) -> Result<()> {
        let (binder_id, old) = match self.state.cards.get(card_id) {
            Some(card) => (card.binder_id, self.position_of(card)),
            None => return Err(BinderError::CardNotFound(*card_id)),
        };
        let slot = if position < 0 {
            None
        } else {
            Some(SlotIndex::from_position(position).ok_or_else(|| {
                BinderError::InvalidInput(format!("position {} is out of range", position))
            })?)
        };

        self.claim(binder_id, *card_id, Some(old), position)?;

        match slot {
            None => {
                self.parked.insert(*card_id, position);
            }
            Some(slot) => {
                self.parked.remove(card_id);
                if let Some(card) = self.state.cards.get_mut(card_id) {
                    card.position_index = slot;
                    card.updated_at = Utc::now();
                }
            }
        }
        Ok(())
    }

    fn delete_card(&mut self, card_id: &Uuid) -> Result<()> {
        let card = self
            .state
            .cards
            .remove(card_id)
            .ok_or(BinderError::CardNotFound(*card_id))?;
        let position = self
            .parked
            .remove(card_id)
            .unwrap_or_else(|| card.position_index.as_position());
        self.slots.remove(&(card.binder_id, position));
        Ok(())
    }

    fn touch_binder(&mut self, binder_id: &Uuid) -> Result<()> {
        let binder = self
            .state
            .binders
            .get_mut(binder_id)
            .ok_or_else(|| BinderError::BinderNotFound(binder_id.to_string()))?;
        binder.touch();
        Ok(())
    }
}
