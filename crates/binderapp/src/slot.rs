//! # Slots and Occupancy
//!
//! A binder is a dense, zero-based sequence of card-sized cells. A [`SlotIndex`]
//! addresses one cell; an [`Occupancy`] is the binder-wide mapping between slots
//! and the cards sitting in them.
//!
//! ## Uniqueness
//!
//! At most one live card may sit in a slot. [`Occupancy::from_cards`] refuses to
//! build a map from a card set that breaks this, so every planner function can
//! assume its input is well formed.
//!
//! ## Storage Positions
//!
//! Slots are unsigned. Stores persist positions as `i64` because the two-phase
//! committer parks cards on negative placeholders mid-transaction (see
//! [`crate::committer`]). [`SlotIndex::as_position`] and
//! [`SlotIndex::from_position`] convert between the two.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{BinderError, Result};
use crate::model::Card;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotIndex(u32);

impl SlotIndex {
    pub const ZERO: SlotIndex = SlotIndex(0);

    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn as_position(self) -> i64 {
        i64::from(self.0)
    }

    /// Returns `None` for placeholders and out-of-range values.
    pub fn from_position(position: i64) -> Option<Self> {
        u32::try_from(position).ok().map(Self)
    }

    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for SlotIndex {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl FromStr for SlotIndex {
    type Err = BinderError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| BinderError::InvalidInput(format!("'{}' is not a slot number", s)))
    }
}

/// Slot ↔ card mapping for one binder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occupancy {
    by_slot: BTreeMap<SlotIndex, Uuid>,
    by_card: HashMap<Uuid, SlotIndex>,
}

impl Occupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map from a binder's live cards.
    ///
    /// Fails with `InvariantViolation` if two cards share a slot or a card id
    /// appears twice: the stored state is already corrupt and nothing should be
    /// planned against it.
    pub fn from_cards<'a, I>(cards: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Card>,
    {
        let mut occupancy = Self::new();
        for card in cards {
            occupancy.place(card.id, card.position_index)?;
        }
        Ok(occupancy)
    }

    fn place(&mut self, card_id: Uuid, slot: SlotIndex) -> Result<()> {
        if let Some(existing) = self.by_slot.get(&slot) {
            return Err(BinderError::InvariantViolation(format!(
                "cards {} and {} both occupy slot {}",
                existing, card_id, slot
            )));
        }
        if self.by_card.insert(card_id, slot).is_some() {
            return Err(BinderError::InvariantViolation(format!(
                "card {} appears more than once",
                card_id
            )));
        }
        self.by_slot.insert(slot, card_id);
        Ok(())
    }

    pub fn slot_of(&self, card_id: &Uuid) -> Result<SlotIndex> {
        self.by_card
            .get(card_id)
            .copied()
            .ok_or(BinderError::CardNotFound(*card_id))
    }

    pub fn card_at(&self, slot: SlotIndex) -> Option<Uuid> {
        self.by_slot.get(&slot).copied()
    }

    /// Like [`card_at`](Self::card_at) but an empty slot is an error.
    pub fn require_card_at(&self, slot: SlotIndex) -> Result<Uuid> {
        self.card_at(slot).ok_or(BinderError::SlotEmpty { slot })
    }

    pub fn is_occupied(&self, slot: SlotIndex) -> bool {
        self.by_slot.contains_key(&slot)
    }

    pub fn contains_card(&self, card_id: &Uuid) -> bool {
        self.by_card.contains_key(card_id)
    }

    pub fn max_index(&self) -> Option<SlotIndex> {
        self.by_slot.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.by_slot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slot.is_empty()
    }

    /// Occupied slots in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, Uuid)> + '_ {
        self.by_slot.iter().map(|(slot, id)| (*slot, *id))
    }

    /// Occupied slots in `range`, ascending.
    pub fn range<R>(&self, range: R) -> impl Iterator<Item = (SlotIndex, Uuid)> + '_
    where
        R: std::ops::RangeBounds<SlotIndex>,
    {
        self.by_slot.range(range).map(|(slot, id)| (*slot, *id))
    }
}
