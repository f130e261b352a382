//! # Domain Model
//!
//! This module defines the records the engine persists: [`Binder`] and [`Card`],
//! plus the [`Layout`] tag that fixes a binder's page geometry and the
//! [`CatalogCard`] metadata handed over by a catalog provider.
//!
//! ## Binders
//!
//! A binder belongs to one owner (an opaque user id handed in by whatever
//! authenticates the caller). It has a name, a layout and a presentation flag
//! (`gray_out_unpurchased`). Cards are not embedded; they point back to their
//! binder through `binder_id`, and deleting a binder cascades to them.
//!
//! ## Cards
//!
//! A card is a *slotted instance* of a catalog entry. Two cards may reference the
//! same `catalog_id` (playsets, duplicates); what must never repeat inside one
//! binder is `position_index`.
//!
//! ## Layout Tags
//!
//! | Tag   | Grid | Slots per page |
//! |-------|------|----------------|
//! | `2x2` | 2×2  | 4              |
//! | `3x3` | 3×3  | 9              |
//! | `4x3` | 4×3  | 12             |
//!
//! Tags serialize as the literal strings above, in storage and in config files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{BinderError, Result};
use crate::slot::SlotIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layout {
    #[serde(rename = "2x2")]
    TwoByTwo,
    #[serde(rename = "3x3")]
    ThreeByThree,
    #[serde(rename = "4x3")]
    FourByThree,
}

impl Default for Layout {
    fn default() -> Self {
        Self::ThreeByThree
    }
}

impl Layout {
    pub const ALL: [Layout; 3] = [Layout::TwoByTwo, Layout::ThreeByThree, Layout::FourByThree];

    /// Columns per page.
    pub fn width(self) -> u32 {
        match self {
            Layout::TwoByTwo => 2,
            Layout::ThreeByThree => 3,
            Layout::FourByThree => 4,
        }
    }

    /// Rows per page.
    pub fn height(self) -> u32 {
        match self {
            Layout::TwoByTwo => 2,
            Layout::ThreeByThree | Layout::FourByThree => 3,
        }
    }

    pub fn slots_per_page(self) -> u32 {
        self.width() * self.height()
    }

    pub fn tag(self) -> &'static str {
        match self {
            Layout::TwoByTwo => "2x2",
            Layout::ThreeByThree => "3x3",
            Layout::FourByThree => "4x3",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Layout {
    type Err = BinderError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        Layout::ALL
            .into_iter()
            .find(|layout| layout.tag() == normalized)
            .ok_or_else(|| {
                BinderError::InvalidInput(format!(
                    "unknown layout '{}' (expected one of 2x2, 3x3, 4x3)",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binder {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub layout: Layout,
    #[serde(default)]
    pub gray_out_unpurchased: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Binder {
    pub fn new(owner_id: impl Into<String>, name: impl Into<String>, layout: Layout) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            name: name.into(),
            layout,
            gray_out_unpurchased: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user: &str) -> bool {
        self.owner_id == user
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Metadata returned by a catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCard {
    pub catalog_id: String,
    pub name: String,
    #[serde(default)]
    pub image_uris: Vec<String>,
    #[serde(default)]
    pub set_code: String,
    #[serde(default)]
    pub collector_number: String,
    #[serde(default)]
    pub price_cents: Option<u32>,
    #[serde(default)]
    pub purchase_link: Option<String>,
}

impl CatalogCard {
    pub fn new(catalog_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            name: name.into(),
            image_uris: Vec::new(),
            set_code: String::new(),
            collector_number: String::new(),
            price_cents: None,
            purchase_link: None,
        }
    }

    pub fn with_price(mut self, cents: u32) -> Self {
        self.price_cents = Some(cents);
        self
    }

    pub fn with_set(mut self, set_code: &str, collector_number: &str) -> Self {
        self.set_code = set_code.to_string();
        self.collector_number = collector_number.to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub binder_id: Uuid,
    pub catalog_id: String,
    pub position_index: SlotIndex,
    pub name: String,
    #[serde(default)]
    pub image_uris: Vec<String>,
    #[serde(default)]
    pub set_code: String,
    #[serde(default)]
    pub collector_number: String,
    #[serde(default)]
    pub price_cents: Option<u32>,
    #[serde(default)]
    pub purchased: bool,
    #[serde(default)]
    pub purchase_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    pub fn from_catalog(binder_id: Uuid, slot: SlotIndex, entry: &CatalogCard) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            binder_id,
            catalog_id: entry.catalog_id.clone(),
            position_index: slot,
            name: entry.name.clone(),
            image_uris: entry.image_uris.clone(),
            set_code: entry.set_code.clone(),
            collector_number: entry.collector_number.clone(),
            price_cents: entry.price_cents,
            purchased: false,
            purchase_link: entry.purchase_link.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Purchase links are shown as clickable targets, so only web URLs pass.
pub fn validate_purchase_link(link: &str) -> Result<String> {
    let trimmed = link.trim();
    let has_scheme = trimmed.starts_with("https://") || trimmed.starts_with("http://");
    let has_host = trimmed
        .split_once("://")
        .map(|(_, rest)| !rest.is_empty())
        .unwrap_or(false);

    if has_scheme && has_host && !trimmed.contains(char::is_whitespace) {
        Ok(trimmed.to_string())
    } else {
        Err(BinderError::InvalidInput(format!(
            "purchase link must be an http(s) URL, got '{}'",
            link
        )))
    }
}
