use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::Result;
use crate::model::{Binder, Card, Layout};

/// Store-wide settings persisted next to the records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub default_layout: Option<Layout>,
}

/// Everything a [`RecordStore`](super::record_store::RecordStore) persists, as one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub binders: BTreeMap<Uuid, Binder>,
    #[serde(default)]
    pub cards: BTreeMap<Uuid, Card>,
    #[serde(default)]
    pub settings: Settings,
}

/// Abstract interface for raw document I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while RecordStore handles the "what" (constraints, transactions, cascade).
pub trait StorageBackend {
    /// Load the whole document. A missing document is an empty state.
    fn load_state(&self) -> Result<StoreState>;

    /// Replace the whole document.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn save_state(&self, state: &StoreState) -> Result<()>;
}
