//! # Binder Architecture
//!
//! Binder arranges collectible cards into fixed-geometry binders and lets
//! the owner rearrange them, without two cards ever sharing a slot. It is a
//! library with a CLI client, not a CLI with some library code.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (binder crate)                                         │
//! │  - Parses arguments, renders output, owns exit codes        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs)                                               │
//! │  - Thin facade, resolves binder names / slots / layouts     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Commands (commands/*.rs)                                   │
//! │  - authorize → occupancy → plan → verify → commit           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Engine                                                     │
//! │  - slot.rs      SlotIndex, Occupancy                        │
//! │  - planner.rs   intents → ChangeSet                         │
//! │  - committer.rs two-phase placeholder commit                │
//! │  - pages.rs     page count, spreads                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (store/)                                           │
//! │  - DataStore + Transaction traits                           │
//! │  - RecordStore (JSON / memory), SqliteStore                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The One Rule
//!
//! For a given binder, no two live cards share a `position_index`, at any
//! point a store can observe, including between two writes of one
//! transaction. Stores check it per write. The planner describes only
//! post-states and the committer gets there through negative placeholders.
//!
//! ## No I/O Assumptions in Core
//!
//! From `api.rs` inward, code takes Rust values and returns `Result<CmdResult>`.
//! It never prints and never exits. Diagnostics go through `tracing`; the
//! client decides whether and where they are shown.
//!
//! ## Testing Strategy
//!
//! 1. **Engine**: planner properties and committer write order, in-module.
//! 2. **Commands**: the bulk of behavior tests, on the in-memory backend.
//! 3. **Stores**: `tests/` runs the same scenarios on the file-system and
//!    SQLite stores.
//! 4. **CLI**: end-to-end through the binary.

pub mod api;
pub mod catalog;
pub mod commands;
pub mod committer;
pub mod config;
pub mod error;
pub mod init;
pub mod model;
pub mod pages;
pub mod planner;
pub mod slot;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
