use super::backend::{StorageBackend, StoreState};
use crate::error::{BinderError, Result};
use std::cell::{Cell, RefCell};

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since the engine is single-threaded
/// per request. This keeps the `StorageBackend` trait on `&self`.
#[derive(Default)]
pub struct MemBackend {
    state: RefCell<StoreState>,
    simulate_write_error: Cell<bool>,
    saves: Cell<usize>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Number of successful document saves, i.e. committed scopes.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl StorageBackend for MemBackend {
    fn load_state(&self) -> Result<StoreState> {
        Ok(self.state.borrow().clone())
    }

    fn save_state(&self, state: &StoreState) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(BinderError::Store("Simulated write error".to_string()));
        }
        *self.state.borrow_mut() = state.clone();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
