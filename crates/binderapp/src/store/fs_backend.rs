use super::backend::{StorageBackend, StoreState};
use crate::error::{BinderError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const DATA_FILE: &str = "binders.json";

pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_file(&self) -> PathBuf {
        self.root.join(DATA_FILE)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(BinderError::Io)?;
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn load_state(&self) -> Result<StoreState> {
        let data_file = self.data_file();
        if !data_file.exists() {
            return Ok(StoreState::default());
        }
        let content = fs::read_to_string(data_file).map_err(BinderError::Io)?;
        let state: StoreState =
            serde_json::from_str(&content).map_err(BinderError::Serialization)?;
        Ok(state)
    }

    fn save_state(&self, state: &StoreState) -> Result<()> {
        self.ensure_dir()?;

        let content = serde_json::to_string_pretty(state).map_err(BinderError::Serialization)?;

        // Readers see the old document or the new one, never a torn write
        let tmp_file = self.root.join(format!(".binders-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_file, content).map_err(BinderError::Io)?;
        fs::rename(&tmp_file, self.data_file()).map_err(BinderError::Io)?;

        Ok(())
    }
}
