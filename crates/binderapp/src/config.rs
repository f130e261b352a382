//! # Configuration
//!
//! Binder configuration is loaded by [`confique`] from layered sources.
//!
//! ## Storage Hierarchy
//!
//! Resolved in priority order:
//! 1. **Environment variables**: `BINDER_USER`, `BINDER_BACKEND`, ...
//! 2. **Config file**: `<data dir>/binder.toml`.
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Env | Default | Description |
//! |-----|-----|---------|-------------|
//! | `user` | `BINDER_USER` | `local` | Caller identity used for ownership checks |
//! | `backend` | `BINDER_BACKEND` | `json` | `json` or `sqlite` |
//! | `default_layout` | `BINDER_DEFAULT_LAYOUT` | `3x3` | Layout for new binders when none is stored |
//! | `catalog_file` | `BINDER_CATALOG` | none | JSON catalog used by `add`, `fill` and `price` |
//! | `log` | `BINDER_LOG` | none | `tracing` filter directive |
//!
//! The stored default layout (see `binder default-layout`) takes precedence over
//! `default_layout`; the config value only applies while nothing is stored.

use crate::error::{BinderError, Result};
use crate::model::Layout;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_FILE: &str = "binder.toml";

/// Which [`crate::store::DataStore`] implementation backs the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Json,
    Sqlite,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Json => write!(f, "json"),
            StoreKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = BinderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(StoreKind::Json),
            "sqlite" => Ok(StoreKind::Sqlite),
            other => Err(BinderError::InvalidInput(format!(
                "unknown backend '{}', expected json or sqlite",
                other
            ))),
        }
    }
}

/// Configuration for binder, stored in `binder.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BinderConfig {
    /// Caller identity. Binders are owned by and only editable by this user.
    #[config(default = "local", env = "BINDER_USER")]
    pub user: String,

    #[config(default = "json", env = "BINDER_BACKEND", parse_env = StoreKind::from_str)]
    pub backend: StoreKind,

    #[config(default = "3x3", env = "BINDER_DEFAULT_LAYOUT", parse_env = Layout::from_str)]
    pub default_layout: Layout,

    #[config(env = "BINDER_CATALOG")]
    pub catalog_file: Option<PathBuf>,

    #[config(env = "BINDER_LOG")]
    pub log: Option<String>,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            user: "local".to_string(),
            backend: StoreKind::Json,
            default_layout: Layout::ThreeByThree,
            catalog_file: None,
            log: None,
        }
    }
}

impl BinderConfig {
    /// Load from the environment and `<data_dir>/binder.toml`, in that order.
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::builder()
            .env()
            .file(data_dir.join(CONFIG_FILE))
            .load()
            .map_err(|e| BinderError::Config(e.to_string()))
    }

    /// Catalog path, resolved against the data directory when relative.
    pub fn catalog_path(&self, data_dir: &Path) -> Option<PathBuf> {
        self.catalog_file.as_ref().map(|path| {
            if path.is_absolute() {
                path.clone()
            } else {
                data_dir.join(path)
            }
        })
    }
}
