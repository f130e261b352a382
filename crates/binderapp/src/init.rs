//! # Data Directory and Startup
//!
//! Everything binder persists lives in one data directory:
//!
//! ```text
//! <data dir>/
//! ├── binder.toml     # optional configuration
//! ├── binders.json    # json backend
//! └── binders.db      # sqlite backend
//! ```
//!
//! ## Resolution Order
//!
//! 1. `data_override` (the CLI's `--data` flag)
//! 2. `BINDER_DATA` environment variable, mostly for tests
//! 3. The OS data directory from [`directories::ProjectDirs`]
//!
//! [`initialize`] then loads [`BinderConfig`] from that directory, opens the
//! configured store and catalog, and hands back a ready [`BinderApi`]. Clients
//! that need the config earlier (to set up logging) call [`open`] themselves.

use crate::api::BinderApi;
use crate::catalog::StaticCatalog;
use crate::config::{BinderConfig, StoreKind};
use crate::error::{BinderError, Result};
use crate::store::fs_backend::FsBackend;
use crate::store::record_store::RecordStore;
use crate::store::sqlite::SqliteStore;
use crate::store::AnyStore;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DATA_ENV: &str = "BINDER_DATA";
pub const SQLITE_FILE: &str = "binders.db";

pub struct BinderContext {
    pub api: BinderApi<AnyStore, StaticCatalog>,
    pub config: BinderConfig,
    pub data_dir: PathBuf,
}

/// Picks the data directory without touching the filesystem.
pub fn resolve_data_dir(data_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = data_override {
        return Ok(dir);
    }
    if let Ok(dir) = std::env::var(DATA_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    ProjectDirs::from("com", "binder", "binder")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| BinderError::Config("could not determine a data directory".to_string()))
}

pub fn open_store(kind: StoreKind, data_dir: &Path) -> Result<AnyStore> {
    match kind {
        StoreKind::Json => Ok(AnyStore::Json(RecordStore::with_backend(FsBackend::new(
            data_dir.to_path_buf(),
        )))),
        StoreKind::Sqlite => {
            fs::create_dir_all(data_dir)?;
            Ok(AnyStore::Sqlite(SqliteStore::open(&data_dir.join(SQLITE_FILE))?))
        }
    }
}

/// Resolves the data directory, loads config, and opens store and catalog.
/// `user` overrides the configured caller identity.
pub fn initialize(data_override: Option<PathBuf>, user: Option<String>) -> Result<BinderContext> {
    let data_dir = resolve_data_dir(data_override)?;
    let mut config = BinderConfig::load(&data_dir)?;
    if let Some(user) = user {
        config.user = user;
    }
    open(data_dir, config)
}

/// Opens store and catalog for an already loaded config.
pub fn open(data_dir: PathBuf, config: BinderConfig) -> Result<BinderContext> {
    let store = open_store(config.backend, &data_dir)?;
    let catalog = match config.catalog_path(&data_dir) {
        Some(path) => StaticCatalog::from_json_file(&path)?,
        None => StaticCatalog::new(),
    };
    debug!(
        data_dir = %data_dir.display(),
        backend = %config.backend,
        user = %config.user,
        catalog_entries = catalog.len(),
        "initialized"
    );

    let api = BinderApi::new(store, catalog, config.user.clone())
        .with_fallback_layout(config.default_layout);
    Ok(BinderContext {
        api,
        config,
        data_dir,
    })
}
