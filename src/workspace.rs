//! A project directory opened for use
//!
//! Ties together the config file, the snapshot file and an engine wired to
//! in-memory stores restored from that snapshot.
//!
//! An open workspace holds the state lock until it is dropped, so commands in
//! other processes wait instead of saving over each other.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use anyhow::Context;

use crate::adapters::{FileStore, MemoryBackend, StateLock};
use crate::config::LedgerConfig;
use crate::core::models::CatalogHandle;
use crate::core::services::ModerationEngine;
use crate::paths;

/// How long [`Workspace::open`] waits for another process to finish
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// An opened project
#[derive(Debug)]
pub struct Workspace {
    config_path: PathBuf,
    config: LedgerConfig,
    store: FileStore,
    backend: MemoryBackend,
    engine: ModerationEngine,
    save_lock: Mutex<()>,
    _state_lock: StateLock,
}

impl Workspace {
    /// Open the project at `root`, loading config and saved state
    pub fn open(root: &Path, config_override: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = paths::resolve_config(root, config_override);
        let config = LedgerConfig::load(&config_path).with_context(|| {
            format!(
                "No usable configuration at {}. Run 'civic-ledger init' first.",
                config_path.display()
            )
        })?;

        let store = FileStore::new(paths::state_file(root));
        let state_lock = store.lock(LOCK_TIMEOUT)?;
        let backend = MemoryBackend::from_snapshot(store.load()?);
        let engine = backend.engine(CatalogHandle::new(config.catalog()), config.engine);

        Ok(Self {
            config_path,
            config,
            store,
            backend,
            engine,
            save_lock: Mutex::new(()),
            _state_lock: state_lock,
        })
    }

    /// The engine
    #[must_use]
    pub const fn engine(&self) -> &ModerationEngine {
        &self.engine
    }

    /// Configuration as loaded at open
    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Path the configuration was loaded from
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Re-read the config file and swap the catalog in place
    ///
    /// Engine tunables are fixed at open; only reference data and rules are
    /// reloaded. On error the previous catalog stays in effect.
    pub fn reload_config(&self) -> anyhow::Result<()> {
        let config = LedgerConfig::load(&self.config_path)?;
        self.engine.catalog_handle().replace(config.catalog());
        log::info!("reloaded configuration from {}", self.config_path.display());
        Ok(())
    }

    /// Persist records, ledger and audit log
    ///
    /// Saves are serialized so concurrent callers never interleave writes.
    pub fn save(&self) -> anyhow::Result<()> {
        let _guard = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.backend.snapshot()?;
        self.store.save(&snapshot)
    }
}
