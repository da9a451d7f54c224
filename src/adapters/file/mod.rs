//! JSON snapshot persistence
//!
//! The CLI is one process per command, so state lives in
//! `.civic-ledger/state.json` between invocations. The whole snapshot is
//! rewritten on save through a temporary file and a rename.
//!
//! A snapshot is only consistent while one process owns it: load, mutate and
//! save must all happen under the [`StateLock`] taken with [`FileStore::lock`].

use std::fs::{self, File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::models::{AuditEntry, CanonicalRecord, ContributionEntry};

/// Everything the in-memory stores hold
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Canonical records
    #[serde(default)]
    pub records: Vec<CanonicalRecord>,
    /// Ledger entries
    #[serde(default)]
    pub contributions: Vec<ContributionEntry>,
    /// Audit entries
    #[serde(default)]
    pub audit: Vec<AuditEntry>,
}

/// Interval between attempts while another process holds the lock
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Exclusive ownership of a snapshot file, released on drop
#[derive(Debug)]
pub struct StateLock {
    _file: File,
    path: PathBuf,
}

impl StateLock {
    /// Path of the lock file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reads and writes a [`Snapshot`] at a fixed path
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store backed by `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the lock file guarding the snapshot
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Take the exclusive lock without waiting
    ///
    /// Returns `Ok(None)` if another handle holds it.
    pub fn try_lock(&self) -> anyhow::Result<Option<StateLock>> {
        let path = self.lock_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        match file.try_lock() {
            Ok(()) => Ok(Some(StateLock { _file: file, path })),
            Err(TryLockError::WouldBlock) => Ok(None),
            Err(TryLockError::Error(e)) => {
                Err(e).with_context(|| format!("Failed to lock {}", path.display()))
            },
        }
    }

    /// Take the exclusive lock, polling until `timeout` elapses
    pub fn lock(&self, timeout: Duration) -> anyhow::Result<StateLock> {
        let start = Instant::now();
        loop {
            if let Some(lock) = self.try_lock()? {
                log::debug!("locked {}", lock.path().display());
                return Ok(lock);
            }
            if start.elapsed() >= timeout {
                anyhow::bail!(
                    "{} is locked by another civic-ledger process (is 'civic-ledger serve' running?)",
                    self.path.display()
                );
            }
            thread::sleep(LOCK_POLL_INTERVAL);
        }
    }

    /// Load the snapshot, or an empty one if the file does not exist yet
    pub fn load(&self) -> anyhow::Result<Snapshot> {
        if !self.path.exists() {
            log::debug!("no snapshot at {}, starting empty", self.path.display());
            return Ok(Snapshot::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let snapshot = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(snapshot)
    }

    /// Write the snapshot, creating the parent directory if needed
    pub fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        log::debug!(
            "saved {} records, {} contributions, {} audit entries to {}",
            snapshot.records.len(),
            snapshot.contributions.len(),
            snapshot.audit.len(),
            self.path.display()
        );
        Ok(())
    }
}
