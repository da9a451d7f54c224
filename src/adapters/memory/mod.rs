//! Thread-safe in-process implementations of every port
//!
//! [`MemoryBackend`] bundles the three stores so a host can wire an engine
//! and later take a [`Snapshot`] of everything it holds.

mod audit_log;
mod ledger;
mod record_store;

use std::sync::Arc;

pub use audit_log::MemoryAuditLog;
pub use ledger::MemoryLedger;
pub use record_store::MemoryRecordStore;

use crate::adapters::file::Snapshot;
use crate::core::error::StoreError;
use crate::core::models::CatalogHandle;
use crate::core::services::{EngineSettings, ModerationEngine};

/// The three in-memory stores, shared with the engine
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    /// Canonical records
    pub records: Arc<MemoryRecordStore>,
    /// Contribution ledger
    pub ledger: Arc<MemoryLedger>,
    /// Audit log
    pub audit: Arc<MemoryAuditLog>,
}

impl MemoryBackend {
    /// Empty stores
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores restored from a snapshot
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            records: Arc::new(MemoryRecordStore::from_records(snapshot.records)),
            ledger: Arc::new(MemoryLedger::from_entries(snapshot.contributions)),
            audit: Arc::new(MemoryAuditLog::from_entries(snapshot.audit)),
        }
    }

    /// Copy out everything the stores hold
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        use crate::core::ports::RecordStore;

        Ok(Snapshot {
            records: self.records.records()?,
            contributions: self.ledger.entries()?,
            audit: self.audit.entries()?,
        })
    }

    /// An engine writing to these stores
    #[must_use]
    pub fn engine(&self, catalog: CatalogHandle, settings: EngineSettings) -> ModerationEngine {
        ModerationEngine::new(
            self.records.clone(),
            self.ledger.clone(),
            self.audit.clone(),
            catalog,
            settings,
        )
    }
}
