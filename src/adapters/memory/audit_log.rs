//! In-memory audit log

use std::sync::RwLock;

use crate::core::error::StoreError;
use crate::core::models::{AuditAction, AuditEntry, Triple};
use crate::core::ports::AuditLog;

/// Append-only audit log backed by a `Vec`
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log holding existing entries (e.g. from a snapshot)
    #[must_use]
    pub fn from_entries(mut entries: Vec<AuditEntry>) -> Self {
        entries.sort_by_key(|e| e.seq);
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Every entry, in recording order
    pub fn entries(&self) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self.poisoned(self.entries.read())?.clone())
    }

    fn poisoned<G, E>(&self, guard: Result<G, E>) -> Result<G, StoreError> {
        guard.map_err(|_| StoreError::Unavailable("audit log lock poisoned".to_string()))
    }
}

impl AuditLog for MemoryAuditLog {
    fn record(&self, mut entry: AuditEntry) -> Result<u64, StoreError> {
        let mut entries = self.poisoned(self.entries.write())?;
        entry.seq = entries.last().map_or(0, |e| e.seq) + 1;
        let seq = entry.seq;
        entries.push(entry);
        Ok(seq)
    }

    fn history(&self, triple: &Triple) -> Result<Vec<AuditEntry>, StoreError> {
        let mut history: Vec<_> = self
            .poisoned(self.entries.read())?
            .iter()
            .filter(|e| e.triple == *triple)
            .cloned()
            .collect();
        history.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.seq.cmp(&b.seq)));
        Ok(history)
    }

    fn invalidations(&self) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self
            .poisoned(self.entries.read())?
            .iter()
            .filter(|e| matches!(e.action, AuditAction::IssueInvalidated(_)))
            .cloned()
            .collect())
    }
}
