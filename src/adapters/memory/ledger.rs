//! In-memory contribution ledger

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::core::error::StoreError;
use crate::core::models::{ContributionEntry, ContributionId, ContributionStatus, NewContribution};
use crate::core::ports::{ContributionLedger, LedgerFilter};

#[derive(Debug, Default)]
struct LedgerState {
    next_id: ContributionId,
    entries: BTreeMap<ContributionId, ContributionEntry>,
}

/// Ledger backed by a `BTreeMap` behind a `Mutex`
///
/// Every transition checks and updates the status under the same lock.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    /// Create an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger holding existing entries; new ids continue after the
    /// highest one
    #[must_use]
    pub fn from_entries(entries: Vec<ContributionEntry>) -> Self {
        let next_id = entries.iter().map(|e| e.id).max().unwrap_or(0);
        Self {
            state: Mutex::new(LedgerState {
                next_id,
                entries: entries.into_iter().map(|e| (e.id, e)).collect(),
            }),
        }
    }

    /// Every entry, ordered by id
    pub fn entries(&self) -> Result<Vec<ContributionEntry>, StoreError> {
        Ok(self.lock()?.entries.values().cloned().collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("ledger lock poisoned".to_string()))
    }
}

impl ContributionLedger for MemoryLedger {
    fn create(&self, contribution: NewContribution) -> Result<ContributionId, StoreError> {
        let mut state = self.lock()?;
        state.next_id += 1;
        let id = state.next_id;
        state.entries.insert(id, ContributionEntry::from_new(id, contribution));
        Ok(id)
    }

    fn get(&self, id: ContributionId) -> Result<Option<ContributionEntry>, StoreError> {
        Ok(self.lock()?.entries.get(&id).cloned())
    }

    fn list(&self, filter: &LedgerFilter) -> Result<Vec<ContributionEntry>, StoreError> {
        Ok(self
            .lock()?
            .entries
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    fn transition(
        &self,
        id: ContributionId,
        next: ContributionStatus,
        expected: ContributionStatus,
        actor: &str,
    ) -> Result<ContributionEntry, StoreError> {
        let mut state = self.lock()?;
        let entry = state.entries.get_mut(&id).ok_or(StoreError::EntryNotFound(id))?;

        if entry.status != expected {
            return Err(StoreError::StaleTransition {
                id,
                expected,
                actual: entry.status,
            });
        }
        if !entry.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                id,
                from: entry.status,
                to: next,
            });
        }

        entry.status = next;
        if next == ContributionStatus::Pending {
            entry.resolved_by = None;
            entry.resolved_at = None;
        } else {
            entry.resolved_by = Some(actor.to_string());
            entry.resolved_at = Some(Utc::now());
        }
        Ok(entry.clone())
    }
}
