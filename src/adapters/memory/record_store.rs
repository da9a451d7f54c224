//! In-memory record store
//!
//! A single `RwLock` guards the map; compare-and-set holds the write lock
//! for the version check and the insert, which makes it atomic per triple.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::core::error::StoreError;
use crate::core::models::{CanonicalRecord, FieldValue, Triple};
use crate::core::ports::RecordStore;

/// Record store backed by a `HashMap`
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<Triple, CanonicalRecord>>,
}

impl MemoryRecordStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records (e.g. from a snapshot)
    #[must_use]
    pub fn from_records(records: Vec<CanonicalRecord>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().map(|r| (r.triple.clone(), r)).collect()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Triple, CanonicalRecord>>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::Unavailable("record store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Triple, CanonicalRecord>>, StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Unavailable("record store lock poisoned".to_string()))
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, triple: &Triple) -> Result<Option<CanonicalRecord>, StoreError> {
        Ok(self.read()?.get(triple).cloned())
    }

    fn compare_and_set(
        &self,
        triple: &Triple,
        expected_version: u64,
        value: FieldValue,
    ) -> Result<u64, StoreError> {
        let mut records = self.write()?;
        let actual = records.get(triple).map_or(0, |r| r.version);
        if actual != expected_version {
            return Err(StoreError::VersionConflict {
                triple: triple.clone(),
                expected: expected_version,
                actual,
            });
        }

        let version = actual + 1;
        records.insert(
            triple.clone(),
            CanonicalRecord {
                triple: triple.clone(),
                value,
                version,
                last_modified: Utc::now(),
            },
        );
        Ok(version)
    }

    fn records(&self) -> Result<Vec<CanonicalRecord>, StoreError> {
        let mut records: Vec<_> = self.read()?.values().cloned().collect();
        records.sort_by(|a, b| a.triple.cmp(&b.triple));
        Ok(records)
    }
}
