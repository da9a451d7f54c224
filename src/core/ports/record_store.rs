//! Record store port
//!
//! Key-value view over canonical records with optimistic versioning.

use crate::core::error::StoreError;
use crate::core::models::{CanonicalRecord, FieldValue, Triple};

/// Store of canonical (council, field, year) values
///
/// `compare_and_set` is the only mutation path. Implementations must make
/// it atomic per triple: two callers passing the same `expected_version`
/// can never both succeed.
pub trait RecordStore: Send + Sync {
    /// Current record for a triple; `None` means no value has been recorded
    fn get(&self, triple: &Triple) -> Result<Option<CanonicalRecord>, StoreError>;

    /// Write `value` if the stored version equals `expected_version`
    ///
    /// An absent record has version 0. Returns the new version, which is
    /// always `expected_version + 1`.
    fn compare_and_set(
        &self,
        triple: &Triple,
        expected_version: u64,
        value: FieldValue,
    ) -> Result<u64, StoreError>;

    /// All records, in no particular order
    fn records(&self) -> Result<Vec<CanonicalRecord>, StoreError>;

    /// Current version of a triple (0 when absent)
    fn current_version(&self, triple: &Triple) -> Result<u64, StoreError> {
        Ok(self.get(triple)?.map_or(0, |r| r.version))
    }
}
