//! Audit log port

use crate::core::error::StoreError;
use crate::core::models::{AuditEntry, Triple};

/// Append-only audit trail
///
/// No update or delete operation exists.
pub trait AuditLog: Send + Sync {
    /// Append an entry; the log assigns and returns its sequence number
    fn record(&self, entry: AuditEntry) -> Result<u64, StoreError>;

    /// Entries for one triple, ordered by timestamp then sequence number
    fn history(&self, triple: &Triple) -> Result<Vec<AuditEntry>, StoreError>;

    /// Every issue invalidation across all triples, in recording order
    fn invalidations(&self) -> Result<Vec<AuditEntry>, StoreError>;
}
