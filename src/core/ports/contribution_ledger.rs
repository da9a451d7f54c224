//! Contribution ledger port
//!
//! Append-only log of proposed edits with atomic status transitions.

use serde::{Deserialize, Serialize};

use crate::core::error::StoreError;
use crate::core::models::{ContributionEntry, ContributionId, ContributionStatus, NewContribution};

/// Filter for listing ledger entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFilter {
    /// Council slug
    #[serde(default)]
    pub council: Option<String>,
    /// Field slug
    #[serde(default)]
    pub field: Option<String>,
    /// Financial year id
    #[serde(default)]
    pub year: Option<String>,
    /// Lifecycle status
    #[serde(default)]
    pub status: Option<ContributionStatus>,
    /// Submitting user id
    #[serde(default)]
    pub submitted_by: Option<String>,
}

impl LedgerFilter {
    /// Whether an entry passes every set criterion
    #[must_use]
    pub fn matches(&self, entry: &ContributionEntry) -> bool {
        self.council.as_ref().is_none_or(|c| *c == entry.triple.council)
            && self.field.as_ref().is_none_or(|f| *f == entry.triple.field)
            && self.year.as_ref().is_none_or(|y| *y == entry.triple.year)
            && self.status.is_none_or(|s| s == entry.status)
            && self.submitted_by.as_ref().is_none_or(|u| *u == entry.submitted_by)
    }
}

/// Ledger of contributions
///
/// Entries are never removed. `transition` must be atomic per entry: of two
/// callers expecting the same current status, exactly one succeeds and the
/// other gets [`StoreError::StaleTransition`].
pub trait ContributionLedger: Send + Sync {
    /// Append a contribution, returning its id
    fn create(&self, contribution: NewContribution) -> Result<ContributionId, StoreError>;

    /// Look up an entry
    fn get(&self, id: ContributionId) -> Result<Option<ContributionEntry>, StoreError>;

    /// Entries matching the filter, ordered by id
    fn list(&self, filter: &LedgerFilter) -> Result<Vec<ContributionEntry>, StoreError>;

    /// Move an entry from `expected` to `next` on behalf of `actor`
    ///
    /// Fails with `StaleTransition` if the entry is not in `expected`, and
    /// with `InvalidTransition` if `expected -> next` is not a lifecycle edge.
    fn transition(
        &self,
        id: ContributionId,
        next: ContributionStatus,
        expected: ContributionStatus,
        actor: &str,
    ) -> Result<ContributionEntry, StoreError>;

    /// Entries matching the filter; status defaults to `Pending`
    fn list_pending(&self, filter: &LedgerFilter) -> Result<Vec<ContributionEntry>, StoreError> {
        let mut filter = filter.clone();
        filter.status.get_or_insert(ContributionStatus::Pending);
        self.list(&filter)
    }
}
