//! Domain models for civic-ledger
//!
//! Pure data structures with no I/O dependencies.
//!
//! - [`Council`], [`Field`], [`FinancialYear`] - reference data
//! - [`CanonicalRecord`] - "the current value for this triple"
//! - [`ContributionEntry`] - "I propose this value"
//! - [`Issue`] - "this value looks missing or wrong"
//! - [`AuditEntry`] - "this happened, by whom"

mod audit;
mod catalog;
mod contribution;
mod issue;
mod page;
mod record;
mod reference;
mod user;

pub use audit::{AuditAction, AuditEntry};
pub use catalog::{Catalog, CatalogHandle, PlausibilityRule};
pub use contribution::{ContributionEntry, ContributionId, ContributionStatus, NewContribution};
pub use issue::{Issue, IssueKind, SuspicionReason};
pub use page::{Page, PageRequest};
pub use record::{CanonicalRecord, FieldValue, Triple};
pub use reference::{Council, Field, FieldCategory, FieldKind, FinancialYear, Sensitivity};
pub use user::{Authority, Tier, User};
