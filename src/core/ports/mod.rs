//! Port traits (interfaces) for external dependencies
//!
//! These traits define the boundaries between core business logic
//! and storage backends.
//!
//! Implementations live in the `adapters` module.
//!
//! ## Design Principle
//!
//! The core domain logic depends only on these traits, never on concrete
//! implementations. A database-backed store only has to honour the same
//! atomicity contracts as the in-memory one.

mod audit_log;
mod contribution_ledger;
mod record_store;

pub use audit_log::AuditLog;
pub use contribution_ledger::{ContributionLedger, LedgerFilter};
pub use record_store::RecordStore;
