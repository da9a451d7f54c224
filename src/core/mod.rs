//! Core domain logic for civic-ledger
//!
//! This module contains pure business logic with no I/O dependencies.
//! All storage is abstracted through port traits.
//!
//! ## Architecture
//!
//! - `models/` - Domain types (Triple, CanonicalRecord, ContributionEntry, Issue, AuditEntry)
//! - `services/` - Authorization, issue detection, moderation
//! - `ports/` - Trait definitions for storage backends
//! - `error` - Typed failures

pub mod error;
pub mod models;
pub mod ports;
pub mod services;
