//! civic-ledger - contribution and moderation engine for council financial data
//!
//! Crowd-sourced corrections to a canonical dataset of council figures are
//! routed by field sensitivity and user tier: applied directly, or queued for
//! review and applied only if the record has not changed in the meantime.
//! Missing and implausible values are detected on demand, and every change
//! leaves an audit trail.

// Deny all clippy warnings in this crate
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cargo_common_metadata
)]

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod output;
pub mod paths;
pub mod workspace;

pub use workspace::Workspace;
