//! Adapter implementations for port traits
//!
//! - `memory/` - in-process stores with atomic compare-and-set and transitions
//! - `file/` - JSON snapshot of the memory stores

pub mod file;
pub mod memory;

pub use file::{FileStore, Snapshot, StateLock};
pub use memory::{MemoryAuditLog, MemoryBackend, MemoryLedger, MemoryRecordStore};
