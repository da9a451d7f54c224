//! Business logic services
//!
//! Pure orchestration logic over the port traits.
//!
//! - [`authorization`] - The tier/action/sensitivity decision table
//! - [`detector`] - Missing and suspicious value detection
//! - [`moderation`] - Submit and review orchestration

pub mod authorization;
pub mod detector;
pub mod moderation;

pub use authorization::{Action, Decision, authorize};
pub use detector::{IssueDetector, IssueScan, ScanScope, evaluate};
pub use moderation::{
    EngineSettings, IssueFilter, ModerationEngine, ReviewAction, ReviewOutcome, SubmitOutcome,
};
