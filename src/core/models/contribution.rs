//! Contribution model
//!
//! A contribution is a proposed edit to one canonical record. Its status
//! follows a small lifecycle graph:
//!
//! ```text
//! Pending ──> Approved ──> Applied
//!    │            └──────> Superseded
//!    ├──> Rejected
//!    └──> Superseded
//! ```
//!
//! `Applied`, `Rejected` and `Superseded` are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FieldValue, Triple};

/// Ledger-assigned identifier of a contribution
pub type ContributionId = u64;

/// Lifecycle status of a contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionStatus {
    /// Waiting for review
    Pending,
    /// Accepted by a reviewer, not yet written
    Approved,
    /// Declined or deleted by a reviewer
    Rejected,
    /// Written to the canonical record
    Applied,
    /// The record changed after the proposal was made
    Superseded,
}

impl ContributionStatus {
    /// Whether no further transition is allowed
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Applied | Self::Rejected | Self::Superseded)
    }

    /// Whether `self -> next` is an edge of the lifecycle graph
    ///
    /// `Approved -> Pending` releases a claim whose record write failed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Rejected | Self::Superseded)
                | (Self::Approved, Self::Applied | Self::Superseded | Self::Pending)
        )
    }
}

impl std::fmt::Display for ContributionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Applied => write!(f, "applied"),
            Self::Superseded => write!(f, "superseded"),
        }
    }
}

impl std::str::FromStr for ContributionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "applied" => Ok(Self::Applied),
            "superseded" => Ok(Self::Superseded),
            _ => Err(format!(
                "Invalid status: {s}. Use: pending, approved, rejected, applied, superseded"
            )),
        }
    }
}

/// A proposal before the ledger has assigned it an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewContribution {
    /// Record the proposal targets
    pub triple: Triple,
    /// Proposed value
    pub proposed_value: FieldValue,
    /// Optional provenance note (e.g. link to the statement of accounts)
    pub source_note: Option<String>,
    /// Submitting user id
    pub submitted_by: String,
    /// Record version the submitter last saw (0 when absent)
    pub based_on_version: u64,
    /// Initial status: `Pending`, or `Applied` for direct writes
    pub status: ContributionStatus,
}

/// A proposal stored in the contribution ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionEntry {
    /// Ledger id
    pub id: ContributionId,

    /// Record the proposal targets
    pub triple: Triple,

    /// Proposed value
    pub proposed_value: FieldValue,

    /// Optional provenance note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_note: Option<String>,

    /// Submitting user id
    pub submitted_by: String,

    /// When the proposal was made
    pub submitted_at: DateTime<Utc>,

    /// Record version the submitter last saw
    pub based_on_version: u64,

    /// Current lifecycle status
    pub status: ContributionStatus,

    /// Who moved the entry out of `Pending`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,

    /// When the entry last changed status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ContributionEntry {
    /// Materialize a new contribution under the given id
    #[must_use]
    pub fn from_new(id: ContributionId, new: NewContribution) -> Self {
        let now = Utc::now();
        let resolved = new.status.is_terminal();
        Self {
            id,
            resolved_by: resolved.then(|| new.submitted_by.clone()),
            resolved_at: resolved.then_some(now),
            triple: new.triple,
            proposed_value: new.proposed_value,
            source_note: new.source_note,
            submitted_by: new.submitted_by,
            submitted_at: now,
            based_on_version: new.based_on_version,
            status: new.status,
        }
    }
}
