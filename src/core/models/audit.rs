//! Audit entries
//!
//! One immutable entry per state transition. The log assigns `seq`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContributionId, FieldValue, IssueKind, Triple};

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "kind", rename_all = "snake_case")]
pub enum AuditAction {
    /// A proposal was queued for review
    Submitted,
    /// A reviewer accepted a proposal
    Approved,
    /// A value was written to the canonical record
    Applied,
    /// A reviewer declined a proposal
    Rejected,
    /// A reviewer deleted a pending proposal
    Deleted,
    /// A proposal went stale before it could be applied
    Superseded,
    /// A superuser marked a detected issue as invalid
    IssueInvalidated(IssueKind),
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::Approved => write!(f, "approved"),
            Self::Applied => write!(f, "applied"),
            Self::Rejected => write!(f, "rejected"),
            Self::Deleted => write!(f, "deleted"),
            Self::Superseded => write!(f, "superseded"),
            Self::IssueInvalidated(kind) => write!(f, "invalidated {kind} issue"),
        }
    }
}

/// An immutable audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the log (assigned on record)
    pub seq: u64,

    /// User id that caused the transition
    pub actor: String,

    /// Transition kind
    pub action: AuditAction,

    /// Contribution the transition belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contribution_id: Option<ContributionId>,

    /// Record affected
    pub triple: Triple,

    /// Canonical value before the transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_value: Option<FieldValue>,

    /// Value the transition concerns (applied or proposed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_value: Option<FieldValue>,

    /// Record version after the transition
    pub record_version: u64,

    /// Free-form provenance note carried from the contribution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// When the transition happened
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Start an entry for `actor` doing `action` on `triple`
    pub fn new(actor: impl Into<String>, action: AuditAction, triple: Triple) -> Self {
        Self {
            seq: 0,
            actor: actor.into(),
            action,
            contribution_id: None,
            triple,
            before_value: None,
            after_value: None,
            record_version: 0,
            note: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the contribution id
    #[must_use]
    pub const fn contribution(mut self, id: ContributionId) -> Self {
        self.contribution_id = Some(id);
        self
    }

    /// Attach before/after values
    #[must_use]
    pub fn values(mut self, before: Option<FieldValue>, after: Option<FieldValue>) -> Self {
        self.before_value = before;
        self.after_value = after;
        self
    }

    /// Attach the record version after the transition
    #[must_use]
    pub const fn at_version(mut self, version: u64) -> Self {
        self.record_version = version;
        self
    }

    /// Attach a note
    #[must_use]
    pub fn note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }
}
