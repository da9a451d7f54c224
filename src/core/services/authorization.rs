//! Authorization gate
//!
//! Maps (authority, action, field sensitivity) to a decision. The table in
//! this module is the only place tier thresholds are written down; every
//! other component asks [`authorize`].
//!
//! | action            | Open                 | Moderated            | Restricted           |
//! |-------------------|----------------------|----------------------|----------------------|
//! | submit            | tier >= 1, apply     | tier >= 1, queue     | tier >= 1, queue     |
//! | approve / reject  | tier >= 3            | tier >= 3            | tier >= 5            |
//! | delete            | tier >= 5            | tier >= 5            | tier >= 5            |
//! | invalidate issue  | superuser            | superuser            | superuser            |
//!
//! Superusers clear every tier threshold. Review actions on `Open` fields
//! only arise for entries queued before a field was reclassified; they use
//! the `Moderated` thresholds.

use serde::{Deserialize, Serialize};

use crate::core::models::{Authority, Sensitivity, Tier};

/// Lowest tier allowed to contribute
pub const CONTRIBUTOR_TIER: Tier = Tier(1);
/// Lowest tier allowed to review moderated fields
pub const REVIEWER_TIER: Tier = Tier(3);
/// Lowest tier allowed to review restricted fields and delete proposals
pub const ELEVATED_TIER: Tier = Tier(5);

/// Something a user attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Propose a value
    Submit,
    /// Accept a pending proposal
    Approve,
    /// Decline a pending proposal
    Reject,
    /// Remove a pending proposal
    Delete,
    /// Mark a detected issue as not a real problem
    InvalidateIssue,
}

impl Action {
    /// Every action, in table order
    pub const ALL: [Self; 5] = [
        Self::Submit,
        Self::Approve,
        Self::Reject,
        Self::Delete,
        Self::InvalidateIssue,
    ];

    const fn index(self) -> usize {
        match self {
            Self::Submit => 0,
            Self::Approve => 1,
            Self::Reject => 2,
            Self::Delete => 3,
            Self::InvalidateIssue => 4,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submit => write!(f, "submit"),
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
            Self::Delete => write!(f, "delete"),
            Self::InvalidateIssue => write!(f, "invalidate issues"),
        }
    }
}

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Submit may write straight to the record store
    DirectApply,
    /// Submit is allowed but must wait for review
    RequireReview,
    /// Review action is allowed
    Allow,
    /// Not permitted
    Deny,
}

impl Decision {
    /// Whether the action may go ahead in any form
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        !matches!(self, Self::Deny)
    }
}

#[derive(Debug, Clone, Copy)]
enum Rule {
    Apply(Tier),
    Queue(Tier),
    Permit(Tier),
    SuperuserOnly,
}

const TABLE: [[Rule; 3]; 5] = [
    // Open, Moderated, Restricted
    [
        Rule::Apply(CONTRIBUTOR_TIER),
        Rule::Queue(CONTRIBUTOR_TIER),
        Rule::Queue(CONTRIBUTOR_TIER),
    ],
    [
        Rule::Permit(REVIEWER_TIER),
        Rule::Permit(REVIEWER_TIER),
        Rule::Permit(ELEVATED_TIER),
    ],
    [
        Rule::Permit(REVIEWER_TIER),
        Rule::Permit(REVIEWER_TIER),
        Rule::Permit(ELEVATED_TIER),
    ],
    [
        Rule::Permit(ELEVATED_TIER),
        Rule::Permit(ELEVATED_TIER),
        Rule::Permit(ELEVATED_TIER),
    ],
    [Rule::SuperuserOnly, Rule::SuperuserOnly, Rule::SuperuserOnly],
];

/// Decide whether `authority` may perform `action` on a field of `sensitivity`
///
/// Pure and total: every combination yields a decision.
#[must_use]
pub fn authorize(authority: Authority, action: Action, sensitivity: Sensitivity) -> Decision {
    let decision = match TABLE[action.index()][sensitivity.index()] {
        Rule::Apply(min) if authority.meets(min) => Decision::DirectApply,
        Rule::Queue(min) if authority.meets(min) => Decision::RequireReview,
        Rule::Permit(min) if authority.meets(min) => Decision::Allow,
        Rule::SuperuserOnly if authority.superuser => Decision::Allow,
        _ => Decision::Deny,
    };
    log::debug!(
        "authorize {} (superuser={}) {action} on {sensitivity}: {decision:?}",
        authority.tier,
        authority.superuser
    );
    decision
}
