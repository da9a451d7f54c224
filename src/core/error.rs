//! Error types for the engine and its ports
//!
//! Every failure is a discriminated variant; callers match on the variant,
//! never on the message.

use thiserror::Error;

use super::models::{
    ContributionId, ContributionStatus, FieldKind, IssueKind, Sensitivity, Triple,
};
use super::services::authorization::Action;

/// Failures reported by port implementations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Compare-and-set saw a different version than expected
    #[error("version conflict on {triple}: expected {expected}, found {actual}")]
    VersionConflict {
        /// Record being written
        triple: Triple,
        /// Version the caller expected
        expected: u64,
        /// Version actually stored
        actual: u64,
    },

    /// No ledger entry with this id
    #[error("contribution {0} not found")]
    EntryNotFound(ContributionId),

    /// Another caller changed the entry's status first
    #[error("contribution {id} is {actual}, expected {expected}")]
    StaleTransition {
        /// Entry id
        id: ContributionId,
        /// Status the caller expected
        expected: ContributionStatus,
        /// Status actually stored
        actual: ContributionStatus,
    },

    /// The requested status change is not an edge of the lifecycle graph
    #[error("contribution {id}: illegal transition {from} -> {to}")]
    InvalidTransition {
        /// Entry id
        id: ContributionId,
        /// Current status
        from: ContributionStatus,
        /// Requested status
        to: ContributionStatus,
    },

    /// The backend could not serve the request
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// What a `NotFound` refers to
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Missing {
    /// Unknown council slug
    #[error("council '{0}'")]
    Council(String),
    /// Unknown field slug
    #[error("field '{0}'")]
    Field(String),
    /// Unknown financial year
    #[error("financial year '{0}'")]
    Year(String),
    /// Unknown contribution id
    #[error("contribution {0}")]
    Contribution(ContributionId),
    /// No such issue is currently detected
    #[error("{kind} issue on {triple}")]
    Issue {
        /// Record the issue would concern
        triple: Triple,
        /// Kind of issue
        kind: IssueKind,
    },
}

/// Why a submitted value was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueProblem {
    /// Value type does not match the field
    #[error("field expects a {expected} value, got {actual}")]
    WrongKind {
        /// Kind the field accepts
        expected: FieldKind,
        /// Kind supplied
        actual: FieldKind,
    },
    /// NaN or infinite number
    #[error("number is not finite")]
    NotFinite,
}

/// Failures of engine operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Referenced council, field, year or contribution does not exist
    #[error("not found: {0}")]
    NotFound(Missing),

    /// The user's tier does not permit the action
    #[error("{user} may not {action} on a {sensitivity} field")]
    Forbidden {
        /// Acting user id
        user: String,
        /// Attempted action
        action: Action,
        /// Sensitivity of the field involved
        sensitivity: Sensitivity,
    },

    /// The contribution is not in a state the action applies to
    #[error("contribution {id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Entry id
        id: ContributionId,
        /// Current status
        from: ContributionStatus,
        /// Status the action would produce
        to: ContributionStatus,
    },

    /// Another reviewer resolved the contribution first
    #[error("contribution {id} was already resolved (now {status})")]
    AlreadyResolved {
        /// Entry id
        id: ContributionId,
        /// Status set by the other reviewer
        status: ContributionStatus,
    },

    /// Direct apply kept losing races and gave up
    #[error("{triple} is being edited concurrently; gave up after {attempts} attempts")]
    Contended {
        /// Record being written
        triple: Triple,
        /// Attempts made
        attempts: u32,
    },

    /// The submitted value does not fit the field
    #[error("invalid value for {field}: {problem}")]
    InvalidValue {
        /// Field slug
        field: String,
        /// What is wrong
        problem: ValueProblem,
    },

    /// A port failed for reasons unrelated to the request
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EntryNotFound(id) => Self::NotFound(Missing::Contribution(id)),
            StoreError::StaleTransition { id, actual, .. } => Self::AlreadyResolved {
                id,
                status: actual,
            },
            StoreError::InvalidTransition { id, from, to } => {
                Self::InvalidTransition { id, from, to }
            },
            StoreError::VersionConflict { triple, .. } => Self::Contended {
                triple,
                attempts: 1,
            },
            StoreError::Unavailable(msg) => Self::Storage(msg),
        }
    }
}
