//! API request and response types
//!
//! All types are framework-agnostic and can be used by any client.

use serde::{Deserialize, Serialize};

use super::error::ApiErrorData;
use crate::core::models::{
    AuditEntry, CanonicalRecord, ContributionStatus, FieldValue, IssueKind, Triple,
};
use crate::core::services::ReviewAction;

// =============================================================================
// RESPONSE ENVELOPE
// =============================================================================

/// Standard API response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorData>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response
    #[must_use]
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Create an error response
    #[must_use]
    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiErrorData {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Request body for proposing a value
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    /// Council slug
    pub council: String,
    /// Field slug
    pub field: String,
    /// Financial year id
    pub year: String,
    /// Proposed value (JSON number or string)
    pub value: FieldValue,
    /// Where the value comes from
    #[serde(default)]
    pub source_note: Option<String>,
}

impl SubmitRequest {
    /// The record this request targets
    #[must_use]
    pub fn triple(&self) -> Triple {
        Triple::new(&self.council, &self.field, &self.year)
    }
}

/// Request body for reviewing a contribution
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReviewRequest {
    /// approve, reject or delete
    pub action: ReviewAction,
}

/// Request body for marking an issue invalid
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateIssueRequest {
    /// Council slug
    pub council: String,
    /// Field slug
    pub field: String,
    /// Financial year id
    pub year: String,
    /// missing or suspicious
    pub kind: IssueKind,
    /// Why the issue is not real
    #[serde(default)]
    pub note: Option<String>,
}

impl InvalidateIssueRequest {
    /// The record the issue concerns
    #[must_use]
    pub fn triple(&self) -> Triple {
        Triple::new(&self.council, &self.field, &self.year)
    }
}

// =============================================================================
// RESPONSE DATA TYPES
// =============================================================================

/// Review response data
#[derive(Debug, Clone, Serialize)]
pub struct ReviewData {
    /// Contribution id
    pub entry_id: u64,
    /// `applied`, `rejected` or `superseded`
    pub status: ContributionStatus,
    /// New record version, when applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Set when the record changed since the proposal was made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Record lookup response data
#[derive(Debug, Clone, Serialize)]
pub struct RecordData {
    /// The triple asked for
    pub triple: Triple,
    /// Current record, absent when nothing was ever recorded
    pub record: Option<CanonicalRecord>,
}

/// History response data
#[derive(Debug, Clone, Serialize)]
pub struct HistoryData {
    /// The triple asked for
    pub triple: Triple,
    /// Audit entries, oldest first
    pub entries: Vec<AuditEntry>,
}
