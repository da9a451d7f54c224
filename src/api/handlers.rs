//! Pure API handlers
//!
//! These handlers are HTTP-agnostic. They take the engine, the caller's
//! identity and typed input, and return `Result<T, ApiError>`.

use crate::core::models::{
    AuditEntry, ContributionEntry, ContributionId, ContributionStatus, Issue, Page, PageRequest,
    Triple, User,
};
use crate::core::ports::LedgerFilter;
use crate::core::services::{IssueFilter, ModerationEngine, SubmitOutcome};

use super::error::ApiError;
use super::types::{
    HistoryData, InvalidateIssueRequest, RecordData, ReviewData, ReviewRequest, SubmitRequest,
};

// =============================================================================
// CONTRIBUTIONS
// =============================================================================

/// Propose a value; applied directly on open fields, queued otherwise
pub fn submit(
    engine: &ModerationEngine,
    user: &User,
    req: SubmitRequest,
) -> Result<SubmitOutcome, ApiError> {
    let triple = req.triple();
    Ok(engine.submit(&triple, req.value, req.source_note, user)?)
}

/// Approve, reject or delete a pending contribution
pub fn review(
    engine: &ModerationEngine,
    reviewer: &User,
    id: ContributionId,
    req: ReviewRequest,
) -> Result<ReviewData, ApiError> {
    let outcome = engine.review(id, req.action, reviewer)?;
    let notice = (outcome.status == ContributionStatus::Superseded).then(|| {
        "The record changed after this contribution was made; review the current value".to_string()
    });
    Ok(ReviewData {
        entry_id: outcome.entry_id,
        status: outcome.status,
        version: outcome.version,
        notice,
    })
}

/// One page of contributions matching the filter (pending by default)
pub fn list_pending(
    engine: &ModerationEngine,
    filter: &LedgerFilter,
    page: PageRequest,
) -> Result<Page<ContributionEntry>, ApiError> {
    Ok(engine.list_pending(filter, page)?)
}

/// A single contribution
pub fn get_contribution(
    engine: &ModerationEngine,
    id: ContributionId,
) -> Result<ContributionEntry, ApiError> {
    Ok(engine.get_contribution(id)?)
}

// =============================================================================
// ISSUES
// =============================================================================

/// One page of current issues
pub fn list_issues(
    engine: &ModerationEngine,
    filter: &IssueFilter,
    page: PageRequest,
) -> Result<Page<Issue>, ApiError> {
    Ok(engine.list_issues(filter, page)?)
}

/// Mark a detected issue as not a real problem (superuser only)
pub fn invalidate_issue(
    engine: &ModerationEngine,
    user: &User,
    req: InvalidateIssueRequest,
) -> Result<AuditEntry, ApiError> {
    let triple = req.triple();
    Ok(engine.invalidate_issue(&triple, req.kind, req.note, user)?)
}

// =============================================================================
// RECORDS
// =============================================================================

/// Current value of a record
pub fn get_record(engine: &ModerationEngine, triple: Triple) -> Result<RecordData, ApiError> {
    let record = engine.get_record(&triple)?;
    Ok(RecordData { triple, record })
}

/// Audit trail of a record, oldest first
pub fn get_history(engine: &ModerationEngine, triple: Triple) -> Result<HistoryData, ApiError> {
    let entries = engine.get_history(&triple)?.collect();
    Ok(HistoryData { triple, entries })
}
