//! Moderation engine
//!
//! Accepts proposals, routes them through the authorization gate, applies
//! them directly or queues them, and resolves review decisions against the
//! ledger and the record store.
//!
//! ## Conflict rule
//!
//! A proposal carries the record version its author saw. Approval only
//! writes if that version is still current; otherwise the proposal becomes
//! `Superseded`. Together with the store's atomic compare-and-set this means
//! that of several proposals against the same base version at most one is
//! ever applied, and the rest stay in the ledger for resubmission.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::authorization::{Action, Decision, authorize};
use super::detector::{IssueDetector, IssueScan, ScanScope};
use crate::core::error::{EngineError, Missing, StoreError, ValueProblem};
use crate::core::models::{
    AuditAction, AuditEntry, CanonicalRecord, Catalog, CatalogHandle, ContributionEntry,
    ContributionId, ContributionStatus, Field, FieldValue, Issue, IssueKind, NewContribution, Page,
    PageRequest, Sensitivity, Triple, User,
};
use crate::core::ports::{AuditLog, ContributionLedger, LedgerFilter, RecordStore};

/// Result of writing an approved proposal to the record store
enum ApprovedWrite {
    Applied {
        before: Option<FieldValue>,
        version: u64,
    },
    Stale,
}

/// Engine tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Compare-and-set attempts for a direct apply before giving up
    #[serde(default = "default_max_apply_attempts")]
    pub max_apply_attempts: u32,
}

const fn default_max_apply_attempts() -> u32 {
    3
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_apply_attempts: default_max_apply_attempts(),
        }
    }
}

/// A reviewer's decision on a pending contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    /// Write the proposal if it is still current
    Approve,
    /// Decline the proposal
    Reject,
    /// Remove the proposal (recorded as rejected)
    Delete,
}

impl ReviewAction {
    /// The authorization action this review needs
    #[must_use]
    pub const fn action(self) -> Action {
        match self {
            Self::Approve => Action::Approve,
            Self::Reject => Action::Reject,
            Self::Delete => Action::Delete,
        }
    }

    /// Status the entry ends in when the review succeeds
    #[must_use]
    pub const fn target_status(self) -> ContributionStatus {
        match self {
            Self::Approve => ContributionStatus::Applied,
            Self::Reject | Self::Delete => ContributionStatus::Rejected,
        }
    }
}

impl std::fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.action())
    }
}

impl std::str::FromStr for ReviewAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "delete" => Ok(Self::Delete),
            _ => Err(format!("Invalid review action: {s}. Use: approve, reject, delete")),
        }
    }
}

/// Result of a submit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    /// `Applied` or `Pending`
    pub status: ContributionStatus,
    /// Ledger id of the contribution
    pub entry_id: ContributionId,
    /// New record version, when applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

/// Result of a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewOutcome {
    /// Ledger id of the contribution
    pub entry_id: ContributionId,
    /// `Applied`, `Rejected` or `Superseded`
    pub status: ContributionStatus,
    /// New record version, when applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

/// Filter for listing issues
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFilter {
    /// Missing or suspicious
    #[serde(default)]
    pub kind: Option<IssueKind>,
    /// Council slug
    #[serde(default)]
    pub council: Option<String>,
    /// Field slug
    #[serde(default)]
    pub field: Option<String>,
    /// Financial year id
    #[serde(default)]
    pub year: Option<String>,
}

impl IssueFilter {
    fn scope(&self) -> ScanScope {
        ScanScope {
            councils: self.council.iter().cloned().collect(),
            fields: self.field.iter().cloned().collect(),
            years: self.year.iter().cloned().collect(),
        }
    }
}

/// The contribution and moderation engine
pub struct ModerationEngine {
    records: Arc<dyn RecordStore>,
    ledger: Arc<dyn ContributionLedger>,
    audit: Arc<dyn AuditLog>,
    catalog: CatalogHandle,
    settings: EngineSettings,
}

impl std::fmt::Debug for ModerationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModerationEngine")
            .field("catalog", &self.catalog)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ModerationEngine {
    /// Wire an engine to its ports
    #[must_use]
    pub fn new(
        records: Arc<dyn RecordStore>,
        ledger: Arc<dyn ContributionLedger>,
        audit: Arc<dyn AuditLog>,
        catalog: CatalogHandle,
        settings: EngineSettings,
    ) -> Self {
        Self {
            records,
            ledger,
            audit,
            catalog,
            settings,
        }
    }

    /// The catalog handle, for hosts that reload configuration
    #[must_use]
    pub const fn catalog_handle(&self) -> &CatalogHandle {
        &self.catalog
    }

    /// The catalog in effect right now
    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.snapshot()
    }

    // =========================================================================
    // SUBMIT
    // =========================================================================

    /// Propose `value` for `triple` on behalf of `user`
    ///
    /// Open fields are written immediately (retrying compare-and-set up to
    /// `max_apply_attempts` times); other fields get a pending entry.
    pub fn submit(
        &self,
        triple: &Triple,
        value: FieldValue,
        source_note: Option<String>,
        user: &User,
    ) -> Result<SubmitOutcome, EngineError> {
        let max_attempts = self.settings.max_apply_attempts.max(1);

        for attempt in 1..=max_attempts {
            let catalog = self.catalog.snapshot();
            let field = resolve(&catalog, triple)?;
            check_value(field, &value)?;

            let current = self.records.get(triple)?;
            let version = current.as_ref().map_or(0, |r| r.version);
            let before = current.map(|r| r.value);

            match authorize(user.authority(), Action::Submit, field.sensitivity) {
                Decision::DirectApply => {},
                Decision::RequireReview => {
                    return self.enqueue(triple, value, source_note, user, version, before);
                },
                // Allow is only produced for review actions
                Decision::Allow | Decision::Deny => {
                    return Err(forbidden(user, Action::Submit, field.sensitivity));
                },
            }

            match self.records.compare_and_set(triple, version, value.clone()) {
                Ok(new_version) => {
                    let new = NewContribution {
                        triple: triple.clone(),
                        proposed_value: value.clone(),
                        source_note: source_note.clone(),
                        submitted_by: user.id.clone(),
                        based_on_version: version,
                        status: ContributionStatus::Applied,
                    };
                    let entry_id = self.ledger.create(new)?;
                    self.audit.record(
                        AuditEntry::new(&user.id, AuditAction::Applied, triple.clone())
                            .contribution(entry_id)
                            .values(before, Some(value))
                            .at_version(new_version)
                            .note(source_note),
                    )?;
                    log::info!("{triple}: applied #{entry_id} by {} (v{new_version})", user.id);
                    return Ok(SubmitOutcome {
                        status: ContributionStatus::Applied,
                        entry_id,
                        version: Some(new_version),
                    });
                },
                Err(StoreError::VersionConflict { actual, .. }) => {
                    log::debug!(
                        "{triple}: direct apply lost race (expected v{version}, found v{actual}), \
                         attempt {attempt}/{max_attempts}"
                    );
                },
                Err(e) => return Err(e.into()),
            }
        }

        log::warn!("{triple}: direct apply contended after {max_attempts} attempts");
        Err(EngineError::Contended {
            triple: triple.clone(),
            attempts: max_attempts,
        })
    }

    fn enqueue(
        &self,
        triple: &Triple,
        value: FieldValue,
        source_note: Option<String>,
        user: &User,
        version: u64,
        before: Option<FieldValue>,
    ) -> Result<SubmitOutcome, EngineError> {
        let new = NewContribution {
            triple: triple.clone(),
            proposed_value: value.clone(),
            source_note: source_note.clone(),
            submitted_by: user.id.clone(),
            based_on_version: version,
            status: ContributionStatus::Pending,
        };
        let entry_id = self.ledger.create(new)?;
        self.audit.record(
            AuditEntry::new(&user.id, AuditAction::Submitted, triple.clone())
                .contribution(entry_id)
                .values(before, Some(value))
                .at_version(version)
                .note(source_note),
        )?;
        log::info!("{triple}: queued #{entry_id} by {} against v{version}", user.id);
        Ok(SubmitOutcome {
            status: ContributionStatus::Pending,
            entry_id,
            version: None,
        })
    }

    // =========================================================================
    // REVIEW
    // =========================================================================

    /// Resolve a pending contribution
    ///
    /// `Superseded` is a normal outcome, not an error: the record changed
    /// since the proposal was made and the reviewer must look again.
    pub fn review(
        &self,
        id: ContributionId,
        action: ReviewAction,
        reviewer: &User,
    ) -> Result<ReviewOutcome, EngineError> {
        let entry = self.get_contribution(id)?;
        if entry.status != ContributionStatus::Pending {
            return Err(EngineError::InvalidTransition {
                id,
                from: entry.status,
                to: action.target_status(),
            });
        }

        let catalog = self.catalog.snapshot();
        let field = resolve(&catalog, &entry.triple)?;
        if authorize(reviewer.authority(), action.action(), field.sensitivity) != Decision::Allow {
            return Err(forbidden(reviewer, action.action(), field.sensitivity));
        }

        match action {
            ReviewAction::Approve => self.approve(&entry, reviewer),
            ReviewAction::Reject => self.reject(&entry, reviewer, AuditAction::Rejected),
            ReviewAction::Delete => self.reject(&entry, reviewer, AuditAction::Deleted),
        }
    }

    fn reject(
        &self,
        entry: &ContributionEntry,
        reviewer: &User,
        audit_action: AuditAction,
    ) -> Result<ReviewOutcome, EngineError> {
        self.ledger.transition(
            entry.id,
            ContributionStatus::Rejected,
            ContributionStatus::Pending,
            &reviewer.id,
        )?;
        let current = self.records.get(&entry.triple)?;
        self.audit.record(
            AuditEntry::new(&reviewer.id, audit_action, entry.triple.clone())
                .contribution(entry.id)
                .at_version(current.as_ref().map_or(0, |r| r.version))
                .values(current.map(|r| r.value), Some(entry.proposed_value.clone()))
                .note(entry.source_note.clone()),
        )?;
        log::info!("{}: #{} {audit_action} by {}", entry.triple, entry.id, reviewer.id);
        Ok(ReviewOutcome {
            entry_id: entry.id,
            status: ContributionStatus::Rejected,
            version: None,
        })
    }

    fn approve(&self, entry: &ContributionEntry, reviewer: &User) -> Result<ReviewOutcome, EngineError> {
        // Claiming the entry first means a concurrent reject or approve of
        // the same entry fails with AlreadyResolved.
        self.ledger.transition(
            entry.id,
            ContributionStatus::Approved,
            ContributionStatus::Pending,
            &reviewer.id,
        )?;

        let write = match self.write_approved(entry) {
            Ok(write) => write,
            Err(e) => {
                self.release(entry, reviewer);
                return Err(e);
            },
        };
        let ApprovedWrite::Applied { before, version } = write else {
            return self.supersede(entry, reviewer);
        };

        self.ledger.transition(
            entry.id,
            ContributionStatus::Applied,
            ContributionStatus::Approved,
            &reviewer.id,
        )?;
        let base = entry.based_on_version;
        self.audit_review(entry, reviewer, AuditAction::Approved, before.clone(), base)?;
        self.audit_review(entry, reviewer, AuditAction::Applied, before, version)?;
        log::info!(
            "{}: applied #{} approved by {} (v{version})",
            entry.triple,
            entry.id,
            reviewer.id
        );
        Ok(ReviewOutcome {
            entry_id: entry.id,
            status: ContributionStatus::Applied,
            version: Some(version),
        })
    }

    /// Write a claimed proposal if its base version is still current
    ///
    /// Nothing is written on error, so the claim can be released.
    fn write_approved(&self, entry: &ContributionEntry) -> Result<ApprovedWrite, EngineError> {
        let current = self.records.get(&entry.triple)?;
        if current.as_ref().map_or(0, |r| r.version) != entry.based_on_version {
            return Ok(ApprovedWrite::Stale);
        }
        match self.records.compare_and_set(
            &entry.triple,
            entry.based_on_version,
            entry.proposed_value.clone(),
        ) {
            Ok(version) => Ok(ApprovedWrite::Applied {
                before: current.map(|r| r.value),
                version,
            }),
            Err(StoreError::VersionConflict { .. }) => Ok(ApprovedWrite::Stale),
            Err(e) => Err(e.into()),
        }
    }

    /// Hand a claimed entry back to the review queue after a failed write
    fn release(&self, entry: &ContributionEntry, reviewer: &User) {
        match self.ledger.transition(
            entry.id,
            ContributionStatus::Pending,
            ContributionStatus::Approved,
            &reviewer.id,
        ) {
            Ok(_) => {
                log::warn!("{}: #{} back to pending after a failed write", entry.triple, entry.id);
            },
            Err(e) => {
                log::error!("{}: #{} left approved, release failed: {e}", entry.triple, entry.id);
            },
        }
    }

    fn supersede(&self, entry: &ContributionEntry, reviewer: &User) -> Result<ReviewOutcome, EngineError> {
        self.ledger.transition(
            entry.id,
            ContributionStatus::Superseded,
            ContributionStatus::Approved,
            &reviewer.id,
        )?;
        let current = self.records.get(&entry.triple)?;
        let current_version = current.as_ref().map_or(0, |r| r.version);
        let value = current.map(|r| r.value);
        self.audit_review(entry, reviewer, AuditAction::Approved, value.clone(), current_version)?;
        self.audit_review(entry, reviewer, AuditAction::Superseded, value, current_version)?;
        log::warn!(
            "{}: #{} superseded (based on v{}, record now v{current_version})",
            entry.triple,
            entry.id,
            entry.based_on_version
        );
        Ok(ReviewOutcome {
            entry_id: entry.id,
            status: ContributionStatus::Superseded,
            version: None,
        })
    }

    fn audit_review(
        &self,
        entry: &ContributionEntry,
        reviewer: &User,
        action: AuditAction,
        before: Option<FieldValue>,
        version: u64,
    ) -> Result<(), EngineError> {
        self.audit.record(
            AuditEntry::new(&reviewer.id, action, entry.triple.clone())
                .contribution(entry.id)
                .values(before, Some(entry.proposed_value.clone()))
                .at_version(version)
                .note(entry.source_note.clone()),
        )?;
        Ok(())
    }

    // =========================================================================
    // ISSUES
    // =========================================================================

    /// Start a raw scan over the record store
    ///
    /// The result is advisory: applies running concurrently may already have
    /// fixed or introduced issues.
    #[must_use]
    pub fn scan(&self, scope: &ScanScope) -> IssueScan {
        IssueDetector::new(Arc::clone(&self.records), self.catalog.snapshot()).scan(scope)
    }

    /// One page of current issues, minus those a superuser invalidated
    pub fn list_issues(
        &self,
        filter: &IssueFilter,
        page: PageRequest,
    ) -> Result<Page<Issue>, EngineError> {
        let catalog = self.catalog.snapshot();
        validate_filter(
            &catalog,
            filter.council.as_deref(),
            filter.field.as_deref(),
            filter.year.as_deref(),
        )?;

        let invalidated: HashSet<(Triple, IssueKind, u64)> = self
            .audit
            .invalidations()?
            .into_iter()
            .filter_map(|e| match e.action {
                AuditAction::IssueInvalidated(kind) => Some((e.triple, kind, e.record_version)),
                _ => None,
            })
            .collect();

        let mut issues = Vec::new();
        for issue in IssueDetector::new(Arc::clone(&self.records), catalog).scan(&filter.scope()) {
            let issue = issue?;
            if filter.kind.is_some_and(|k| k != issue.kind) {
                continue;
            }
            if !invalidated.is_empty() {
                let version = self.records.current_version(&issue.triple)?;
                if invalidated.contains(&(issue.triple.clone(), issue.kind, version)) {
                    continue;
                }
            }
            issues.push(issue);
        }
        Ok(Page::paginate(issues, page))
    }

    /// Mark a detected issue as not a real problem
    ///
    /// Superuser only. The mark holds until the record's version changes.
    pub fn invalidate_issue(
        &self,
        triple: &Triple,
        kind: IssueKind,
        note: Option<String>,
        user: &User,
    ) -> Result<AuditEntry, EngineError> {
        let catalog = self.catalog.snapshot();
        let field = resolve(&catalog, triple)?;
        if authorize(user.authority(), Action::InvalidateIssue, field.sensitivity) != Decision::Allow {
            return Err(forbidden(user, Action::InvalidateIssue, field.sensitivity));
        }

        let scope = ScanScope::all()
            .council(&triple.council)
            .field(&triple.field)
            .year(&triple.year);
        let detected = IssueDetector::new(Arc::clone(&self.records), catalog)
            .scan(&scope)
            .filter_map(Result::ok)
            .any(|issue| issue.kind == kind);
        if !detected {
            return Err(EngineError::NotFound(Missing::Issue {
                triple: triple.clone(),
                kind,
            }));
        }

        let current = self.records.get(triple)?;
        let mut entry = AuditEntry::new(&user.id, AuditAction::IssueInvalidated(kind), triple.clone())
            .at_version(current.as_ref().map_or(0, |r| r.version))
            .values(current.map(|r| r.value), None)
            .note(note);
        entry.seq = self.audit.record(entry.clone())?;
        log::info!("{triple}: {kind} issue invalidated by {}", user.id);
        Ok(entry)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// One page of ledger entries; status defaults to `Pending`
    pub fn list_pending(
        &self,
        filter: &LedgerFilter,
        page: PageRequest,
    ) -> Result<Page<ContributionEntry>, EngineError> {
        let catalog = self.catalog.snapshot();
        validate_filter(
            &catalog,
            filter.council.as_deref(),
            filter.field.as_deref(),
            filter.year.as_deref(),
        )?;
        Ok(Page::paginate(self.ledger.list_pending(filter)?, page))
    }

    /// Audit trail for a triple, oldest first
    pub fn get_history(
        &self,
        triple: &Triple,
    ) -> Result<std::vec::IntoIter<AuditEntry>, EngineError> {
        resolve(&self.catalog.snapshot(), triple)?;
        Ok(self.audit.history(triple)?.into_iter())
    }

    /// Current canonical record, if any value has been recorded
    pub fn get_record(&self, triple: &Triple) -> Result<Option<CanonicalRecord>, EngineError> {
        resolve(&self.catalog.snapshot(), triple)?;
        Ok(self.records.get(triple)?)
    }

    /// A single ledger entry
    pub fn get_contribution(&self, id: ContributionId) -> Result<ContributionEntry, EngineError> {
        self.ledger
            .get(id)?
            .ok_or(EngineError::NotFound(Missing::Contribution(id)))
    }
}

fn resolve<'c>(catalog: &'c Catalog, triple: &Triple) -> Result<&'c Field, EngineError> {
    validate_filter(catalog, Some(triple.council.as_str()), None, Some(triple.year.as_str()))?;
    catalog
        .field(&triple.field)
        .ok_or_else(|| EngineError::NotFound(Missing::Field(triple.field.clone())))
}

fn validate_filter(
    catalog: &Catalog,
    council: Option<&str>,
    field: Option<&str>,
    year: Option<&str>,
) -> Result<(), EngineError> {
    if let Some(slug) = council
        && catalog.council(slug).is_none()
    {
        return Err(EngineError::NotFound(Missing::Council(slug.to_string())));
    }
    if let Some(slug) = field
        && catalog.field(slug).is_none()
    {
        return Err(EngineError::NotFound(Missing::Field(slug.to_string())));
    }
    if let Some(id) = year
        && catalog.year(id).is_none()
    {
        return Err(EngineError::NotFound(Missing::Year(id.to_string())));
    }
    Ok(())
}

fn check_value(field: &Field, value: &FieldValue) -> Result<(), EngineError> {
    let problem = if value.kind() != field.kind {
        Some(ValueProblem::WrongKind {
            expected: field.kind,
            actual: value.kind(),
        })
    } else if value.as_number().is_some_and(|n| !n.is_finite()) {
        Some(ValueProblem::NotFinite)
    } else {
        None
    };
    problem.map_or(Ok(()), |problem| {
        Err(EngineError::InvalidValue {
            field: field.slug.clone(),
            problem,
        })
    })
}

fn forbidden(user: &User, action: Action, sensitivity: Sensitivity) -> EngineError {
    log::debug!("denied {} ({}) {action} on {sensitivity} field", user.id, user.tier);
    EngineError::Forbidden {
        user: user.id.clone(),
        action,
        sensitivity,
    }
}
