//! Tests for submit and review orchestration

use std::sync::Arc;

use civic_ledger::adapters::{MemoryAuditLog, MemoryLedger, MemoryRecordStore};
use civic_ledger::core::error::{EngineError, Missing, ValueProblem};
use civic_ledger::core::models::{
    AuditAction, CatalogHandle, ContributionStatus, FieldKind, FieldValue, PageRequest,
};
use civic_ledger::core::ports::{LedgerFilter, RecordStore};
use civic_ledger::core::services::{
    Action, EngineSettings, ModerationEngine, ReviewAction, ReviewOutcome,
};

use crate::common::mocks::{
    AlwaysConflicting, AuditOutage, RacingStore, UnavailableStore, WriteOutageStore,
};
use crate::common::{
    alice, bob, band_d, catalog, debt, engine, guest, num, reserves, reviewer, root, senior,
    triple,
};

fn engine_over(records: Arc<dyn RecordStore>) -> ModerationEngine {
    ModerationEngine::new(
        records,
        Arc::new(MemoryLedger::new()),
        Arc::new(MemoryAuditLog::new()),
        CatalogHandle::new(catalog()),
        EngineSettings::default(),
    )
}

// =============================================================================
// SUBMIT
// =============================================================================

#[test]
fn test_open_field_applies_directly() {
    let (engine, _) = engine();

    let outcome = engine.submit(&debt("2023-24"), num(42_000.0), None, &alice()).unwrap();

    assert_eq!(outcome.status, ContributionStatus::Applied);
    assert_eq!(outcome.version, Some(1));
    let record = engine.get_record(&debt("2023-24")).unwrap().unwrap();
    assert_eq!(record.value, num(42_000.0));
    assert_eq!(record.version, 1);

    let entry = engine.get_contribution(outcome.entry_id).unwrap();
    assert_eq!(entry.status, ContributionStatus::Applied);
    assert_eq!(entry.based_on_version, 0);
}

#[test]
fn test_moderated_field_is_queued() {
    let (engine, _) = engine();

    let outcome = engine.submit(&reserves("2023-24"), num(10.0), None, &alice()).unwrap();

    assert_eq!(outcome.status, ContributionStatus::Pending);
    assert_eq!(outcome.version, None);
    assert!(engine.get_record(&reserves("2023-24")).unwrap().is_none());
}

#[test]
fn test_restricted_field_is_queued_even_for_superuser() {
    let (engine, _) = engine();
    let outcome = engine.submit(&band_d("2023-24"), num(1_500.0), None, &root()).unwrap();
    assert_eq!(outcome.status, ContributionStatus::Pending);
}

#[test]
fn test_tier_zero_submit_is_forbidden() {
    let (engine, _) = engine();

    let err = engine.submit(&debt("2023-24"), num(1.0), None, &guest()).unwrap_err();

    assert!(matches!(
        err,
        EngineError::Forbidden {
            action: Action::Submit,
            ..
        }
    ));
    assert!(engine.get_record(&debt("2023-24")).unwrap().is_none());
}

#[test]
fn test_unknown_references_are_not_found() {
    let (engine, _) = engine();

    let err = engine
        .submit(&triple("nowhere", "total-debt", "2023-24"), num(1.0), None, &alice())
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound(Missing::Council("nowhere".to_string())));

    let err = engine
        .submit(&triple("council-a", "pothole-count", "2023-24"), num(1.0), None, &alice())
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound(Missing::Field("pothole-count".to_string())));

    let err = engine.submit(&debt("1999-00"), num(1.0), None, &alice()).unwrap_err();
    assert_eq!(err, EngineError::NotFound(Missing::Year("1999-00".to_string())));
}

#[test]
fn test_wrong_kind_is_invalid_value() {
    let (engine, _) = engine();

    let err = engine
        .submit(&debt("2023-24"), FieldValue::Text("lots".to_string()), None, &alice())
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::InvalidValue {
            field: "total-debt".to_string(),
            problem: ValueProblem::WrongKind {
                expected: FieldKind::Number,
                actual: FieldKind::Text,
            },
        }
    );
}

#[test]
fn test_non_finite_number_is_invalid_value() {
    let (engine, _) = engine();
    let err = engine.submit(&debt("2023-24"), num(f64::NAN), None, &alice()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidValue {
            problem: ValueProblem::NotFinite,
            ..
        }
    ));
}

#[test]
fn test_direct_apply_gives_up_after_bounded_attempts() {
    let store = Arc::new(AlwaysConflicting::default());
    let engine = engine_over(Arc::clone(&store) as _);

    let err = engine.submit(&debt("2023-24"), num(5.0), None, &alice()).unwrap_err();

    assert_eq!(
        err,
        EngineError::Contended {
            triple: debt("2023-24"),
            attempts: 3,
        }
    );
    assert_eq!(store.attempts.load(std::sync::atomic::Ordering::SeqCst), 3);
}

#[test]
fn test_storage_failure_is_typed() {
    let engine = engine_over(Arc::new(UnavailableStore));
    let err = engine.submit(&debt("2023-24"), num(5.0), None, &alice()).unwrap_err();
    assert!(matches!(err, EngineError::Storage(_)));
}

#[test]
fn test_source_note_is_kept_and_audited() {
    let (engine, _) = engine();
    let note = Some("Statement of accounts 2023-24, p. 41".to_string());

    let outcome = engine.submit(&reserves("2023-24"), num(9.0), note.clone(), &alice()).unwrap();

    assert_eq!(engine.get_contribution(outcome.entry_id).unwrap().source_note, note);
    let history: Vec<_> = engine.get_history(&reserves("2023-24")).unwrap().collect();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, AuditAction::Submitted);
    assert_eq!(history[0].note, note);
}

// =============================================================================
// REVIEW
// =============================================================================

#[test]
fn test_moderated_submit_then_approve_applies() {
    let (engine, _) = engine();
    let submitted = engine.submit(&reserves("2023-24"), num(10.0), None, &alice()).unwrap();

    let reviewed = engine.review(submitted.entry_id, ReviewAction::Approve, &reviewer()).unwrap();

    assert_eq!(
        reviewed,
        ReviewOutcome {
            entry_id: submitted.entry_id,
            status: ContributionStatus::Applied,
            version: Some(1),
        }
    );
    assert_eq!(engine.get_record(&reserves("2023-24")).unwrap().unwrap().value, num(10.0));

    let entry = engine.get_contribution(submitted.entry_id).unwrap();
    assert_eq!(entry.resolved_by.as_deref(), Some("rita"));
}

#[test]
fn test_second_approval_on_same_base_is_superseded() {
    let (engine, _) = engine();
    let first = engine.submit(&reserves("2023-24"), num(10.0), None, &alice()).unwrap();
    let second = engine.submit(&reserves("2023-24"), num(20.0), None, &bob()).unwrap();

    let a = engine.review(first.entry_id, ReviewAction::Approve, &reviewer()).unwrap();
    let b = engine.review(second.entry_id, ReviewAction::Approve, &reviewer()).unwrap();

    assert_eq!(a.status, ContributionStatus::Applied);
    assert_eq!(b.status, ContributionStatus::Superseded);
    assert_eq!(b.version, None);

    // No silent overwrite: the first value stands
    let record = engine.get_record(&reserves("2023-24")).unwrap().unwrap();
    assert_eq!(record.value, num(10.0));
    assert_eq!(record.version, 1);

    // The superseded proposal stays inspectable
    let entry = engine.get_contribution(second.entry_id).unwrap();
    assert_eq!(entry.status, ContributionStatus::Superseded);
    assert_eq!(entry.proposed_value, num(20.0));
}

#[test]
fn test_race_between_check_and_write_is_superseded() {
    let store = Arc::new(RacingStore::with_interloper(reserves("2023-24"), num(99.0)));
    let engine = engine_over(Arc::clone(&store) as _);
    let submitted = engine.submit(&reserves("2023-24"), num(10.0), None, &alice()).unwrap();

    let outcome = engine.review(submitted.entry_id, ReviewAction::Approve, &reviewer()).unwrap();

    assert_eq!(outcome.status, ContributionStatus::Superseded);
    let record = store.get(&reserves("2023-24")).unwrap().unwrap();
    assert_eq!(record.value, num(99.0));
    assert_eq!(record.version, 1);
}

#[test]
fn test_failed_write_returns_entry_to_pending() {
    let store = Arc::new(WriteOutageStore::default());
    let engine = engine_over(Arc::clone(&store) as _);
    let submitted = engine.submit(&reserves("2023-24"), num(10.0), None, &alice()).unwrap();

    store.set_down(true);
    let err = engine.review(submitted.entry_id, ReviewAction::Approve, &reviewer()).unwrap_err();
    assert!(matches!(err, EngineError::Storage(_)));

    let entry = engine.get_contribution(submitted.entry_id).unwrap();
    assert_eq!(entry.status, ContributionStatus::Pending);
    assert_eq!(entry.resolved_by, None);
    let mut history = engine.get_history(&reserves("2023-24")).unwrap();
    assert!(history.all(|e| e.action == AuditAction::Submitted));

    // Once the store is back the same entry can be approved
    store.set_down(false);
    let outcome = engine.review(submitted.entry_id, ReviewAction::Approve, &reviewer()).unwrap();
    assert_eq!(outcome.status, ContributionStatus::Applied);
    assert_eq!(outcome.version, Some(1));
}

#[test]
fn test_audit_failure_after_review_leaves_entry_resolved() {
    let audit = Arc::new(AuditOutage::default());
    let engine = ModerationEngine::new(
        Arc::new(MemoryRecordStore::new()),
        Arc::new(MemoryLedger::new()),
        Arc::clone(&audit) as _,
        CatalogHandle::new(catalog()),
        EngineSettings::default(),
    );
    let first = engine.submit(&reserves("2023-24"), num(10.0), None, &alice()).unwrap();
    let second = engine.submit(&reserves("2023-24"), num(20.0), None, &bob()).unwrap();

    audit.set_down(true);
    let err = engine.review(first.entry_id, ReviewAction::Approve, &reviewer()).unwrap_err();
    assert!(matches!(err, EngineError::Storage(_)));

    // The write happened and the entry is not stuck half-way
    let entry = engine.get_contribution(first.entry_id).unwrap();
    assert_eq!(entry.status, ContributionStatus::Applied);
    assert_eq!(engine.get_record(&reserves("2023-24")).unwrap().unwrap().version, 1);

    audit.set_down(false);
    let outcome = engine.review(second.entry_id, ReviewAction::Approve, &reviewer()).unwrap();
    assert_eq!(outcome.status, ContributionStatus::Superseded);
}

#[test]
fn test_reject_does_not_touch_records() {
    let (engine, _) = engine();
    let submitted = engine.submit(&reserves("2023-24"), num(10.0), None, &alice()).unwrap();

    let outcome = engine.review(submitted.entry_id, ReviewAction::Reject, &reviewer()).unwrap();

    assert_eq!(outcome.status, ContributionStatus::Rejected);
    assert!(engine.get_record(&reserves("2023-24")).unwrap().is_none());
}

#[test]
fn test_review_of_rejected_entry_is_invalid_transition() {
    let (engine, _) = engine();
    let submitted = engine.submit(&reserves("2023-24"), num(10.0), None, &alice()).unwrap();
    engine.review(submitted.entry_id, ReviewAction::Reject, &reviewer()).unwrap();

    let err = engine
        .review(submitted.entry_id, ReviewAction::Approve, &reviewer())
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::InvalidTransition {
            id: submitted.entry_id,
            from: ContributionStatus::Rejected,
            to: ContributionStatus::Applied,
        }
    );
}

#[test]
fn test_terminal_entries_never_move_again() {
    let (engine, _) = engine();
    let applied = engine.submit(&debt("2023-24"), num(1.0), None, &alice()).unwrap();

    for action in [ReviewAction::Approve, ReviewAction::Reject, ReviewAction::Delete] {
        let err = engine.review(applied.entry_id, action, &root()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
    }
}

#[test]
fn test_review_of_unknown_entry_is_not_found() {
    let (engine, _) = engine();
    let err = engine.review(404, ReviewAction::Approve, &reviewer()).unwrap_err();
    assert_eq!(err, EngineError::NotFound(Missing::Contribution(404)));
}

#[test]
fn test_review_thresholds_follow_sensitivity() {
    let (engine, _) = engine();
    let moderated = engine.submit(&reserves("2023-24"), num(10.0), None, &alice()).unwrap();
    let restricted = engine.submit(&band_d("2023-24"), num(1_500.0), None, &alice()).unwrap();

    // tier 1 cannot review at all
    let err = engine.review(moderated.entry_id, ReviewAction::Approve, &bob()).unwrap_err();
    assert!(matches!(err, EngineError::Forbidden { .. }));

    // tier 3 can review moderated but not restricted
    let err = engine
        .review(restricted.entry_id, ReviewAction::Approve, &reviewer())
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden { .. }));

    // a forbidden review leaves the entry pending
    assert_eq!(
        engine.get_contribution(restricted.entry_id).unwrap().status,
        ContributionStatus::Pending
    );

    let outcome = engine.review(restricted.entry_id, ReviewAction::Approve, &senior()).unwrap();
    assert_eq!(outcome.status, ContributionStatus::Applied);
}

#[test]
fn test_delete_requires_elevated_tier() {
    let (engine, _) = engine();
    let submitted = engine.submit(&reserves("2023-24"), num(10.0), None, &alice()).unwrap();

    let err = engine.review(submitted.entry_id, ReviewAction::Delete, &reviewer()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Forbidden {
            action: Action::Delete,
            ..
        }
    ));

    let outcome = engine.review(submitted.entry_id, ReviewAction::Delete, &root()).unwrap();
    assert_eq!(outcome.status, ContributionStatus::Rejected);

    let actions: Vec<_> = engine
        .get_history(&reserves("2023-24"))
        .unwrap()
        .map(|e| e.action)
        .collect();
    assert_eq!(actions, vec![AuditAction::Submitted, AuditAction::Deleted]);
}

#[test]
fn test_every_transition_is_audited() {
    let (engine, _) = engine();
    let first = engine.submit(&reserves("2023-24"), num(10.0), None, &alice()).unwrap();
    let second = engine.submit(&reserves("2023-24"), num(20.0), None, &bob()).unwrap();
    engine.review(first.entry_id, ReviewAction::Approve, &reviewer()).unwrap();
    engine.review(second.entry_id, ReviewAction::Approve, &reviewer()).unwrap();

    let history: Vec<_> = engine.get_history(&reserves("2023-24")).unwrap().collect();
    let actions: Vec<_> = history.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::Submitted,
            AuditAction::Submitted,
            AuditAction::Approved,
            AuditAction::Applied,
            AuditAction::Approved,
            AuditAction::Superseded,
        ]
    );
    assert!(history.windows(2).all(|w| w[0].seq < w[1].seq));

    let applied = &history[3];
    assert_eq!(applied.contribution_id, Some(first.entry_id));
    assert_eq!(applied.before_value, None);
    assert_eq!(applied.after_value, Some(num(10.0)));
    assert_eq!(applied.record_version, 1);
}

// =============================================================================
// QUERIES
// =============================================================================

#[test]
fn test_list_pending_filters_and_pages() {
    let (engine, _) = engine();
    for n in 0..5 {
        engine.submit(&reserves("2023-24"), num(f64::from(n)), None, &alice()).unwrap();
    }
    engine.submit(&reserves("2022-23"), num(1.0), None, &bob()).unwrap();
    engine.submit(&debt("2023-24"), num(1.0), None, &bob()).unwrap();

    let all = engine.list_pending(&LedgerFilter::default(), PageRequest::default()).unwrap();
    assert_eq!(all.total, 6);

    let filter = LedgerFilter {
        year: Some("2023-24".to_string()),
        ..LedgerFilter::default()
    };
    let page = engine.list_pending(&filter, PageRequest::new(2, 2)).unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.page_count(), 3);
    assert_eq!(page.items[0].proposed_value, num(2.0));

    let by_bob = LedgerFilter {
        submitted_by: Some("bob".to_string()),
        ..LedgerFilter::default()
    };
    assert_eq!(engine.list_pending(&by_bob, PageRequest::default()).unwrap().total, 1);

    let applied = LedgerFilter {
        status: Some(ContributionStatus::Applied),
        ..LedgerFilter::default()
    };
    assert_eq!(engine.list_pending(&applied, PageRequest::default()).unwrap().total, 1);
}

#[test]
fn test_list_pending_rejects_unknown_filter_values() {
    let (engine, _) = engine();
    let filter = LedgerFilter {
        council: Some("atlantis".to_string()),
        ..LedgerFilter::default()
    };
    let err = engine.list_pending(&filter, PageRequest::default()).unwrap_err();
    assert_eq!(err, EngineError::NotFound(Missing::Council("atlantis".to_string())));
}

#[test]
fn test_history_of_untouched_record_is_empty() {
    let (engine, _) = engine();
    assert_eq!(engine.get_history(&debt("2021-22")).unwrap().count(), 0);
}
