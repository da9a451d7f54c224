//! Tests for snapshot persistence and workspace reopening

use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;

use civic_ledger::Workspace;
use civic_ledger::adapters::{FileStore, MemoryBackend, Snapshot};
use civic_ledger::config::DEFAULT_CONFIG;
use civic_ledger::core::models::{
    CatalogHandle, ContributionStatus, FieldValue, PageRequest, Triple, User,
};
use civic_ledger::core::ports::LedgerFilter;
use civic_ledger::core::services::{EngineSettings, ReviewAction};
use civic_ledger::paths;
use serial_test::serial;
use tempfile::TempDir;

use crate::common::{alice, catalog, debt, engine, num, reserves, reviewer};

fn init_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(paths::config_file(temp.path()), DEFAULT_CONFIG).unwrap();
    temp
}

#[test]
fn test_backend_snapshot_round_trip() {
    let (engine, backend) = engine();
    engine.submit(&debt("2023-24"), num(5.0), None, &alice()).unwrap();
    let queued = engine.submit(&reserves("2023-24"), num(6.0), None, &alice()).unwrap();

    let snapshot = backend.snapshot().unwrap();
    assert_eq!(snapshot.records.len(), 1);
    assert_eq!(snapshot.contributions.len(), 2);
    assert_eq!(snapshot.audit.len(), 2);

    let restored = MemoryBackend::from_snapshot(snapshot.clone());
    assert_eq!(restored.snapshot().unwrap(), snapshot);

    // The restored engine keeps working where the old one stopped
    let engine = restored.engine(CatalogHandle::new(catalog()), EngineSettings::default());
    let outcome = engine.review(queued.entry_id, ReviewAction::Approve, &reviewer()).unwrap();
    assert_eq!(outcome.status, ContributionStatus::Applied);
    let next = engine.submit(&reserves("2022-23"), num(1.0), None, &alice()).unwrap();
    assert_eq!(next.entry_id, 3);
}

#[test]
fn test_file_store_round_trip() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new(paths::state_file(temp.path()));
    let (engine, backend) = engine();
    engine
        .submit(&debt("2022-23"), num(1_234.5), Some("p. 12".to_string()), &alice())
        .unwrap();

    store.save(&backend.snapshot().unwrap()).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded, backend.snapshot().unwrap());
    assert_eq!(loaded.contributions[0].source_note.as_deref(), Some("p. 12"));
}

#[test]
fn test_empty_snapshot_json_fields_default() {
    let snapshot: Snapshot = serde_json::from_str("{}").unwrap();
    assert_eq!(snapshot, Snapshot::default());
}

#[test]
#[serial]
fn test_workspace_persists_between_opens() {
    let temp = init_project();
    let triple = Triple::new("cardiff", "total-debt", "2023-24");

    {
        let workspace = Workspace::open(temp.path(), None).unwrap();
        let outcome = workspace
            .engine()
            .submit(&triple, FieldValue::Number(900.0), None, &User::new("ana", 1))
            .unwrap();
        assert_eq!(outcome.version, Some(1));
        workspace.save().unwrap();
    }

    let workspace = Workspace::open(temp.path(), None).unwrap();
    let record = workspace.engine().get_record(&triple).unwrap().unwrap();
    assert_eq!(record.value, FieldValue::Number(900.0));
    assert_eq!(record.version, 1);
    assert_eq!(workspace.engine().get_history(&triple).unwrap().count(), 1);
}

#[test]
#[serial]
fn test_workspace_without_config_fails() {
    let temp = TempDir::new().unwrap();
    let err = Workspace::open(temp.path(), None).unwrap_err();
    assert!(format!("{err:#}").contains("civic-ledger init"));
}

#[test]
fn test_reload_config_swaps_catalog() {
    let temp = init_project();
    let config_path = paths::config_file(temp.path());
    let workspace = Workspace::open(temp.path(), Some(&config_path)).unwrap();
    assert!(workspace.engine().catalog().council("leeds").is_none());

    let extended = format!("{DEFAULT_CONFIG}\n[[council]]\nslug = \"leeds\"\nname = \"Leeds\"\n");
    fs::write(&config_path, extended).unwrap();
    workspace.reload_config().unwrap();

    assert!(workspace.engine().catalog().council("leeds").is_some());
    let pending = workspace
        .engine()
        .list_pending(
            &LedgerFilter {
                council: Some("leeds".to_string()),
                ..LedgerFilter::default()
            },
            PageRequest::default(),
        )
        .unwrap();
    assert_eq!(pending.total, 0);
}

#[test]
fn test_invalid_reload_keeps_old_catalog() {
    let temp = init_project();
    let config_path = paths::config_file(temp.path());
    let workspace = Workspace::open(temp.path(), Some(&config_path)).unwrap();

    fs::write(&config_path, "years = [").unwrap();
    assert!(workspace.reload_config().is_err());

    assert!(workspace.engine().catalog().council("cardiff").is_some());
}

#[test]
fn test_competing_workspaces_never_lose_an_approval() {
    let temp = init_project();
    let root = temp.path().to_path_buf();
    let config_path = paths::config_file(&root);
    let triple = Triple::new("cardiff", "usable-reserves", "2023-24");

    let ids: Vec<u64> = {
        let workspace = Workspace::open(&root, Some(&config_path)).unwrap();
        let ids = [("ana", 1.0), ("ben", 2.0)]
            .into_iter()
            .map(|(user, value)| {
                workspace
                    .engine()
                    .submit(&triple, FieldValue::Number(value), None, &User::new(user, 1))
                    .unwrap()
                    .entry_id
            })
            .collect();
        workspace.save().unwrap();
        ids
    };

    // Each "process" opens its own workspace and approves a different entry
    let barrier = Arc::new(Barrier::new(ids.len()));
    let handles: Vec<_> = ids
        .iter()
        .map(|&id| {
            let barrier = Arc::clone(&barrier);
            let root = root.clone();
            let config_path = config_path.clone();
            thread::spawn(move || {
                barrier.wait();
                let workspace = Workspace::open(&root, Some(&config_path)).unwrap();
                let outcome = workspace
                    .engine()
                    .review(id, ReviewAction::Approve, &User::new("rita", 3))
                    .unwrap();
                workspace.save().unwrap();
                outcome.status
            })
        })
        .collect();
    let mut statuses: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    statuses.sort_by_key(|s| *s != ContributionStatus::Applied);
    assert_eq!(statuses, [ContributionStatus::Applied, ContributionStatus::Superseded]);

    // Both outcomes survive on disk
    let workspace = Workspace::open(&root, Some(&config_path)).unwrap();
    let engine = workspace.engine();
    assert_eq!(engine.get_record(&triple).unwrap().unwrap().version, 1);
    let mut persisted: Vec<_> = ids
        .iter()
        .map(|&id| engine.get_contribution(id).unwrap().status)
        .collect();
    persisted.sort_by_key(|s| *s != ContributionStatus::Applied);
    assert_eq!(persisted, [ContributionStatus::Applied, ContributionStatus::Superseded]);
    assert_eq!(engine.get_history(&triple).unwrap().count(), 6);
}

#[test]
fn test_open_workspace_holds_state_lock() {
    let temp = init_project();
    let config_path = paths::config_file(temp.path());
    let store = FileStore::new(paths::state_file(temp.path()));

    let workspace = Workspace::open(temp.path(), Some(&config_path)).unwrap();
    assert!(store.try_lock().unwrap().is_none());

    drop(workspace);
    assert!(store.try_lock().unwrap().is_some());
}
