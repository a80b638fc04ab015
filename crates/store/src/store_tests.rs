use super::*;
use serde::{Deserialize, Serialize};
use ward_core::FakeClock;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Payload {
    counter: u64,
    label: String,
}

fn store_at(dir: &std::path::Path) -> ResilientStore<Payload, FakeClock> {
    ResilientStore::new(
        dir.join("widget.json"),
        StoreConfig::default(),
        MigrationRegistry::new(),
        FakeClock::new(),
    )
}

#[test]
fn get_on_absent_store_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(dir.path());
    assert_eq!(store.get().unwrap(), None);
}

#[test]
fn set_then_get_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(dir.path());
    let value = Payload { counter: 1, label: "a".into() };
    store.set(&value).unwrap();
    assert_eq!(store.get().unwrap(), Some(value));
}

#[test]
fn write_epoch_increases_monotonically() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(dir.path());
    store.set(&Payload { counter: 1, label: "a".into() }).unwrap();
    store.set(&Payload { counter: 2, label: "b".into() }).unwrap();
    let raw = std::fs::read(&dir.path().join("widget.json")).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(value["writeEpoch"], 2);
}

#[test]
fn previous_primary_becomes_backup_after_second_write() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(dir.path());
    store.set(&Payload { counter: 1, label: "a".into() }).unwrap();
    store.set(&Payload { counter: 2, label: "b".into() }).unwrap();
    assert!(dir.path().join("widget.json.bak").exists());
}

#[test]
fn falls_back_to_backup_when_primary_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(dir.path());
    store.set(&Payload { counter: 1, label: "a".into() }).unwrap();
    store.set(&Payload { counter: 2, label: "b".into() }).unwrap();
    std::fs::write(dir.path().join("widget.json"), b"not json").unwrap();
    let recovered = store.get().unwrap().unwrap();
    assert_eq!(recovered.counter, 1);
}

#[test]
fn recovers_from_newer_tmp_file_after_crash() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(dir.path());
    store.set(&Payload { counter: 1, label: "a".into() }).unwrap();

    // Simulate a crash mid-write: a tmp file with a higher write epoch than
    // the primary, left behind before the final rename happened.
    let crashed_record = StoreRecord::new(1, 99, serde_json::to_value(&Payload { counter: 99, label: "crashed".into() }).unwrap());
    let bytes = crashed_record.to_canonical_bytes().unwrap();
    std::fs::write(dir.path().join("widget.json.4242.tmp"), bytes).unwrap();

    let recovered = store.get().unwrap().unwrap();
    assert_eq!(recovered.counter, 99);
    // The tmp file is promoted, not left behind as a stray sibling forever.
    assert!(!dir.path().join("widget.json.4242.tmp").exists());
}

#[test]
fn stale_tmp_file_older_than_baseline_is_removed_not_chosen() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(dir.path());
    store.set(&Payload { counter: 1, label: "a".into() }).unwrap();
    store.set(&Payload { counter: 2, label: "b".into() }).unwrap();

    let stale_record = StoreRecord::new(1, 1, serde_json::to_value(&Payload { counter: 1, label: "stale".into() }).unwrap());
    let bytes = stale_record.to_canonical_bytes().unwrap();
    std::fs::write(dir.path().join("widget.json.111.tmp"), bytes).unwrap();

    let recovered = store.get().unwrap().unwrap();
    assert_eq!(recovered.counter, 2);
    assert!(!dir.path().join("widget.json.111.tmp").exists());
}

#[test]
fn set_after_primary_quarantine_outruns_a_stale_tmp_epoch() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(dir.path());
    store.set(&Payload { counter: 1, label: "a".into() }).unwrap();

    // Primary becomes unreadable (as quarantine_unreadable would leave it),
    // while an orphaned tmp from some earlier interrupted write under a
    // different pid still carries a higher write_epoch than primary ever
    // reached.
    std::fs::write(dir.path().join("widget.json"), b"not json").unwrap();
    let orphan = StoreRecord::new(1, 50, serde_json::to_value(&Payload { counter: 50, label: "orphan".into() }).unwrap());
    std::fs::write(dir.path().join("widget.json.9999.tmp"), orphan.to_canonical_bytes().unwrap()).unwrap();

    store.set(&Payload { counter: 2, label: "fresh".into() }).unwrap();

    let recovered = store.get().unwrap().unwrap();
    assert_eq!(recovered, Payload { counter: 2, label: "fresh".into() });
}

#[test]
fn everything_corrupt_quarantines_and_reports_absent() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(dir.path());
    std::fs::write(dir.path().join("widget.json"), b"garbage").unwrap();

    assert_eq!(store.get().unwrap(), None);
    let quarantined: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains("quarantine"))
        .collect();
    assert_eq!(quarantined.len(), 1);
}

#[test]
fn corrupt_tmp_file_is_quarantined_when_no_other_candidate_exists() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(dir.path());
    std::fs::write(dir.path().join("widget.json.555.tmp"), b"garbage").unwrap();

    assert_eq!(store.get().unwrap(), None);
    assert!(!dir.path().join("widget.json.555.tmp").exists());
    let quarantined: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains("quarantine"))
        .collect();
    assert_eq!(quarantined.len(), 1);
}

#[test]
fn size_exceeded_is_rejected_before_write() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResilientStore::new(
        dir.path().join("tiny.json"),
        StoreConfig { schema_version: 1, max_size_bytes: 8 },
        MigrationRegistry::new(),
        FakeClock::new(),
    );
    let err = store.set(&Payload { counter: 1, label: "too long to fit".into() }).unwrap_err();
    assert!(matches!(err, StoreError::SizeExceeded { .. }));
    assert!(!dir.path().join("tiny.json").exists());
}

struct BumpSchema;
impl Migration for BumpSchema {
    fn source_version(&self) -> u32 {
        1
    }
    fn target_version(&self) -> u32 {
        2
    }
    fn migrate(&self, payload: &mut serde_json::Value) -> Result<(), String> {
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("label".into(), serde_json::json!("migrated"));
        }
        Ok(())
    }
}

#[test]
fn migrates_on_read_and_persists_upgraded_form() {
    let dir = tempfile::tempdir().unwrap();
    let old_store = ResilientStore::new(
        dir.path().join("widget.json"),
        StoreConfig { schema_version: 1, max_size_bytes: 10 * 1024 * 1024 },
        MigrationRegistry::new(),
        FakeClock::new(),
    );
    old_store.set(&Payload { counter: 7, label: "old".into() }).unwrap();

    let mut migrations = MigrationRegistry::new();
    migrations.register(Box::new(BumpSchema));
    let new_store = ResilientStore::new(
        dir.path().join("widget.json"),
        StoreConfig { schema_version: 2, max_size_bytes: 10 * 1024 * 1024 },
        migrations,
        FakeClock::new(),
    );
    let value = new_store.get().unwrap().unwrap();
    assert_eq!(value.label, "migrated");

    let raw = std::fs::read(dir.path().join("widget.json")).unwrap();
    let on_disk: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(on_disk["schemaVersion"], 2);
}

#[test]
fn clear_removes_all_sibling_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_at(dir.path());
    store.set(&Payload { counter: 1, label: "a".into() }).unwrap();
    store.set(&Payload { counter: 2, label: "b".into() }).unwrap();
    assert!(store.exists());
    store.clear().unwrap();
    assert!(!store.exists());
    assert!(!dir.path().join("widget.json.bak").exists());
}
