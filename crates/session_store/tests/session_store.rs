use std::fs;

use serde_json::json;
use session_model::{Message, Phase, RunOutcome, SessionSnapshot};
use session_store::{
    snapshot_file_name, FileSnapshotStore, MemorySnapshotStore, SessionStoreError, SnapshotStore,
};
use tempfile::TempDir;

fn file_store() -> (TempDir, FileSnapshotStore) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = FileSnapshotStore::new(dir.path().join("sessions"));
    (dir, store)
}

fn populated_snapshot(session_id: &str) -> SessionSnapshot {
    let mut snapshot = SessionSnapshot::new(session_id);
    snapshot.phase = Phase::LiveCoding;
    snapshot
        .messages_by_phase
        .push(Phase::Interview, Message::assistant("Tell me about yourself."));
    snapshot
        .messages_by_phase
        .push(Phase::Interview, Message::user("I build APIs."));
    snapshot
        .messages_by_phase
        .push(Phase::LiveCoding, Message::assistant("Sum the numbers on stdin."));
    snapshot.code = "print(sum(map(int, input().split())))".to_string();
    snapshot.environment_id = Some("python".to_string());
    snapshot.run_outcome = Some(RunOutcome {
        stdout: "15\n".to_string(),
        stderr: String::new(),
        status: Some("completed".to_string()),
        execution_time: Some(0.042),
        exit_code: Some(0),
    });
    snapshot.session_info = Some(json!({"vacancy": "Backend", "level": "middle"}));
    snapshot
}

#[test]
fn fresh_session_loads_defaults() {
    let (_dir, store) = file_store();

    let snapshot = store.load("never-seen");

    assert_eq!(snapshot.session_id, "never-seen");
    assert_eq!(snapshot.phase, Phase::Interview);
    assert!(snapshot.messages(Phase::Interview).is_empty());
    assert!(snapshot.messages(Phase::LiveCoding).is_empty());
    assert!(snapshot.messages(Phase::Final).is_empty());
    assert_eq!(snapshot.environment_id, None);
    assert_eq!(snapshot.run_outcome, None);
}

#[test]
fn save_then_load_equals_normalized_snapshot() {
    let (_dir, store) = file_store();
    let snapshot = populated_snapshot("s-1");

    store.save("s-1", &snapshot).expect("save should succeed");
    let loaded = store.load("s-1");

    assert_eq!(loaded, SessionSnapshot::normalize(&snapshot.to_value(), "s-1"));
    assert_eq!(loaded, snapshot);
}

#[test]
fn save_writes_one_prefixed_json_record_per_session() {
    let (_dir, store) = file_store();

    store
        .save("s-1", &populated_snapshot("s-1"))
        .expect("first save");
    store
        .save("s-2", &SessionSnapshot::new("s-2"))
        .expect("second save");

    let mut names: Vec<String> = fs::read_dir(store.root())
        .expect("store root should exist")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    assert_eq!(
        names,
        vec![snapshot_file_name("s-1"), snapshot_file_name("s-2")]
    );

    let stored: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(store.path_for("s-1")).expect("record should be readable"),
    )
    .expect("record should be JSON");
    assert_eq!(stored["sessionId"], "s-1");
    assert_eq!(stored["phase"], "live_coding");
    assert_eq!(stored["environmentId"], "python");
    assert_eq!(stored["runOutcome"]["executionTime"], 0.042);
    assert!(stored["messagesByPhase"]["final"].is_array());
}

#[test]
fn corrupt_record_loads_defaults_without_error() {
    let (_dir, store) = file_store();
    fs::create_dir_all(store.root()).expect("root should be created");
    fs::write(store.path_for("s-bad"), "{ this is not json").expect("corrupt record written");

    let snapshot = store.load("s-bad");

    assert_eq!(snapshot, SessionSnapshot::new("s-bad"));
}

#[test]
fn partially_valid_record_is_normalized_on_load() {
    let (_dir, store) = file_store();
    fs::create_dir_all(store.root()).expect("root should be created");
    fs::write(
        store.path_for("s-partial"),
        json!({
            "phase": "unknown-phase",
            "messagesByPhase": {"interview": [{"role": "user", "content": "hi"}], "live_coding": 5},
            "environmentId": "env-1"
        })
        .to_string(),
    )
    .expect("record written");

    let snapshot = store.load("s-partial");

    assert_eq!(snapshot.phase, Phase::Interview);
    assert_eq!(snapshot.messages(Phase::Interview), &[Message::user("hi")]);
    assert!(snapshot.messages(Phase::LiveCoding).is_empty());
    assert_eq!(snapshot.environment_id.as_deref(), Some("env-1"));
}

#[test]
fn later_save_replaces_earlier_record() {
    let (_dir, store) = file_store();
    let mut snapshot = populated_snapshot("s-1");
    store.save("s-1", &snapshot).expect("first save");

    snapshot.phase = Phase::Final;
    snapshot
        .messages_by_phase
        .push(Phase::Final, Message::assistant("Summary"));
    store.save("s-1", &snapshot).expect("second save");

    let loaded = store.load("s-1");
    assert_eq!(loaded.phase, Phase::Final);
    assert_eq!(loaded.messages(Phase::Final), &[Message::assistant("Summary")]);
    assert!(!store.path_for("s-1").with_extension("json.tmp").exists());
}

#[test]
fn empty_session_id_is_never_persisted() {
    let (_dir, store) = file_store();

    store
        .save("", &SessionSnapshot::new(""))
        .expect("empty id save is a no-op");

    assert!(!store.root().exists());
    assert_eq!(store.load(""), SessionSnapshot::new(""));
}

#[test]
fn unwritable_root_reports_io_error() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").expect("blocker file written");
    let store = FileSnapshotStore::new(blocker.join("sessions"));

    let error = store
        .save("s-1", &SessionSnapshot::new("s-1"))
        .expect_err("root under a file must fail");

    assert!(matches!(error, SessionStoreError::Io { .. }));
}

#[test]
fn memory_store_round_trips_like_file_store() {
    let store = MemorySnapshotStore::new();
    let snapshot = populated_snapshot("s-mem");

    store.save("s-mem", &snapshot).expect("save should succeed");

    assert_eq!(store.len(), 1);
    assert_eq!(store.load("s-mem"), snapshot);
}

#[test]
fn memory_store_absorbs_corrupt_records() {
    let store = MemorySnapshotStore::new();
    store.insert_raw("s-mem", "[]]");

    assert_eq!(store.load("s-mem"), SessionSnapshot::new("s-mem"));
    assert!(store.raw("missing").is_none());
}

#[test]
fn ids_differing_only_in_punctuation_keep_separate_records() {
    let (_dir, store) = file_store();
    let mut dotted = SessionSnapshot::new("a.b");
    dotted
        .messages_by_phase
        .push(Phase::Interview, Message::user("answer for a.b"));
    store.save("a.b", &dotted).expect("save a.b");

    let dashed = store.load("a-b");
    assert_eq!(dashed, SessionSnapshot::new("a-b"));

    store
        .save("a-b", &SessionSnapshot::new("a-b"))
        .expect("save a-b");
    assert_eq!(
        store.load("a.b").messages(Phase::Interview),
        &[Message::user("answer for a.b")]
    );
    assert!(store.load("a/b").messages(Phase::Interview).is_empty());
    assert_ne!(store.path_for("a.b"), store.path_for("a-b"));
}
