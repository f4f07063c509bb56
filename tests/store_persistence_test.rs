// tests/store_persistence_test.rs

//! Snapshot durability: save/load round-trips, missing-file-as-empty, and
//! fatal handling of a corrupt snapshot.

use chatterd::core::chat;
use chatterd::core::errors::ChatError;
use chatterd::core::store::{self, SnapshotPaths};
use chatterd::core::types::Database;

#[test]
fn round_trip_preserves_state() {
    let dir = tempfile::tempdir().unwrap();
    let paths = SnapshotPaths::for_address(dir.path(), "10.0.0.1:9090");

    let mut db = Database::new();
    chat::create_account(&mut db, "alice", "pw").unwrap();
    chat::create_account(&mut db, "bob", "pw").unwrap();
    chat::send_message(&mut db, "alice", "bob", "hello", "t0").unwrap();

    store::save(&paths, &db).unwrap();
    let reloaded = store::load(&paths).unwrap();

    assert_eq!(reloaded.users.len(), 2);
    assert_eq!(reloaded.messages.len(), 1);
    assert!(reloaded.find_user_by_username("alice").is_some());
}

#[test]
fn absent_snapshot_files_yield_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let paths = SnapshotPaths::for_address(dir.path(), "10.0.0.2:9090");
    let db = store::load(&paths).unwrap();
    assert!(db.users.is_empty());
    assert!(db.messages.is_empty());
}

#[test]
fn corrupt_snapshot_file_is_reported_as_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let paths = SnapshotPaths::for_address(dir.path(), "10.0.0.3:9090");
    std::fs::write(&paths.messages_path, b"{not valid json").unwrap();
    match store::load(&paths) {
        Err(ChatError::CorruptSnapshot(_)) => {}
        other => panic!("expected CorruptSnapshot, got {other:?}"),
    }
}

#[test]
fn save_is_atomic_no_partial_file_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let paths = SnapshotPaths::for_address(dir.path(), "10.0.0.4:9090");
    let mut db = Database::new();
    chat::create_account(&mut db, "alice", "pw").unwrap();
    store::save(&paths, &db).unwrap();

    let mut leftover_tmp_files = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains(".tmp."));
    assert!(leftover_tmp_files.next().is_none());
}
