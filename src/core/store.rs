// src/core/store.rs

//! Durable per-replica snapshots. Each replica keeps its own copy of the
//! full database on disk as two JSON files, written with a
//! temp-file-then-atomic-rename so a crash mid-write never leaves a
//! truncated file behind for the next startup to choke on.

use crate::core::errors::ChatError;
use crate::core::types::{Database, MessageMap, UserMap};
use std::path::{Path, PathBuf};
use tracing::{error, warn};

#[derive(Debug, Clone)]
pub struct SnapshotPaths {
    pub users_path: PathBuf,
    pub messages_path: PathBuf,
}

impl SnapshotPaths {
    pub fn for_address(data_dir: &Path, address: &str) -> Self {
        let stem = address.replace(':', "_");
        Self {
            users_path: data_dir.join(format!("{stem}.users.json")),
            messages_path: data_dir.join(format!("{stem}.messages.json")),
        }
    }
}

/// Loads the database from disk. A missing file yields an empty map; a
/// present-but-malformed file is a fatal [`ChatError::CorruptSnapshot`].
pub fn load(paths: &SnapshotPaths) -> Result<Database, ChatError> {
    let users = load_map(&paths.users_path)?;
    let messages = load_map(&paths.messages_path)?;
    Ok(Database { users, messages })
}

/// Wholesale-replaces the user map, used by a follower applying a snapshot
/// pushed by the leader. The previous contents are discarded, not merged.
pub fn apply_users(db: &mut Database, users: UserMap) {
    db.users = users;
}

/// Wholesale-replaces the message map, used by a follower applying a
/// snapshot pushed by the leader.
pub fn apply_messages(db: &mut Database, messages: MessageMap) {
    db.messages = messages;
}

fn load_map<T>(path: &Path) -> Result<T, ChatError>
where
    T: Default + serde::de::DeserializeOwned,
{
    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| ChatError::CorruptSnapshot(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Atomically persists the database to the two snapshot files. A failure is
/// logged and returned to the caller, who is expected to keep serving from
/// the in-memory state rather than roll the mutation back; the next
/// successful save will catch up.
pub fn save(paths: &SnapshotPaths, db: &Database) -> Result<(), ChatError> {
    save_atomic(&paths.users_path, &db.users)?;
    save_atomic(&paths.messages_path, &db.messages)?;
    Ok(())
}

fn save_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), ChatError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension(format!("tmp.{}", rand::random::<u32>()));
    let bytes = serde_json::to_vec_pretty(value)?;
    if let Err(e) = std::fs::write(&tmp_path, &bytes) {
        let _ = std::fs::remove_file(&tmp_path);
        error!("failed to write snapshot temp file {}: {e}", tmp_path.display());
        return Err(e.into());
    }
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        warn!("failed to rename snapshot temp file into place: {e}");
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SnapshotPaths::for_address(dir.path(), "127.0.0.1:9001");
        let mut db = Database::new();
        chat::create_account(&mut db, "alice", "pw").unwrap();
        chat::create_account(&mut db, "bob", "pw").unwrap();
        chat::send_message(&mut db, "alice", "bob", "hi", "t1").unwrap();

        save(&paths, &db).unwrap();
        let loaded = load(&paths).unwrap();
        assert_eq!(loaded.users.len(), db.users.len());
        assert_eq!(loaded.messages.len(), db.messages.len());
    }

    #[test]
    fn missing_files_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SnapshotPaths::for_address(dir.path(), "127.0.0.1:9002");
        let loaded = load(&paths).unwrap();
        assert!(loaded.users.is_empty());
        assert!(loaded.messages.is_empty());
    }

    #[test]
    fn corrupt_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SnapshotPaths::for_address(dir.path(), "127.0.0.1:9003");
        std::fs::write(&paths.users_path, b"not json").unwrap();
        assert!(matches!(load(&paths), Err(ChatError::CorruptSnapshot(_))));
    }

    #[test]
    fn apply_users_and_messages_replace_rather_than_merge() {
        let mut db = Database::new();
        chat::create_account(&mut db, "alice", "pw").unwrap();

        let mut incoming_users = UserMap::new();
        let bob = chat::create_account(&mut Database::new(), "bob", "pw").unwrap();
        incoming_users.insert(bob.uid.clone(), bob);
        apply_users(&mut db, incoming_users);

        assert!(db.find_user_by_username("alice").is_none());
        assert!(db.find_user_by_username("bob").is_some());

        apply_messages(&mut db, MessageMap::new());
        assert!(db.messages.is_empty());
    }
}
