use super::*;

// =============================================================================
// MemoryStorage
// =============================================================================

#[test]
fn memory_get_missing_is_none() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get(SESSION_TOKEN_KEY), None);
}

#[test]
fn memory_set_then_remove() {
    let storage = MemoryStorage::new();
    storage.set(SESSION_TOKEN_KEY, "tok").unwrap();
    assert_eq!(storage.get(SESSION_TOKEN_KEY).as_deref(), Some("tok"));
    storage.remove(SESSION_TOKEN_KEY).unwrap();
    assert_eq!(storage.get(SESSION_TOKEN_KEY), None);
}

#[test]
fn memory_remove_missing_is_ok() {
    let storage = MemoryStorage::new();
    assert!(storage.remove(ROLE_HINT_KEY).is_ok());
}

#[test]
fn memory_with_entries_seeds_values() {
    let storage = MemoryStorage::with_entries([(SESSION_TOKEN_KEY, "a"), (ROLE_HINT_KEY, "brand")]);
    assert_eq!(storage.get(SESSION_TOKEN_KEY).as_deref(), Some("a"));
    assert_eq!(storage.get(ROLE_HINT_KEY).as_deref(), Some("brand"));
}

// =============================================================================
// FileStorage
// =============================================================================

#[test]
fn file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let storage = FileStorage::open(&path).unwrap();
    storage.set(SESSION_TOKEN_KEY, "persisted").unwrap();
    drop(storage);

    let reopened = FileStorage::open(&path).unwrap();
    assert_eq!(reopened.get(SESSION_TOKEN_KEY).as_deref(), Some("persisted"));
}

#[test]
fn file_remove_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let storage = FileStorage::open(&path).unwrap();
    storage.set(SESSION_TOKEN_KEY, "t").unwrap();
    storage.set(ROLE_HINT_KEY, "user").unwrap();
    storage.remove(SESSION_TOKEN_KEY).unwrap();

    let reopened = FileStorage::open(&path).unwrap();
    assert_eq!(reopened.get(SESSION_TOKEN_KEY), None);
    assert_eq!(reopened.get(ROLE_HINT_KEY).as_deref(), Some("user"));
}

#[test]
fn file_creates_missing_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("session.json");

    let storage = FileStorage::open(&path).unwrap();
    storage.set(SESSION_TOKEN_KEY, "x").unwrap();
    assert!(path.exists());
    assert_eq!(storage.path(), path.as_path());
}

#[test]
fn file_corrupt_contents_start_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, b"{not json").unwrap();

    let storage = FileStorage::open(&path).unwrap();
    assert_eq!(storage.get(SESSION_TOKEN_KEY), None);

    storage.set(SESSION_TOKEN_KEY, "fresh").unwrap();
    let reopened = FileStorage::open(&path).unwrap();
    assert_eq!(reopened.get(SESSION_TOKEN_KEY).as_deref(), Some("fresh"));
}

#[test]
fn file_leaves_no_temp_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let storage = FileStorage::open(&path).unwrap();
    storage.set(SESSION_TOKEN_KEY, "x").unwrap();
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn storage_error_maps_to_session_storage_error() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: SessionError = StorageError::from(io).into();
    assert!(matches!(err, SessionError::Storage(msg) if msg.contains("denied")));
}
