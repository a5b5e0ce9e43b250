use keywarden::store::{file, SecretRecord, SecretStore, StoreError};

fn make_record(id: &str, created_at: u64) -> SecretRecord {
    SecretRecord {
        id: id.to_string(),
        label: format!("{id} label"),
        ciphertext: Some("Y2lwaGVydGV4dA==".into()),
        nonce: Some("AAAAAAAAAAAAAAAA".into()),
        created_at,
        relying_party_id: "keywarden.local".into(),
        user_handle: "aGFuZGxl".into(),
        credential_id: Some("Y3JlZA==".into()),
        credential_public_key: Some("cGs=".into()),
    }
}

fn store_in(dir: &tempfile::TempDir) -> SecretStore {
    SecretStore::new(dir.path().join("secrets.json"))
}

#[test]
fn test_store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    store
        .save(&[make_record("api-key", 1_700_000_000_000)])
        .unwrap();

    let records = store.load().unwrap();
    assert_eq!(records.len(), 1);
    let loaded = &records[0];
    assert_eq!(loaded.id, "api-key");
    assert_eq!(loaded.label, "api-key label");
    assert_eq!(loaded.created_at, 1_700_000_000_000);
    assert_eq!(loaded.relying_party_id, "keywarden.local");
    assert!(loaded.is_hardware_bound());
}

#[test]
fn test_load_absent_store_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn test_load_corrupt_store_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secrets.json");
    std::fs::write(&path, b"{ not json").unwrap();

    let err = SecretStore::new(path).load().unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}

#[test]
fn test_load_non_array_store_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secrets.json");
    std::fs::write(&path, b"{\"id\": \"not-an-array\"}").unwrap();

    let err = SecretStore::new(path).load().unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}

#[test]
fn test_replace_keeps_single_record_per_id() {
    let mut records = vec![make_record("k", 1_000), make_record("other", 2_000)];

    let mut replacement = make_record("k", 3_000);
    replacement.ciphertext = Some("bmV3".into());
    file::replace(&mut records, replacement);

    let matches: Vec<_> = records.iter().filter(|r| r.id == "k").collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].created_at, 3_000);
    assert_eq!(matches[0].ciphertext.as_deref(), Some("bmV3"));
    assert_eq!(records.len(), 2);
}

#[test]
fn test_unique_id_invariant_after_mutations() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let mut records = store.load().unwrap();
    for (id, stamp) in [("a", 1), ("b", 2), ("a", 3), ("c", 4), ("a", 5)] {
        file::replace(&mut records, make_record(id, stamp));
        store.save(&records).unwrap();
    }
    file::remove(&mut records, "b");
    store.save(&records).unwrap();

    let loaded = store.load().unwrap();
    let mut ids: Vec<_> = loaded.iter().map(|r| r.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), loaded.len(), "duplicate id in persisted store");
    assert_eq!(loaded.len(), 2);
    assert_eq!(
        loaded.iter().find(|r| r.id == "a").unwrap().created_at,
        5,
        "latest replacement must win"
    );
}

#[test]
fn test_remove_reports_existence() {
    let mut records = vec![make_record("k", 1_000)];
    assert!(file::remove(&mut records, "k"));
    assert!(!file::remove(&mut records, "k"));
    assert!(records.is_empty());
}

#[test]
fn test_save_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.save(&[make_record("k", 1_000)]).unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["secrets.json"]);
}

#[test]
fn test_save_overwrites_whole_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    store
        .save(&[make_record("a", 1), make_record("b", 2)])
        .unwrap();
    store.save(&[make_record("c", 3)]).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, "c");
}

#[test]
fn test_legacy_record_loads_but_is_not_bound() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secrets.json");
    std::fs::write(
        &path,
        br#"[{
            "id": "old",
            "label": "Old",
            "createdAt": 1000,
            "relyingPartyId": "keywarden.local",
            "userHandle": "aGFuZGxl"
        }]"#,
    )
    .unwrap();

    let records = SecretStore::new(path).load().unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].is_hardware_bound());
}

#[cfg(unix)]
#[test]
fn test_store_file_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.save(&[make_record("k", 1_000)]).unwrap();

    let mode = std::fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600, "store file should have 0600 permissions");
}
