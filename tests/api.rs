use json_stash::{Error, JsonStash};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("json_stash_test_{}.json", name))
}

// ---- insert / get / remove ---------------------------------------------------

#[test]
fn insert_get_remove() {
    let path = temp_path("igr");
    let _ = std::fs::remove_file(&path);
    let db = JsonStash::<i32>::open(&path).unwrap();

    db.insert("a", 1).unwrap();
    assert_eq!(db.get("a").unwrap(), Some(1));
    assert_eq!(db.get("missing").unwrap(), None);

    db.remove("a").unwrap();
    assert_eq!(db.get("a").unwrap(), None);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn insert_duplicate_fails_and_changes_nothing() {
    let path = temp_path("dup");
    let _ = std::fs::remove_file(&path);
    let db = JsonStash::<i32>::open(&path).unwrap();

    db.insert("k", 1).unwrap().wait().unwrap();
    let writes_before = db.write_count();

    let err = db.insert("k", 2).unwrap_err();
    assert_eq!(err, Error::KeyExists("k".into()));
    assert_eq!(db.get("k").unwrap(), Some(1));
    // the failed insert must not have requested a write
    assert_eq!(db.write_count(), writes_before);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn upsert_creates_and_overwrites() {
    let path = temp_path("upsert");
    let _ = std::fs::remove_file(&path);
    let db = JsonStash::<i32>::open(&path).unwrap();

    db.upsert("k", 1).unwrap();
    assert_eq!(db.get("k").unwrap(), Some(1));
    db.upsert("k", 2).unwrap();
    assert_eq!(db.get("k").unwrap(), Some(2));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn remove_absent_is_ok() {
    let path = temp_path("rm_absent");
    let _ = std::fs::remove_file(&path);
    let db = JsonStash::<i32>::open(&path).unwrap();

    db.remove("nope").unwrap().wait().unwrap();
    assert!(db.is_empty().unwrap());
    let _ = std::fs::remove_file(&path);
}

// ---- extend -----------------------------------------------------------------

#[test]
fn extend_bulk_insert() {
    let path = temp_path("extend");
    let _ = std::fs::remove_file(&path);
    let db = JsonStash::<i32>::open(&path).unwrap();

    let batch: Vec<(String, i32)> = (0..50).map(|i| (format!("k{i}"), i)).collect();
    db.extend(batch).unwrap();
    assert_eq!(db.len().unwrap(), 50);
    assert_eq!(db.get("k0").unwrap(), Some(0));
    assert_eq!(db.get("k49").unwrap(), Some(49));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn extend_overwrites_existing() {
    let path = temp_path("extend_overwrite");
    let _ = std::fs::remove_file(&path);
    let db = JsonStash::<i32>::open(&path).unwrap();
    db.insert("a", 1).unwrap();

    db.extend(vec![("a", 99), ("b", 2)]).unwrap();
    assert_eq!(db.get("a").unwrap(), Some(99));
    assert_eq!(db.get("b").unwrap(), Some(2));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn extend_issues_one_write_for_the_batch() {
    let path = temp_path("extend_one_write");
    let _ = std::fs::remove_file(&path);
    let db = JsonStash::<i32>::open(&path).unwrap();

    let batch: Vec<(String, i32)> = (0..20).map(|i| (format!("k{i}"), i)).collect();
    db.extend(batch).unwrap().wait().unwrap();
    assert_eq!(db.write_count(), 1);
    let _ = std::fs::remove_file(&path);
}

// ---- clear ------------------------------------------------------------------

#[test]
fn clear_removes_all_entries() {
    let path = temp_path("clear");
    let _ = std::fs::remove_file(&path);
    let db = JsonStash::<i32>::open(&path).unwrap();
    db.insert("a", 1).unwrap();
    db.insert("b", 2).unwrap();
    assert_eq!(db.len().unwrap(), 2);

    db.clear().unwrap();
    assert!(db.is_empty().unwrap());
    assert_eq!(db.get("a").unwrap(), None);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn clear_on_empty_store_is_fine() {
    let path = temp_path("clear_empty");
    let _ = std::fs::remove_file(&path);
    let db = JsonStash::<i32>::open(&path).unwrap();
    db.clear().unwrap();
    assert!(db.is_empty().unwrap());
    let _ = std::fs::remove_file(&path);
}

// ---- snapshots --------------------------------------------------------------

#[test]
fn keys_values_entries() {
    let path = temp_path("keys_vals");
    let _ = std::fs::remove_file(&path);
    let db = JsonStash::<i32>::open(&path).unwrap();
    db.insert("x", 10).unwrap();
    db.insert("y", 20).unwrap();

    let mut keys = db.keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["x".to_string(), "y".to_string()]);

    let mut vals = db.values().unwrap();
    vals.sort();
    assert_eq!(vals, vec![10, 20]);

    let mut entries = db.entries().unwrap();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(entries, vec![("x".into(), 10), ("y".into(), 20)]);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn len_contains_is_empty() {
    let path = temp_path("len_contains");
    let _ = std::fs::remove_file(&path);
    let db = JsonStash::<i32>::open(&path).unwrap();

    assert!(db.is_empty().unwrap());
    assert_eq!(db.len().unwrap(), 0);
    assert!(!db.contains_key("a").unwrap());

    db.insert("a", 1).unwrap();
    assert!(!db.is_empty().unwrap());
    assert_eq!(db.len().unwrap(), 1);
    assert!(db.contains_key("a").unwrap());
    assert!(!db.contains_key("z").unwrap());
    let _ = std::fs::remove_file(&path);
}

// ---- construction -----------------------------------------------------------

#[test]
fn empty_path_rejected() {
    let err = JsonStash::<i32>::open("").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn path_accessor() {
    let path = temp_path("path_acc");
    let _ = std::fs::remove_file(&path);
    let db = JsonStash::<i32>::open(&path).unwrap();
    assert_eq!(db.path(), path.as_path());
    let _ = std::fs::remove_file(&path);
}

// ---- read-only --------------------------------------------------------------

#[test]
fn read_only_rejects_mutations() {
    let path = temp_path("read_only");
    let _ = std::fs::remove_file(&path);
    {
        let db = JsonStash::<i32>::open(&path).unwrap();
        db.insert("a", 1).unwrap().wait().unwrap();
    }

    let db = JsonStash::<i32>::open_read_only(&path).unwrap();
    assert!(db.is_read_only());
    assert_eq!(db.get("a").unwrap(), Some(1));
    assert_eq!(db.insert("b", 2).unwrap_err(), Error::ReadOnly);
    assert_eq!(db.upsert("a", 9).unwrap_err(), Error::ReadOnly);
    assert_eq!(db.remove("a").unwrap_err(), Error::ReadOnly);
    assert_eq!(db.clear().unwrap_err(), Error::ReadOnly);
    assert_eq!(db.get("a").unwrap(), Some(1));
    assert_eq!(db.write_count(), 0);
    assert!(db.is_synced());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn read_only_open_missing_file_loads_empty_without_creating() {
    let path = temp_path("read_only_missing");
    let _ = std::fs::remove_file(&path);
    let db = JsonStash::<i32>::open_read_only(&path).unwrap();
    assert!(db.is_empty().unwrap());
    assert!(!path.exists());
}

// ---- diagnostics ------------------------------------------------------------

#[test]
fn write_count_tracks_disk_writes() {
    let path = temp_path("write_count");
    let _ = std::fs::remove_file(&path);
    let db = JsonStash::<i32>::open(&path).unwrap();
    assert_eq!(db.write_count(), 0);

    db.insert("a", 1).unwrap().wait().unwrap();
    assert_eq!(db.write_count(), 1);
    assert!(db.is_synced());

    db.upsert("a", 2).unwrap().wait().unwrap();
    assert_eq!(db.write_count(), 2);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn debug_impls_dont_panic() {
    let path = temp_path("debug");
    let _ = std::fs::remove_file(&path);
    let db = JsonStash::<i32>::open(&path).unwrap();

    let dbg_store = format!("{:?}", db);
    assert!(dbg_store.contains("JsonStash"));
    assert!(dbg_store.contains("path"));

    let builder = JsonStash::<i32>::builder(&path);
    let dbg_builder = format!("{:?}", builder);
    assert!(dbg_builder.contains("JsonStashBuilder"));

    let receipt = db.insert("a", 1).unwrap();
    let dbg_receipt = format!("{:?}", receipt);
    assert!(dbg_receipt.contains("WriteReceipt"));

    let _ = std::fs::remove_file(&path);
}
