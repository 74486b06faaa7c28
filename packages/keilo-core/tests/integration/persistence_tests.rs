//! Persistence integration tests.

use ntest::timeout;
use tempfile::tempdir;

use keilo_core::config::DbConfig;
use keilo_core::persistence::PersistenceManager;
use keilo_core::{Database, SortOrder};

use super::helpers::{conditions, keys, record};

/// Save, reload and keep working on the reloaded tables
#[timeout(2000)]
#[test]
fn test_reload_preserves_order_and_index() {
    let temp_dir = tempdir().unwrap();
    let config = DbConfig {
        data_dir: temp_dir.path().to_path_buf(),
        ..Default::default()
    };
    let persistence = PersistenceManager::new(&config);

    let db = Database::new();
    let table = db.create_table("books", "isbn").unwrap();
    for (isbn, title) in [("978-3", "C"), ("978-1", "A"), ("978-2", "B")] {
        table
            .insert(record(("isbn", isbn), &[("title", title)]))
            .unwrap();
    }
    table.sort(SortOrder::Descending).unwrap();
    persistence.save(&db).unwrap();

    let reloaded = persistence.load().unwrap();
    let books = reloaded.get_table("books").unwrap();
    assert_eq!(keys(&books), vec!["978-3", "978-2", "978-1"]);

    // The rebuilt index rejects duplicates and serves key lookups
    assert!(books
        .insert(record(("isbn", "978-1"), &[("title", "again")]))
        .is_err());
    let found = books.select(&conditions(&[("isbn", "978-2")])).unwrap();
    assert_eq!(found[0].get("title"), Some("B"));

    books
        .update(
            &conditions(&[("isbn", "978-2")]),
            &conditions(&[("isbn", "978-9")]),
        )
        .unwrap();
    persistence.save(&reloaded).unwrap();

    let again = persistence.load().unwrap();
    let books = again.get_table("books").unwrap();
    assert!(books.contains_key("978-9").unwrap());
    assert!(!books.contains_key("978-2").unwrap());
}

/// Pretty and compact output load back the same
#[timeout(2000)]
#[test]
fn test_pretty_and_compact_output() {
    for pretty_json in [true, false] {
        let temp_dir = tempdir().unwrap();
        let persistence = PersistenceManager::new(&DbConfig {
            data_dir: temp_dir.path().to_path_buf(),
            pretty_json,
            ..Default::default()
        });

        let db = Database::new();
        let table = db.create_table("kv", "k").unwrap();
        table.insert(record(("k", "a"), &[("v", "1")])).unwrap();
        persistence.save(&db).unwrap();

        let loaded = persistence.load().unwrap();
        assert_eq!(
            loaded.get_table("kv").unwrap().get_records().unwrap(),
            table.get_records().unwrap()
        );
    }
}
