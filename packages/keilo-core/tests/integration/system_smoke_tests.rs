//! Concurrent access smoke tests.
//!
//! Many threads hitting shared tables through the database container.

use std::sync::Arc;
use std::thread;

use ntest::timeout;

use keilo_core::{Conditions, Database};

use super::helpers::{conditions, record};

/// Writers, updaters and readers on one table keep the key index exact
#[timeout(10000)]
#[test]
fn test_concurrent_mixed_workload() {
    let db = Arc::new(Database::new());
    db.create_table("events", "id").unwrap();

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                let table = db.get_table("events").unwrap();
                for i in 0..250 {
                    let id = format!("{}-{}", w, i);
                    table
                        .insert(record(("id", id.as_str()), &[("state", "new")]))
                        .unwrap();
                }
            })
        })
        .collect();

    let updaters: Vec<_> = (0..2)
        .map(|_| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                let table = db.get_table("events").unwrap();
                for _ in 0..50 {
                    // NotFound is expected while writers have not caught up
                    let _ = table.update(
                        &conditions(&[("state", "new")]),
                        &conditions(&[("state", "seen")]),
                    );
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                let table = db.get_table("events").unwrap();
                for _ in 0..100 {
                    let records = table.select(&Conditions::new()).unwrap();
                    assert!(records
                        .iter()
                        .all(|r| matches!(r.get("state"), Some("new") | Some("seen"))));
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(updaters).chain(readers) {
        handle.join().unwrap();
    }

    let table = db.get_table("events").unwrap();
    assert_eq!(table.count().unwrap(), 1000);
    for w in 0..4 {
        for i in 0..250 {
            assert!(table.contains_key(&format!("{}-{}", w, i)).unwrap());
        }
    }
}

/// Concurrent removers never remove a record twice
#[timeout(10000)]
#[test]
fn test_concurrent_removes() {
    let db = Database::new();
    let table = db.create_table("jobs", "id").unwrap();
    for i in 0..200 {
        let id = i.to_string();
        table
            .insert(record(("id", id.as_str()), &[("queue", "main")]))
            .unwrap();
    }

    let removed: usize = (0..4)
        .map(|_| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let mut total = 0;
                for i in 0..200 {
                    let id = i.to_string();
                    if let Ok(n) = table.remove(&conditions(&[("id", id.as_str())])) {
                        total += n;
                    }
                }
                total
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .sum();

    assert_eq!(removed, 200);
    assert_eq!(table.count().unwrap(), 0);
    assert!(table.select(&Conditions::new()).unwrap().is_empty());
}
