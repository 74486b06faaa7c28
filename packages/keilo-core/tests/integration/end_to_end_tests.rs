//! End-to-end workflow tests.
//!
//! Exercise the public API the way the database container and the CLI use it.

use keilo_core::{Conditions, Database, DbError, SortOrder};
use ntest::timeout;

use super::helpers::{conditions, keys, record};

/// Full lifecycle: create table → insert → select → update → remove
#[timeout(2000)]
#[test]
fn test_full_crud_lifecycle() {
    let db = Database::new();
    let products = db.create_table("products", "sku").unwrap();

    for i in 1..=100 {
        let sku = format!("sku-{:03}", i);
        let category = if i % 2 == 0 { "even" } else { "odd" };
        let name = format!("Product {}", i);
        products
            .insert(record(("sku", sku.as_str()), &[("name", name.as_str()), ("category", category)]))
            .unwrap();
    }
    assert_eq!(products.count().unwrap(), 100);

    let even = products.select(&conditions(&[("category", "even")])).unwrap();
    assert_eq!(even.len(), 50);
    assert_eq!(even[0].key().value(), "sku-002");

    let updated = products
        .update(
            &conditions(&[("category", "odd")]),
            &conditions(&[("category", "clearance")]),
        )
        .unwrap();
    assert_eq!(updated, 50);
    assert!(products
        .select(&conditions(&[("category", "odd")]))
        .unwrap()
        .is_empty());

    let removed = products
        .remove(&conditions(&[("category", "clearance")]))
        .unwrap();
    assert_eq!(removed, 50);
    assert_eq!(products.count().unwrap(), 50);

    let rest = products.select(&Conditions::new()).unwrap();
    assert!(rest.iter().all(|r| r.get("category") == Some("even")));
}

/// The join scenario: matching keys merge, unmatched left rows pass through
#[timeout(1000)]
#[test]
fn test_join_scenario() {
    let db = Database::new();
    let a = db.create_table("A", "id").unwrap();
    a.insert(record(("id", "1"), &[("name", "x")])).unwrap();
    a.insert(record(("id", "2"), &[("name", "y")])).unwrap();

    let b = db.create_table("B", "id").unwrap();
    b.insert(record(("id", "1"), &[("age", "10")])).unwrap();
    b.insert(record(("id", "3"), &[("age", "30")])).unwrap();

    let joined = a.join(&b).unwrap();
    let records = joined.get_records().unwrap();
    assert_eq!(
        records,
        vec![
            record(("id", "1"), &[("name", "x"), ("age", "10")]),
            record(("id", "2"), &[("name", "y")]),
        ]
    );
    assert!(joined.select(&conditions(&[("id", "3")])).unwrap().is_empty());
    assert_eq!(joined.key(), "id");
}

/// Sorting by key ascending then descending, stable for equal values
#[timeout(1000)]
#[test]
fn test_sort_workflow() {
    let db = Database::new();
    let table = db.create_table("nums", "n").unwrap();
    for n in ["3", "1", "2"] {
        table.insert(record(("n", n), &[("parity", "x")])).unwrap();
    }

    table.sort(SortOrder::Ascending).unwrap();
    assert_eq!(keys(&table), vec!["1", "2", "3"]);
    table.sort(SortOrder::Descending).unwrap();
    assert_eq!(keys(&table), vec!["3", "2", "1"]);

    // All parities equal: order must be kept as-is
    table.sort_by_field("parity", SortOrder::Ascending).unwrap();
    assert_eq!(keys(&table), vec!["3", "2", "1"]);
}

/// Error outcomes reach the caller unchanged and never alter state
#[timeout(1000)]
#[test]
fn test_error_outcomes() {
    let db = Database::new();
    let table = db.create_table("people", "id").unwrap();
    table.insert(record(("id", "1"), &[("name", "ann")])).unwrap();

    assert!(matches!(
        table.insert(record(("uid", "2"), &[])),
        Err(DbError::KeyFieldMismatch { .. })
    ));
    assert!(matches!(
        table.insert(record(("id", "1"), &[])),
        Err(DbError::DuplicateKey { .. })
    ));
    assert!(matches!(
        table.update(&conditions(&[("id", "9")]), &conditions(&[("name", "x")])),
        Err(DbError::NotFound { .. })
    ));
    assert!(matches!(
        table.update(&conditions(&[("id", "1")]), &conditions(&[("age", "3")])),
        Err(DbError::FieldNotFound { .. })
    ));
    assert!(matches!(
        table.remove(&conditions(&[("name", "nobody")])),
        Err(DbError::NotFound { .. })
    ));

    assert_eq!(
        table.get_records().unwrap(),
        vec![record(("id", "1"), &[("name", "ann")])]
    );
}

/// Errors render with table and field context
#[test]
fn test_error_messages() {
    let err = DbError::FieldNotFound {
        table: "people".to_string(),
        field: "age".to_string(),
    };
    assert_eq!(err.to_string(), "Field 'age' not found in table 'people'");

    let err = DbError::DuplicateKey {
        table: "people".to_string(),
        key: "1".to_string(),
    };
    assert_eq!(err.to_string(), "Key '1' already exists in table 'people'");
}
