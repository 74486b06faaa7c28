//! Table storage and key index.
//!
//! Each table has:
//! - Immutable name and key field name
//! - Ordered record sequence
//! - Uniqueness index over key values
//! - One mutex guarding records and index together

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::DbError;

use super::record::Record;

/// Source of process-unique table ids, used to order lock acquisition.
static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Applies the direction to an ascending comparison result.
    pub fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

impl From<bool> for SortOrder {
    /// `true` is ascending.
    fn from(ascending: bool) -> Self {
        if ascending {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }
}

/// State guarded by the table lock.
#[derive(Debug, Default)]
pub(super) struct TableState {
    /// Records in table order
    pub(super) records: Vec<Record>,
    /// Key values of all records, exactly once each
    pub(super) key_index: HashSet<String>,
}

impl TableState {
    /// Validates a record against the key rules and appends it.
    ///
    /// The duplicate check and the append happen under the same borrow, so
    /// callers holding the lock get an atomic check-then-act.
    pub(super) fn admit(&mut self, table: &str, key: &str, record: Record) -> Result<(), DbError> {
        if record.key().name() != key {
            return Err(DbError::KeyFieldMismatch {
                table: table.to_string(),
                expected: key.to_string(),
                got: record.key().name().to_string(),
            });
        }

        if let Some(field) = record.duplicate_field() {
            return Err(DbError::DuplicateField {
                table: table.to_string(),
                field: field.to_string(),
            });
        }

        if self.key_index.contains(record.key().value()) {
            return Err(DbError::DuplicateKey {
                table: table.to_string(),
                key: record.key().value().to_string(),
            });
        }

        self.key_index.insert(record.key().value().to_string());
        self.records.push(record);
        Ok(())
    }
}

/// A named collection of records sharing one declared key field.
#[derive(Debug)]
pub struct Table {
    /// Process-unique id, fixes the lock order for joins
    id: u64,
    /// Table name
    name: String,
    /// Key field name
    key: String,
    /// Records and key index
    state: Mutex<TableState>,
}

impl Table {
    /// Creates an empty table.
    ///
    /// # Arguments
    /// * `name` - Table name
    /// * `key` - Name of the key field every record must carry
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            key: key.into(),
            state: Mutex::new(TableState::default()),
        }
    }

    /// Creates a table pre-populated with records, building the key index.
    ///
    /// Every record is checked the same way [`Table::insert`] checks it.
    ///
    /// # Returns
    /// `Result<Table, DbError>` containing the table or the first rejected record's error.
    pub fn with_records(
        name: impl Into<String>,
        key: impl Into<String>,
        records: Vec<Record>,
    ) -> Result<Self, DbError> {
        let table = Self::new(name, key);
        {
            let mut state = table.lock()?;
            state.records.reserve(records.len());
            for record in records {
                state.admit(&table.name, &table.key, record)?;
            }
        }
        Ok(table)
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the key field name.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(super) fn id(&self) -> u64 {
        self.id
    }

    pub(super) fn lock(&self) -> Result<MutexGuard<'_, TableState>, DbError> {
        self.state.lock().map_err(|_| DbError::LockPoisoned)
    }

    /// Inserts a record at the end of the table.
    ///
    /// # Errors
    /// - `KeyFieldMismatch` if the record's key field name differs from the table key
    /// - `DuplicateField` if the record names a field twice
    /// - `DuplicateKey` if the key value is already present
    pub fn insert(&self, record: Record) -> Result<(), DbError> {
        let mut state = self.lock()?;
        let key_value = record.key().value().to_string();
        state.admit(&self.name, &self.key, record)?;
        tracing::debug!("Inserted record '{}' into table '{}'", key_value, self.name);
        Ok(())
    }

    /// Returns a copy of all records in table order.
    pub fn get_records(&self) -> Result<Vec<Record>, DbError> {
        Ok(self.lock()?.records.clone())
    }

    /// Returns the number of records.
    pub fn count(&self) -> Result<usize, DbError> {
        Ok(self.lock()?.records.len())
    }

    /// Returns true if a record with the given key value exists.
    pub fn contains_key(&self, value: &str) -> Result<bool, DbError> {
        Ok(self.lock()?.key_index.contains(value))
    }

    /// Stable in-place sort by key value.
    pub fn sort(&self, order: SortOrder) -> Result<(), DbError> {
        let mut state = self.lock()?;
        state
            .records
            .sort_by(|a, b| order.apply(a.key().value().cmp(b.key().value())));
        Ok(())
    }

    /// Stable in-place sort by the value of a named field.
    ///
    /// A record without the field compares lower than any record that has
    /// it, so such records come first when ascending and last when
    /// descending.
    pub fn sort_by_field(&self, field: &str, order: SortOrder) -> Result<(), DbError> {
        let mut state = self.lock()?;
        state
            .records
            .sort_by(|a, b| order.apply(a.get(field).cmp(&b.get(field))));
        Ok(())
    }
}
