//! Database container owning tables by name.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

use crate::error::DbError;
use crate::table::Table;

/// Database container holding all tables.
///
/// Tables are handed out as `Arc<Table>`; each table carries its own lock,
/// so callers never hold the container lock while working on a table.
#[derive(Debug, Default)]
pub struct Database {
    /// Map of table name to table instance
    tables: RwLock<HashMap<String, Arc<Table>>>,
}

impl Database {
    /// Creates a new empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty table keyed on `key`.
    ///
    /// # Arguments
    /// * `name` - Table name
    /// * `key` - Key field name
    ///
    /// # Returns
    /// `Result<Arc<Table>, DbError>` containing the new table.
    pub fn create_table(&self, name: &str, key: &str) -> Result<Arc<Table>, DbError> {
        self.add_table(Table::new(name, key))
    }

    /// Registers an already built table under its own name.
    ///
    /// # Returns
    /// `Result<Arc<Table>, DbError>` containing the registered table.
    pub fn add_table(&self, table: Table) -> Result<Arc<Table>, DbError> {
        let mut tables = self.tables.write().map_err(|_| DbError::LockPoisoned)?;
        if tables.contains_key(table.name()) {
            return Err(DbError::TableAlreadyExists(table.name().to_string()));
        }
        let table = Arc::new(table);
        tables.insert(table.name().to_string(), Arc::clone(&table));
        tracing::debug!(
            "Registered table '{}' keyed on '{}'",
            table.name(),
            table.key()
        );
        Ok(table)
    }

    /// Gets a table by name.
    pub fn get_table(&self, name: &str) -> Result<Arc<Table>, DbError> {
        let tables = self.tables.read().map_err(|_| DbError::LockPoisoned)?;
        tables
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::TableNotFound {
                table: name.to_string(),
            })
    }

    /// Drops a table by name.
    ///
    /// Handles obtained earlier stay usable but are no longer reachable
    /// through the database.
    pub fn drop_table(&self, name: &str) -> Result<(), DbError> {
        let mut tables = self.tables.write().map_err(|_| DbError::LockPoisoned)?;
        tables.remove(name).ok_or_else(|| DbError::TableNotFound {
            table: name.to_string(),
        })?;
        tracing::debug!("Dropped table '{}'", name);
        Ok(())
    }

    /// Joins two registered tables into a new, unregistered table.
    ///
    /// The container lock is released before the join runs.
    pub fn join_tables(&self, left: &str, right: &str) -> Result<Table, DbError> {
        let left = self.get_table(left)?;
        let right = self.get_table(right)?;
        left.join(&right)
    }

    /// Returns all table names in sorted order.
    pub fn table_names(&self) -> Result<Vec<String>, DbError> {
        let tables = self.tables.read().map_err(|_| DbError::LockPoisoned)?;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Returns the number of tables in the database.
    pub fn table_count(&self) -> Result<usize, DbError> {
        let tables = self.tables.read().map_err(|_| DbError::LockPoisoned)?;
        Ok(tables.len())
    }

    /// Returns all tables, sorted by name.
    pub fn tables(&self) -> Result<Vec<Arc<Table>>, DbError> {
        let tables = self.tables.read().map_err(|_| DbError::LockPoisoned)?;
        let mut all: Vec<Arc<Table>> = tables.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(all)
    }
}
