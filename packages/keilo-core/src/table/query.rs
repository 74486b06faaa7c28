//! Condition-matching query operations: select, update, remove and join.

use std::collections::{HashMap, HashSet};

use super::record::Record;
use super::table::{Table, TableState};
use crate::error::DbError;

/// Field name to required value; all pairs must hold for a record to match.
pub type Conditions = HashMap<String, String>;

impl TableState {
    /// Indices of records matching every condition, in table order.
    ///
    /// Runs on already-locked state. A key condition whose value is not in
    /// the index short-circuits to no matches without scanning.
    fn matching_indices(&self, key: &str, conditions: &Conditions) -> Vec<usize> {
        if let Some(value) = conditions.get(key) {
            if !self.key_index.contains(value) {
                return Vec::new();
            }
        }

        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.matches(conditions))
            .map(|(index, _)| index)
            .collect()
    }
}

impl Table {
    /// Selects records matching all conditions.
    ///
    /// An empty condition set matches every record.
    ///
    /// # Returns
    /// `Result<Vec<Record>, DbError>` containing copies of the matching records in table order.
    pub fn select(&self, conditions: &Conditions) -> Result<Vec<Record>, DbError> {
        let state = self.lock()?;
        Ok(state
            .matching_indices(self.key(), conditions)
            .into_iter()
            .map(|index| state.records[index].clone())
            .collect())
    }

    /// Overwrites field values on every record matching the conditions.
    ///
    /// All checks run before anything is written, so a failed update leaves
    /// the table untouched.
    ///
    /// # Errors
    /// - `NotFound` if no record matches
    /// - `DuplicateKey` if a new key value belongs to another record, or a
    ///   key replacement would apply to more than one record
    /// - `FieldNotFound` if a matched record lacks a replaced field
    ///
    /// # Returns
    /// Number of records updated.
    pub fn update(&self, conditions: &Conditions, replacements: &Conditions) -> Result<usize, DbError> {
        let mut state = self.lock()?;
        let matched = state.matching_indices(self.key(), conditions);
        if matched.is_empty() {
            return Err(DbError::NotFound {
                table: self.name().to_string(),
            });
        }

        if let Some(new_key) = replacements.get(self.key()) {
            let duplicate = DbError::DuplicateKey {
                table: self.name().to_string(),
                key: new_key.clone(),
            };
            if matched.len() > 1 {
                return Err(duplicate);
            }
            let current = state.records[matched[0]].key().value();
            if current != new_key && state.key_index.contains(new_key) {
                return Err(duplicate);
            }
        }

        for &index in &matched {
            let record = &state.records[index];
            if let Some(missing) = replacements.keys().find(|name| !record.contains(name)) {
                return Err(DbError::FieldNotFound {
                    table: self.name().to_string(),
                    field: missing.clone(),
                });
            }
        }

        let TableState { records, key_index } = &mut *state;
        for &index in &matched {
            let record = &mut records[index];
            for (name, value) in replacements {
                if name == self.key() && record.key().value() != value {
                    key_index.remove(record.key().value());
                    key_index.insert(value.clone());
                }
                if let Some(field) = record.get_mut(name) {
                    field.set_value(value.clone());
                }
            }
        }

        tracing::debug!(
            "Updated {} record(s) in table '{}'",
            matched.len(),
            self.name()
        );
        Ok(matched.len())
    }

    /// Removes every record matching the conditions.
    ///
    /// # Errors
    /// - `NotFound` if no record matches
    ///
    /// # Returns
    /// Number of records removed.
    pub fn remove(&self, conditions: &Conditions) -> Result<usize, DbError> {
        let mut state = self.lock()?;
        let matched = state.matching_indices(self.key(), conditions);
        if matched.is_empty() {
            return Err(DbError::NotFound {
                table: self.name().to_string(),
            });
        }

        let doomed: HashSet<String> = matched
            .iter()
            .map(|&index| state.records[index].key().value().to_string())
            .collect();

        let TableState { records, key_index } = &mut *state;
        records.retain(|record| !doomed.contains(record.key().value()));
        for key in &doomed {
            key_index.remove(key);
        }

        tracing::debug!(
            "Removed {} record(s) from table '{}'",
            doomed.len(),
            self.name()
        );
        Ok(doomed.len())
    }

    /// Joins `other` into a copy of this table on equal key values.
    ///
    /// Each left record gains the non-key fields of the right record with
    /// the same key value; fields already present on the left are kept.
    /// Left records without a partner are copied unchanged and right-only
    /// keys do not appear. Both tables are locked in id order for the
    /// duration of the scan.
    ///
    /// # Returns
    /// A new table named `left+right` keyed like this table.
    pub fn join(&self, other: &Table) -> Result<Table, DbError> {
        let records = if self.id() == other.id() {
            let state = self.lock()?;
            join_records(&state.records, &state.records)
        } else {
            let (left, right) = self.lock_pair(other)?;
            join_records(&left.records, &right.records)
        };

        tracing::debug!(
            "Joined table '{}' with '{}' ({} record(s))",
            self.name(),
            other.name(),
            records.len()
        );
        Table::with_records(
            format!("{}+{}", self.name(), other.name()),
            self.key(),
            records,
        )
    }

    /// Locks this table and `other`, lower id first.
    fn lock_pair<'a>(
        &'a self,
        other: &'a Table,
    ) -> Result<
        (
            std::sync::MutexGuard<'a, TableState>,
            std::sync::MutexGuard<'a, TableState>,
        ),
        DbError,
    > {
        if self.id() < other.id() {
            let left = self.lock()?;
            let right = other.lock()?;
            Ok((left, right))
        } else {
            let right = other.lock()?;
            let left = self.lock()?;
            Ok((left, right))
        }
    }
}

fn join_records(left: &[Record], right: &[Record]) -> Vec<Record> {
    left.iter()
        .map(|record| {
            let mut joined = record.clone();
            for partner in right
                .iter()
                .filter(|partner| partner.key().value() == record.key().value())
            {
                for field in partner.fields() {
                    if !joined.contains(field.name()) {
                        joined.push(field.clone());
                    }
                }
            }
            joined
        })
        .collect()
}
