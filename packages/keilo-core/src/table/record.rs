//! Record (row) made of a key field and further fields.

use std::collections::HashSet;

use super::field::Field;
use super::query::Conditions;

/// A row: the key field followed by zero or more fields in insertion order.
///
/// The key field's name must equal the owning table's key. Field names are
/// unique within a record once it has been admitted into a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Key field
    key: Field,
    /// Non-key fields in order
    fields: Vec<Field>,
}

impl Record {
    /// Creates a record holding only its key field.
    pub fn new(key: Field) -> Self {
        Self {
            key,
            fields: Vec::new(),
        }
    }

    /// Creates a record from a key field and further fields.
    pub fn with_fields(key: Field, fields: Vec<Field>) -> Self {
        Self { key, fields }
    }

    /// Appends a field and returns the record, for building rows inline.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(Field::new(name, value));
        self
    }

    /// Appends a field.
    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Returns the key field.
    pub fn key(&self) -> &Field {
        &self.key
    }

    /// Returns the non-key fields in order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Iterates over all fields, key first.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        std::iter::once(&self.key).chain(self.fields.iter())
    }

    /// Number of fields including the key.
    pub fn field_count(&self) -> usize {
        self.fields.len() + 1
    }

    /// Returns the value of the first field with the given name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter().find(|f| f.name() == name).map(Field::value)
    }

    /// Returns true if the record has a field with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.iter().any(|f| f.name() == name)
    }

    /// Returns true if every condition pair is present on the record.
    pub fn matches(&self, conditions: &Conditions) -> bool {
        conditions
            .iter()
            .all(|(name, value)| self.get(name) == Some(value.as_str()))
    }

    /// Returns the first field name that occurs more than once, if any.
    pub(crate) fn duplicate_field(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.field_count());
        self.iter()
            .map(Field::name)
            .find(|name| !seen.insert(*name))
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Field> {
        if self.key.name() == name {
            return Some(&mut self.key);
        }
        self.fields.iter_mut().find(|f| f.name() == name)
    }
}
