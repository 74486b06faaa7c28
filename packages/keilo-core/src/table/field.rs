//! Field instance within a record.

/// A named value inside a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    /// Field name, fixed once created
    name: String,
    /// Field value
    value: String,
}

impl Field {
    /// Creates a new field with the given name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true if both name and value equal the condition pair.
    pub fn matches(&self, name: &str, value: &str) -> bool {
        self.name == name && self.value == value
    }

    pub(crate) fn set_value(&mut self, value: String) {
        self.value = value;
    }
}
