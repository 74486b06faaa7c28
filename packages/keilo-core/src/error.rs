//! Database error types.

use thiserror::Error;

/// Database operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    /// Record's key field does not match the table's declared key
    #[error("Key field '{got}' does not match key '{expected}' of table '{table}'")]
    KeyFieldMismatch {
        table: String,
        expected: String,
        got: String,
    },

    /// Key value already present in the table's index
    #[error("Key '{key}' already exists in table '{table}'")]
    DuplicateKey { table: String, key: String },

    /// No record matched the given conditions
    #[error("No matching record in table '{table}'")]
    NotFound { table: String },

    /// Field not found on a matched record
    #[error("Field '{field}' not found in table '{table}'")]
    FieldNotFound { table: String, field: String },

    /// Record carries the same field name twice
    #[error("Field '{field}' appears more than once in a record for table '{table}'")]
    DuplicateField { table: String, field: String },

    /// Table not found
    #[error("Table '{table}' not found")]
    TableNotFound { table: String },

    /// Table already exists
    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    /// Lock poisoned
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Data corruption detected
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// Disk full error during persistence
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),
}
