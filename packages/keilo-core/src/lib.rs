//! Core of the keilo tabular store.
//!
//! Provides keyed tables with conditional select/update/remove, sorting
//! and two-table joins, a database container owning tables by name, and
//! JSON file persistence.

pub mod config;
pub mod database;
pub mod error;
pub mod persistence;
pub mod table;

pub use database::Database;
pub use error::DbError;
pub use table::{Conditions, Field, Record, SortOrder, Table};
