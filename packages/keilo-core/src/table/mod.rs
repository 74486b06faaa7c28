//! Keyed tables, their records and fields, and the condition-matching
//! query operations.

mod field;
mod query;
mod record;
#[allow(clippy::module_inception)]
mod table;

pub use field::Field;
pub use query::Conditions;
pub use record::Record;
pub use table::{SortOrder, Table};
