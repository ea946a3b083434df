//! Dialect capability.
//!
//! The core never hard-codes backend type names or catalog queries; it asks
//! a [`Dialect`] for them.

use crate::value::{SqlValue, ValueKind};

/// Backend-specific SQL knowledge consumed by schema parsing and sessions.
pub trait Dialect: Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the column type for a field of the given type class.
    fn data_type_of(&self, kind: ValueKind) -> &'static str;

    /// Returns a statement that yields the table name as its single column
    /// when `table` exists, and no row otherwise.
    fn table_exists_sql(&self, table: &str) -> (String, Vec<SqlValue>);

    /// Returns a statement listing user table names, one per row.
    fn list_tables_sql(&self) -> String;
}
