//! SQLite dialect implementation.

use slate_core::dialect::Dialect;
use slate_core::value::{SqlValue, ValueKind};

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn data_type_of(&self, kind: ValueKind) -> &'static str {
        // Declared types only pick an affinity; `bool` and `datetime` keep
        // the intent visible in the schema.
        match kind {
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::BigInt => "bigint",
            ValueKind::Real => "real",
            ValueKind::Text => "text",
            ValueKind::Blob => "blob",
            ValueKind::DateTime => "datetime",
        }
    }

    fn table_exists_sql(&self, table: &str) -> (String, Vec<SqlValue>) {
        (
            String::from("SELECT name FROM sqlite_master WHERE type='table' and name = ?"),
            vec![SqlValue::Text(String::from(table))],
        )
    }

    fn list_tables_sql(&self) -> String {
        String::from(
            "SELECT name FROM sqlite_master WHERE type='table' \
             AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
    }
}
