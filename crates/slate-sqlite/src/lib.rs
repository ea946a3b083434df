//! # slate-sqlite
//!
//! SQLite dialect for `slate-core`.
//!
//! # How SQLite differs from other dialects
//!
//! - **[Type affinity]**: declared column types only select an affinity, so
//!   `bool` and `datetime` columns store integers and text. Decoding in
//!   `slate-core` accepts those storage classes.
//! - **Table existence**: checked against `sqlite_master`.
//! - **Limited [ALTER TABLE]**: only `ADD COLUMN` and `RENAME TO` are used by
//!   migrations; removed columns are handled by rebuilding the table.
//!
//! [Type affinity]: https://www.sqlite.org/datatype3.html
//! [ALTER TABLE]: https://www.sqlite.org/lang_altertable.html
//!
//! ## Example
//!
//! ```rust
//! use slate_core::{Dialect, ValueKind};
//! use slate_sqlite::{SqliteDialect, dialect_for};
//!
//! assert_eq!(SqliteDialect::new().data_type_of(ValueKind::Text), "text");
//! assert!(dialect_for("sqlite3").is_some());
//! assert!(dialect_for("postgres").is_none());
//! ```

mod dialect;

use std::sync::Arc;

pub use dialect::SqliteDialect;
use slate_core::Dialect;

/// Returns the dialect registered for a driver name.
#[must_use]
pub fn dialect_for(driver: &str) -> Option<Arc<dyn Dialect>> {
    match driver {
        "sqlite" | "sqlite3" => Some(Arc::new(SqliteDialect::new())),
        _ => None,
    }
}
