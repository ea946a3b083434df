//! Error types for migrations.

use slate_orm::OrmError;
use thiserror::Error;

/// Errors that can occur while migrating a table.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Error from the ORM layer (schema, executor, transaction).
    #[error("{0}")]
    Orm(#[from] OrmError),

    /// A migration statement was rejected; the transaction was rolled back.
    #[error("migration of `{table}` failed on `{sql}`: {source}")]
    Statement {
        /// Table being migrated.
        table: String,
        /// Statement that failed.
        sql: String,
        /// Underlying error.
        #[source]
        source: OrmError,
    },
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
