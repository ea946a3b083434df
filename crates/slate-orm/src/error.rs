//! Error types for the ORM.

use slate_core::{DecodeError, HookError, SchemaError};
use thiserror::Error;

/// ORM-specific errors.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An operation needs a bound model and none is set.
    #[error("no model is bound to the session")]
    NoModel,

    /// No row matched a `first` query.
    #[error("record not found")]
    NotFound,

    /// The entity's schema could not be derived.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A result row does not match the bound schema.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// An entity hook rejected the operation.
    #[error("hook failed: {0}")]
    Hook(#[from] HookError),

    /// A column name is not part of the bound schema.
    #[error("invalid field: {0}")]
    InvalidField(String),

    /// An update has no column to set.
    #[error("update has no columns to set")]
    EmptyUpdate,

    /// A sample entity has no non-zero field to filter on.
    #[error("sample entity has no non-zero field to filter on")]
    EmptyFilter,

    /// A unit of work panicked; its transaction was rolled back.
    #[error("unit of work aborted: {0}")]
    Aborted(String),

    /// No dialect is registered for the driver.
    #[error("no dialect registered for driver `{0}`")]
    UnknownDialect(String),

    /// Invalid engine configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl OrmError {
    /// Returns whether this is the not-found condition of `first`.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Result type alias for ORM operations.
pub type Result<T> = std::result::Result<T, OrmError>;
