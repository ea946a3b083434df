//! Error types for schema introspection and row decoding.

use thiserror::Error;

/// Errors raised while deriving a [`crate::Schema`] from an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// An annotation pair is not of the form `key:value`.
    #[error("malformed annotation on {entity}.{field}: `{pair}` is not a key:value pair")]
    MalformedAnnotation {
        /// Entity type name.
        entity: String,
        /// Field carrying the annotation.
        field: String,
        /// The offending pair.
        pair: String,
    },

    /// Two fields map to the same column.
    #[error("column `{column}` is mapped twice in {entity}")]
    DuplicateColumn {
        /// Entity type name.
        entity: String,
        /// Column name.
        column: String,
    },

    /// The entity declares no mapped fields.
    #[error("entity {0} has no mapped fields")]
    NoFields(String),
}

/// Errors raised while decoding a result row into an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The row has a different number of columns than the schema has fields.
    #[error("row has {found} columns but the schema maps {expected} fields")]
    ColumnCount {
        /// Number of mapped fields.
        expected: usize,
        /// Number of columns returned.
        found: usize,
    },

    /// The row ran out of columns before every field was filled.
    #[error("no column left for field `{0}`")]
    MissingColumn(String),

    /// A column holds a value of the wrong storage class.
    #[error("field `{field}` expects {expected}, found {found}")]
    TypeMismatch {
        /// Field being decoded.
        field: String,
        /// Expected Rust type.
        expected: &'static str,
        /// Storage class found in the row.
        found: &'static str,
    },

    /// An integer column does not fit the field's type.
    #[error("field `{field}`: {value} does not fit in {target}")]
    OutOfRange {
        /// Field being decoded.
        field: String,
        /// Stored value.
        value: i64,
        /// Target Rust type.
        target: &'static str,
    },

    /// A text column could not be parsed as a date-time.
    #[error("field `{field}`: `{text}` is not a valid date-time")]
    InvalidDateTime {
        /// Field being decoded.
        field: String,
        /// Stored text.
        text: String,
    },
}

impl DecodeError {
    /// Attaches the field name to an error raised by a [`crate::FieldType`].
    #[must_use]
    pub fn for_field(self, name: &str) -> Self {
        match self {
            Self::TypeMismatch {
                expected, found, ..
            } => Self::TypeMismatch {
                field: name.to_string(),
                expected,
                found,
            },
            Self::OutOfRange { value, target, .. } => Self::OutOfRange {
                field: name.to_string(),
                value,
                target,
            },
            Self::InvalidDateTime { text, .. } => Self::InvalidDateTime {
                field: name.to_string(),
                text,
            },
            other => other,
        }
    }
}

/// Error returned by an entity [`crate::Hooks`] callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    /// Creates a hook error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
