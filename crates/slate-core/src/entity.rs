//! Entity description and lifecycle hooks.
//!
//! An [`Entity`] is a Rust struct mapped to one table. Its shape is described
//! statically by an [`EntityDescriptor`], usually generated by
//! `#[derive(Entity)]`, and turned into a [`crate::Schema`] once per type by
//! the [`crate::SchemaCatalog`].
//!
//! # Example
//!
//! ```rust
//! use slate_core::entity::{EntityDescriptor, FieldDescriptor, decode_field};
//! use slate_core::{DecodeError, Entity, FieldType, Hooks, SqlValue};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct User {
//!     name: String,
//!     age: i64,
//! }
//!
//! impl Hooks for User {}
//!
//! impl Entity for User {
//!     const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
//!         name: "User",
//!         table: None,
//!         fields: &[
//!             FieldDescriptor::new("name", Some("constraint:PRIMARY KEY"), String::KIND),
//!             FieldDescriptor::new("age", None, i64::KIND),
//!         ],
//!     };
//!
//!     fn values(&self) -> Vec<SqlValue> {
//!         vec![self.name.to_value(), self.age.to_value()]
//!     }
//!
//!     fn from_values(values: Vec<SqlValue>) -> Result<Self, DecodeError> {
//!         let mut values = values.into_iter();
//!         Ok(Self {
//!             name: decode_field(&mut values, "name")?,
//!             age: decode_field(&mut values, "age")?,
//!         })
//!     }
//! }
//! ```

use crate::error::{DecodeError, HookError};
use crate::value::{FieldType, SqlValue, ValueKind};

/// Static description of one mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Logical name (the Rust field identifier).
    pub name: &'static str,
    /// Raw `key:value;key:value` annotation, if any.
    pub annotation: Option<&'static str>,
    /// Type class of the field.
    pub kind: ValueKind,
}

impl FieldDescriptor {
    /// Creates a field descriptor.
    #[must_use]
    pub const fn new(name: &'static str, annotation: Option<&'static str>, kind: ValueKind) -> Self {
        Self {
            name,
            annotation,
            kind,
        }
    }
}

/// Static description of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Rust type identifier; the default table name.
    pub name: &'static str,
    /// Table name override.
    pub table: Option<&'static str>,
    /// Mapped fields in declaration order.
    pub fields: &'static [FieldDescriptor],
}

/// A struct mapped to a table.
///
/// `values` and `from_values` must use the order of `DESCRIPTOR.fields`;
/// that order is also the column order of CREATE TABLE, INSERT and SELECT.
pub trait Entity: Hooks + Sized + 'static {
    /// Static description of the mapped fields.
    const DESCRIPTOR: EntityDescriptor;

    /// Returns the field values in declaration order.
    fn values(&self) -> Vec<SqlValue>;

    /// Returns, in declaration order, whether each field holds a non-zero
    /// value of its type.
    ///
    /// The default inspects the encoded values, which misreads types whose
    /// zero encodes to a non-empty value; the derive checks each field
    /// through [`FieldType::is_zero`].
    fn non_zero_mask(&self) -> Vec<bool> {
        self.values().iter().map(|value| !value.is_zero()).collect()
    }

    /// Builds an entity from column values in declaration order.
    fn from_values(values: Vec<SqlValue>) -> Result<Self, DecodeError>;
}

/// Takes the next column value and decodes it as field `name`.
///
/// Used by `from_values` implementations, including the derived ones.
pub fn decode_field<T: FieldType>(
    values: &mut impl Iterator<Item = SqlValue>,
    name: &str,
) -> Result<T, DecodeError> {
    let value = values
        .next()
        .ok_or_else(|| DecodeError::MissingColumn(name.to_string()))?;
    T::from_value(value).map_err(|e| e.for_field(name))
}

/// Lifecycle callbacks run by the session around CRUD verbs.
///
/// Every method defaults to doing nothing. An error aborts the verb and is
/// returned to the caller.
pub trait Hooks {
    /// Runs for each entity before its row is added to an INSERT.
    fn before_insert(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs for each entity after the INSERT succeeded.
    fn after_insert(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs before a SELECT for this entity type is executed.
    fn before_query() -> Result<(), HookError>
    where
        Self: Sized,
    {
        Ok(())
    }

    /// Runs for each entity decoded from a result row.
    fn after_query(&mut self) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs before an UPDATE against this entity's table.
    fn before_update() -> Result<(), HookError>
    where
        Self: Sized,
    {
        Ok(())
    }

    /// Runs after an UPDATE against this entity's table.
    fn after_update() -> Result<(), HookError>
    where
        Self: Sized,
    {
        Ok(())
    }

    /// Runs before a DELETE against this entity's table.
    fn before_delete() -> Result<(), HookError>
    where
        Self: Sized,
    {
        Ok(())
    }

    /// Runs after a DELETE against this entity's table.
    fn after_delete() -> Result<(), HookError>
    where
        Self: Sized,
    {
        Ok(())
    }
}
