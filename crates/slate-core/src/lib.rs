//! # slate-core
//!
//! The storage-independent half of the slate relational mapper.
//!
//! This crate provides:
//! - A value model ([`SqlValue`], [`ToSqlValue`], [`FieldType`]) shared by
//!   statements and decoded rows
//! - A clause composition engine ([`ClauseBuilder`]) that assembles ordered
//!   SQL fragments with correctly positioned bound parameters
//! - Schema introspection ([`SchemaCatalog`]) deriving a table definition from
//!   an [`Entity`] and caching it per type
//! - The [`Dialect`] capability consumed for type names and catalog queries
//!
//! Executing statements, sessions and migrations live in `slate-orm` and
//! `slate-migrate`.

pub mod clause;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod schema;
pub mod value;

pub use clause::{Clause, ClauseBuilder, ClauseKind};
pub use dialect::Dialect;
pub use entity::{Entity, EntityDescriptor, FieldDescriptor, Hooks};
pub use error::{DecodeError, HookError, SchemaError};
pub use schema::{Field, Schema, SchemaCatalog};
pub use value::{FieldType, SqlValue, ToSqlValue, ValueKind};
