//! Table definitions derived from entities.
//!
//! A [`Schema`] is the table definition of one entity type: the table name,
//! the mapped fields in declaration order and a lookup accepting both logical
//! and column names. Field order is the canonical column order used by
//! CREATE TABLE, INSERT values and row decoding.

pub mod annotation;
mod catalog;

use std::any::TypeId;
use std::collections::HashMap;

pub use catalog::SchemaCatalog;

use crate::dialect::Dialect;
use crate::entity::{Entity, EntityDescriptor};
use crate::error::SchemaError;
use crate::value::SqlValue;

/// One mapped column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Logical name (the Rust field identifier).
    pub name: String,
    /// Column name in the table.
    pub column: String,
    /// Backend column type.
    pub data_type: String,
    /// Raw SQL constraint, empty when absent.
    pub constraint: String,
}

impl Field {
    /// Returns the column definition used in CREATE TABLE.
    #[must_use]
    pub fn definition(&self) -> String {
        if self.constraint.is_empty() {
            format!("{} {}", self.column, self.data_type)
        } else {
            format!("{} {} {}", self.column, self.data_type, self.constraint)
        }
    }
}

/// The table definition of one entity type.
#[derive(Debug, Clone)]
pub struct Schema {
    type_id: TypeId,
    entity: &'static str,
    name: String,
    fields: Vec<Field>,
    columns: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl Schema {
    /// Derives the schema of `E`, resolving column types through `dialect`.
    pub fn parse<E: Entity>(dialect: &dyn Dialect) -> Result<Self, SchemaError> {
        Self::from_descriptor(TypeId::of::<E>(), &E::DESCRIPTOR, dialect)
    }

    /// Derives a schema from a static entity description.
    pub fn from_descriptor(
        type_id: TypeId,
        descriptor: &EntityDescriptor,
        dialect: &dyn Dialect,
    ) -> Result<Self, SchemaError> {
        if descriptor.fields.is_empty() {
            return Err(SchemaError::NoFields(descriptor.name.to_string()));
        }

        let mut fields = Vec::with_capacity(descriptor.fields.len());
        let mut lookup = HashMap::new();
        for (index, desc) in descriptor.fields.iter().enumerate() {
            let settings = match desc.annotation {
                Some(text) => annotation::parse(text).map_err(|e| {
                    SchemaError::MalformedAnnotation {
                        entity: descriptor.name.to_string(),
                        field: desc.name.to_string(),
                        pair: e.0,
                    }
                })?,
                None => annotation::Annotation::default(),
            };
            let field = Field {
                name: desc.name.to_string(),
                column: settings.name.unwrap_or_else(|| desc.name.to_string()),
                data_type: dialect.data_type_of(desc.kind).to_string(),
                constraint: settings.constraint.unwrap_or_default(),
            };

            if fields.iter().any(|f: &Field| f.column == field.column) {
                return Err(SchemaError::DuplicateColumn {
                    entity: descriptor.name.to_string(),
                    column: field.column,
                });
            }
            lookup.insert(field.name.clone(), index);
            lookup.insert(field.column.clone(), index);
            fields.push(field);
        }

        Ok(Self {
            type_id,
            entity: descriptor.name,
            name: descriptor.table.unwrap_or(descriptor.name).to_string(),
            columns: fields.iter().map(|f| f.column.clone()).collect(),
            fields,
            lookup,
        })
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entity type identifier.
    #[must_use]
    pub const fn entity(&self) -> &'static str {
        self.entity
    }

    /// Returns whether this schema was derived from `E`.
    #[must_use]
    pub fn is_for<E: Entity>(&self) -> bool {
        self.type_id == TypeId::of::<E>()
    }

    /// Returns the type identity this schema was derived from.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the mapped fields in column order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the column names in column order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Looks up a field by logical or column name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.lookup.get(name).map(|&i| &self.fields[i])
    }

    /// Extracts the values of `entity` in column order.
    #[must_use]
    pub fn record_values<E: Entity>(&self, entity: &E) -> Vec<SqlValue> {
        debug_assert!(self.is_for::<E>(), "schema of {} used for another type", self.entity);
        entity.values()
    }

    /// Pairs each non-zero field of `entity` with its column name.
    ///
    /// Zero is decided by the field's type: `None` for options, the epoch for
    /// date-times, the empty or zero value otherwise.
    #[must_use]
    pub fn non_zero_columns<E: Entity>(&self, entity: &E) -> Vec<(String, SqlValue)> {
        self.fields
            .iter()
            .zip(self.record_values(entity))
            .zip(entity.non_zero_mask())
            .filter(|(_, non_zero)| *non_zero)
            .map(|((field, value), _)| (field.column.clone(), value))
            .collect()
    }

    /// Returns the CREATE TABLE statement for `table`.
    #[must_use]
    pub fn create_table_sql(&self, table: &str) -> String {
        let columns: Vec<String> = self.fields.iter().map(Field::definition).collect();
        format!("CREATE TABLE {table} ({});", columns.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::FieldDescriptor;
    use crate::value::ValueKind;

    struct TestDialect;

    impl Dialect for TestDialect {
        fn name(&self) -> &'static str {
            "test"
        }

        fn data_type_of(&self, kind: ValueKind) -> &'static str {
            match kind {
                ValueKind::Text => "text",
                _ => "integer",
            }
        }

        fn table_exists_sql(&self, table: &str) -> (String, Vec<SqlValue>) {
            (
                "SELECT name FROM tables WHERE name = ?".to_string(),
                vec![SqlValue::Text(table.to_string())],
            )
        }

        fn list_tables_sql(&self) -> String {
            "SELECT name FROM tables".to_string()
        }
    }

    const USER: EntityDescriptor = EntityDescriptor {
        name: "User",
        table: None,
        fields: &[
            FieldDescriptor::new(
                "name",
                Some("name:user_name;constraint:PRIMARY KEY"),
                ValueKind::Text,
            ),
            FieldDescriptor::new("age", None, ValueKind::BigInt),
        ],
    };

    fn user_schema() -> Schema {
        Schema::from_descriptor(TypeId::of::<()>(), &USER, &TestDialect).unwrap()
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let schema = user_schema();
        assert_eq!(schema.name(), "User");
        assert_eq!(schema.column_names(), &["user_name", "age"]);
        assert_eq!(schema.fields()[0].data_type, "text");
        assert_eq!(schema.fields()[0].constraint, "PRIMARY KEY");
        assert_eq!(schema.fields()[1].constraint, "");
    }

    #[test]
    fn test_lookup_accepts_logical_and_column_names() {
        let schema = user_schema();
        assert_eq!(schema.field("name").unwrap().column, "user_name");
        assert_eq!(schema.field("user_name").unwrap().name, "name");
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn test_create_table_sql() {
        let schema = user_schema();
        assert_eq!(
            schema.create_table_sql("User"),
            "CREATE TABLE User (user_name text PRIMARY KEY,age integer);"
        );
    }

    #[test]
    fn test_table_override_from_descriptor() {
        const RENAMED: EntityDescriptor = EntityDescriptor {
            name: "User",
            table: Some("sys_user"),
            fields: USER.fields,
        };
        let schema = Schema::from_descriptor(TypeId::of::<()>(), &RENAMED, &TestDialect).unwrap();
        assert_eq!(schema.name(), "sys_user");
        assert_eq!(schema.entity(), "User");
    }

    #[test]
    fn test_malformed_annotation_is_an_error() {
        const BROKEN: EntityDescriptor = EntityDescriptor {
            name: "Broken",
            table: None,
            fields: &[FieldDescriptor::new("id", Some("PRIMARY KEY"), ValueKind::BigInt)],
        };
        let err = Schema::from_descriptor(TypeId::of::<()>(), &BROKEN, &TestDialect).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MalformedAnnotation {
                entity: "Broken".to_string(),
                field: "id".to_string(),
                pair: "PRIMARY KEY".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_column_is_an_error() {
        const DUPLICATE: EntityDescriptor = EntityDescriptor {
            name: "Dup",
            table: None,
            fields: &[
                FieldDescriptor::new("a", Some("name:x"), ValueKind::BigInt),
                FieldDescriptor::new("b", Some("name:x"), ValueKind::BigInt),
            ],
        };
        let err = Schema::from_descriptor(TypeId::of::<()>(), &DUPLICATE, &TestDialect).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_entity_without_fields_is_an_error() {
        const EMPTY: EntityDescriptor = EntityDescriptor {
            name: "Empty",
            table: None,
            fields: &[],
        };
        let err = Schema::from_descriptor(TypeId::of::<()>(), &EMPTY, &TestDialect).unwrap_err();
        assert_eq!(err, SchemaError::NoFields("Empty".to_string()));
    }
}
