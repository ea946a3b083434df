//! Model binding and table-level operations.

use slate_core::{Entity, Schema, SqlValue};
use tracing::debug;

use super::{Binding, Session, TypeHooks};
use crate::error::{OrmError, Result};
use crate::executor::Executor;

impl<C> Session<C> {
    /// Binds the session to entity type `E`.
    ///
    /// Rebinding the same type keeps the current table override; binding a
    /// different type drops it.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Schema`] when `E`'s schema cannot be derived.
    pub fn model<E: Entity>(&mut self) -> Result<&mut Self> {
        if self.binding.as_ref().is_some_and(|b| b.schema.is_for::<E>()) {
            return Ok(self);
        }
        let schema = self.catalog.schema::<E>()?;
        debug!(parent: &self.span, entity = schema.entity(), table = schema.name(), "bound model");
        self.binding = Some(Binding {
            schema,
            hooks: TypeHooks::of::<E>(),
            table: None,
        });
        Ok(self)
    }

    /// Overrides the table name of the bound model for later operations.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::NoModel`] when no model is bound.
    pub fn table(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        let binding = self.binding.as_mut().ok_or(OrmError::NoModel)?;
        binding.table = Some(name.into());
        Ok(self)
    }

    /// Returns the schema of the bound model.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::NoModel`] when no model is bound.
    pub fn ref_table(&self) -> Result<&Schema> {
        Ok(&self.binding()?.schema)
    }

    /// Returns the table name operations use: the override, or the schema's.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::NoModel`] when no model is bound.
    pub fn table_name(&self) -> Result<&str> {
        Ok(self.binding()?.table_name())
    }
}

impl<C: Executor> Session<C> {
    /// Creates the bound model's table.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::NoModel`] or the database error.
    pub async fn create_table(&mut self) -> Result<u64> {
        let result = self.create_table_inner().await;
        self.finish(result)
    }

    async fn create_table_inner(&mut self) -> Result<u64> {
        let binding = self.binding()?;
        let sql = binding.schema.create_table_sql(binding.table_name());
        self.raw(&sql, Vec::<SqlValue>::new()).exec().await
    }

    /// Drops the bound model's table.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::NoModel`] or the database error.
    pub async fn drop_table(&mut self) -> Result<u64> {
        let result = self.drop_table_inner().await;
        self.finish(result)
    }

    async fn drop_table_inner(&mut self) -> Result<u64> {
        let sql = format!("DROP TABLE IF EXISTS {}", self.table_name()?);
        self.raw(&sql, Vec::<SqlValue>::new()).exec().await
    }

    /// Returns whether the bound model's table exists.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::NoModel`] or the database error.
    pub async fn has_table(&mut self) -> Result<bool> {
        let result = self.has_table_inner().await;
        self.finish(result)
    }

    async fn has_table_inner(&mut self) -> Result<bool> {
        let table = self.table_name()?.to_string();
        let (sql, params) = self.dialect().table_exists_sql(&table);
        let row = self.raw(&sql, params).query_row().await?;
        Ok(matches!(row.as_deref(), Some([SqlValue::Text(name), ..]) if *name == table))
    }
}
