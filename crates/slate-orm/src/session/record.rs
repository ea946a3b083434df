//! Record verbs: insert, find, first, update, save, delete and count, plus
//! the filter, limit and ordering modifiers they consume.

use std::sync::Arc;

use slate_core::{Clause, ClauseKind, DecodeError, Entity, SqlValue};

use super::Session;
use crate::error::{OrmError, Result};
use crate::executor::Executor;

impl<C> Session<C> {
    /// Sets the WHERE clause, replacing any earlier filter.
    ///
    /// Each `?` in `predicate` is bound to the next value of `params`.
    pub fn where_clause<I, V>(&mut self, predicate: &str, params: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let params = params.into_iter().map(Into::into).collect();
        self.clauses.set(Clause::filter(predicate, params));
        self
    }

    /// Binds `E` and filters on every non-zero field of `sample`, joined
    /// with `AND`.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::EmptyFilter`] when every field of `sample` is
    /// zero, or [`OrmError::Schema`] when `E` has no valid schema.
    pub fn where_sample<E: Entity>(&mut self, sample: &E) -> Result<&mut Self> {
        self.model::<E>()?;
        let columns = self.binding()?.schema.non_zero_columns(sample);
        if columns.is_empty() {
            return Err(OrmError::EmptyFilter);
        }
        let predicate = columns
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(" AND ");
        let params = columns.into_iter().map(|(_, value)| value);
        Ok(self.where_clause(&predicate, params))
    }

    /// Caps the number of rows a query returns.
    pub fn limit(&mut self, count: i64) -> &mut Self {
        self.clauses.set(Clause::Limit(count));
        self
    }

    /// Orders query results by `order`, e.g. `"age DESC"`.
    pub fn order_by(&mut self, order: impl Into<String>) -> &mut Self {
        self.clauses.set(Clause::OrderBy(order.into()));
        self
    }
}

impl<C: Executor> Session<C> {
    /// Inserts `entities` in one statement and returns the affected rows.
    ///
    /// Runs `before_insert` on every entity first and `after_insert` once the
    /// statement succeeded. An empty slice inserts nothing.
    ///
    /// # Errors
    ///
    /// Returns the first hook error, or the database error.
    pub async fn insert<E: Entity>(&mut self, entities: &[E]) -> Result<u64> {
        let result = self.insert_inner(entities).await;
        self.finish(result)
    }

    async fn insert_inner<E: Entity>(&mut self, entities: &[E]) -> Result<u64> {
        if entities.is_empty() {
            return Ok(0);
        }
        self.model::<E>()?;
        let binding = self.binding()?;
        let schema = Arc::clone(&binding.schema);
        let table = binding.table_name().to_string();

        let mut rows = Vec::with_capacity(entities.len());
        for entity in entities {
            entity.before_insert()?;
            rows.push(schema.record_values(entity));
        }
        self.clauses.set(Clause::insert(&table, schema.column_names()));
        self.clauses.set(Clause::Values(rows));
        self.stage(&[ClauseKind::Insert, ClauseKind::Values]);
        let affected = self.exec().await?;

        for entity in entities {
            entity.after_insert()?;
        }
        Ok(affected)
    }

    /// Appends every row matching the pending filter to `dest`.
    ///
    /// Runs `E::before_query` before the statement and `after_query` on every
    /// decoded entity.
    ///
    /// # Errors
    ///
    /// Returns a hook error, the database error, or [`OrmError::Decode`] when
    /// a row does not fit `E`.
    pub async fn find<E: Entity>(&mut self, dest: &mut Vec<E>) -> Result<()> {
        let result = self.find_inner(dest).await;
        self.finish(result)
    }

    async fn find_inner<E: Entity>(&mut self, dest: &mut Vec<E>) -> Result<()> {
        self.model::<E>()?;
        E::before_query()?;
        let binding = self.binding()?;
        let schema = Arc::clone(&binding.schema);
        let table = binding.table_name().to_string();

        self.clauses.set(Clause::select(&table, schema.column_names()));
        self.stage(&[
            ClauseKind::Select,
            ClauseKind::Where,
            ClauseKind::OrderBy,
            ClauseKind::Limit,
        ]);
        let rows = self.query_rows().await?;

        let expected = schema.fields().len();
        if rows.columns.len() != expected {
            return Err(DecodeError::ColumnCount {
                expected,
                found: rows.columns.len(),
            }
            .into());
        }
        dest.reserve(rows.rows.len());
        for row in rows.rows {
            let mut entity = E::from_values(row)?;
            entity.after_query()?;
            dest.push(entity);
        }
        Ok(())
    }

    /// Returns the first row matching the pending filter.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::NotFound`] when no row matches, or any error of
    /// [`find`](Self::find).
    pub async fn first<E: Entity>(&mut self) -> Result<E> {
        let mut found = Vec::with_capacity(1);
        self.limit(1).find(&mut found).await?;
        found.into_iter().next().ok_or(OrmError::NotFound)
    }

    /// Updates the bound table, setting each `(field, value)` pair on the
    /// rows matching the pending filter. Fields may be given by logical or
    /// column name; assignments keep their order.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::NoModel`], [`OrmError::InvalidField`] for a name
    /// outside the schema, [`OrmError::EmptyUpdate`] for no pairs, a hook
    /// error, or the database error.
    pub async fn update<I, K, V>(&mut self, assignments: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<SqlValue>,
    {
        let result = self.update_inner(assignments).await;
        self.finish(result)
    }

    async fn update_inner<I, K, V>(&mut self, assignments: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<SqlValue>,
    {
        let resolved = self.resolve_assignments(assignments)?;
        self.update_columns(resolved).await
    }

    fn resolve_assignments<I, K, V>(&self, assignments: I) -> Result<Vec<(String, SqlValue)>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<SqlValue>,
    {
        let schema = &self.binding()?.schema;
        assignments
            .into_iter()
            .map(|(key, value)| {
                let key = key.as_ref();
                schema
                    .field(key)
                    .map(|field| (field.column.clone(), value.into()))
                    .ok_or_else(|| OrmError::InvalidField(key.to_string()))
            })
            .collect()
    }

    /// Binds `E` and updates every non-zero field of `entity` on the rows
    /// matching the pending filter.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::EmptyUpdate`] when every field of `entity` is
    /// zero, a hook error, or the database error.
    pub async fn save<E: Entity>(&mut self, entity: &E) -> Result<u64> {
        let result = self.save_inner(entity).await;
        self.finish(result)
    }

    async fn save_inner<E: Entity>(&mut self, entity: &E) -> Result<u64> {
        self.model::<E>()?;
        let assignments = self.binding()?.schema.non_zero_columns(entity);
        self.update_columns(assignments).await
    }

    async fn update_columns(&mut self, assignments: Vec<(String, SqlValue)>) -> Result<u64> {
        if assignments.is_empty() {
            return Err(OrmError::EmptyUpdate);
        }
        let binding = self.binding()?;
        let hooks = binding.hooks;
        let table = binding.table_name().to_string();

        (hooks.before_update)()?;
        self.clauses.set(Clause::Update { table, assignments });
        self.stage(&[ClauseKind::Update, ClauseKind::Where]);
        let affected = self.exec().await?;
        (hooks.after_update)()?;
        Ok(affected)
    }

    /// Deletes the rows of the bound table matching the pending filter.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::NoModel`], a hook error, or the database error.
    pub async fn delete(&mut self) -> Result<u64> {
        let result = self.delete_inner().await;
        self.finish(result)
    }

    async fn delete_inner(&mut self) -> Result<u64> {
        let binding = self.binding()?;
        let hooks = binding.hooks;
        let table = binding.table_name().to_string();

        (hooks.before_delete)()?;
        self.clauses.set(Clause::Delete { table });
        self.stage(&[ClauseKind::Delete, ClauseKind::Where]);
        let affected = self.exec().await?;
        (hooks.after_delete)()?;
        Ok(affected)
    }

    /// Counts the rows of the bound table matching the pending filter.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::NoModel`] or the database error.
    pub async fn count(&mut self) -> Result<i64> {
        let result = self.count_inner().await;
        self.finish(result)
    }

    async fn count_inner(&mut self) -> Result<i64> {
        let table = self.table_name()?.to_string();
        self.clauses.set(Clause::Count { table });
        self.stage(&[ClauseKind::Count, ClauseKind::Where]);
        match self.query_row().await? {
            Some(row) => match row.first() {
                Some(SqlValue::Int(n)) => Ok(*n),
                other => Err(DecodeError::TypeMismatch {
                    field: "count(*)".to_string(),
                    expected: "i64",
                    found: other.map_or("null", SqlValue::type_name),
                }
                .into()),
            },
            None => Ok(0),
        }
    }
}
