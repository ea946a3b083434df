//! Sessions: the per-unit-of-work statement state.
//!
//! A session owns one executor (a pool, a connection or a transaction), the
//! model it is currently bound to, the pending clauses and a raw statement
//! buffer. Every terminal operation builds its SQL, runs it and clears the
//! pending state, whether it succeeded or not.

mod record;
mod table;

use std::fmt;
use std::sync::Arc;

use slate_core::{ClauseBuilder, ClauseKind, Dialect, Entity, HookError, Schema, SchemaCatalog, SqlValue};
use tracing::{Span, debug, error, info};

use crate::error::{OrmError, Result};
use crate::executor::{Executor, Rows};

type HookFn = fn() -> std::result::Result<(), HookError>;

/// Type-level hooks of the bound entity, captured when the model is bound so
/// verbs that do not name the type can still run them.
#[derive(Clone, Copy)]
struct TypeHooks {
    before_update: HookFn,
    after_update: HookFn,
    before_delete: HookFn,
    after_delete: HookFn,
}

impl TypeHooks {
    fn of<E: Entity>() -> Self {
        Self {
            before_update: E::before_update,
            after_update: E::after_update,
            before_delete: E::before_delete,
            after_delete: E::after_delete,
        }
    }
}

/// The model a session operates on, with its optional table override.
#[derive(Clone)]
struct Binding {
    schema: Arc<Schema>,
    hooks: TypeHooks,
    table: Option<String>,
}

impl Binding {
    fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or_else(|| self.schema.name())
    }
}

/// Statement state over one executor.
///
/// Sessions are used sequentially through `&mut self`; open one per task.
pub struct Session<C> {
    conn: C,
    catalog: Arc<SchemaCatalog>,
    span: Span,
    debug: bool,
    binding: Option<Binding>,
    clauses: ClauseBuilder,
    sql: String,
    params: Vec<SqlValue>,
}

impl<C> Session<C> {
    /// Creates a session over `conn` resolving schemas through `catalog`.
    pub fn new(conn: C, catalog: Arc<SchemaCatalog>) -> Self {
        Self {
            conn,
            catalog,
            span: Span::none(),
            debug: false,
            binding: None,
            clauses: ClauseBuilder::new(),
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Records this session's events under `span`.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Enables or disables logging every statement at `INFO`.
    pub fn debug(&mut self, on: bool) -> &mut Self {
        self.debug = on;
        self
    }

    /// Returns whether statements are logged at `INFO`.
    pub const fn is_debug(&self) -> bool {
        self.debug
    }

    /// Returns the span this session's events are recorded under.
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Returns the dialect statements are written for.
    pub fn dialect(&self) -> &dyn Dialect {
        self.catalog.dialect().as_ref()
    }

    /// Returns the schema catalog.
    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.catalog
    }

    /// Returns the underlying executor.
    pub fn connection(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Consumes the session, returning its executor.
    pub fn into_inner(self) -> C {
        self.conn
    }

    /// Appends raw SQL and its parameters to the statement buffer.
    ///
    /// Buffered text runs before any clause-built text on the next terminal
    /// operation.
    pub fn raw<I, V>(&mut self, sql: &str, params: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        if !self.sql.is_empty() && !sql.is_empty() {
            self.sql.push(' ');
        }
        self.sql.push_str(sql);
        self.params.extend(params.into_iter().map(Into::into));
        self
    }

    /// Discards pending clauses and the raw buffer. The bound model stays.
    pub fn clear(&mut self) -> &mut Self {
        self.clauses.clear();
        self.sql.clear();
        self.params.clear();
        self
    }

    /// Returns the pending raw statement text.
    pub fn pending_sql(&self) -> &str {
        &self.sql
    }

    fn take_statement(&mut self) -> (String, Vec<SqlValue>) {
        (
            std::mem::take(&mut self.sql),
            std::mem::take(&mut self.params),
        )
    }

    /// Builds the pending clauses in `order` into the raw buffer and clears
    /// them.
    fn stage(&mut self, order: &[ClauseKind]) {
        let (sql, params) = self.clauses.build(order);
        self.clauses.clear();
        self.raw(&sql, params);
    }

    fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        self.clear();
        result
    }

    fn binding(&self) -> Result<&Binding> {
        self.binding.as_ref().ok_or(OrmError::NoModel)
    }

    fn log_statement(&self, sql: &str, params: &[SqlValue]) {
        if self.debug {
            info!(parent: &self.span, sql, ?params, "executing statement");
        } else {
            debug!(parent: &self.span, sql, ?params, "executing statement");
        }
    }

    fn log_failure(&self, sql: &str, err: &OrmError) {
        error!(parent: &self.span, sql, error = %err, "statement failed");
    }
}

impl<C: Executor> Session<C> {
    /// Runs the buffered statement and returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns the database error; the buffer is cleared either way.
    pub async fn exec(&mut self) -> Result<u64> {
        let (sql, params) = self.take_statement();
        self.clauses.clear();
        self.log_statement(&sql, &params);
        let result = self.conn.execute(&sql, &params).await;
        result.inspect_err(|e| self.log_failure(&sql, e))
    }

    /// Runs the buffered query and returns its first row, if any.
    ///
    /// # Errors
    ///
    /// Returns the database error; the buffer is cleared either way.
    pub async fn query_row(&mut self) -> Result<Option<Vec<SqlValue>>> {
        let (sql, params) = self.take_statement();
        self.clauses.clear();
        self.log_statement(&sql, &params);
        let result = self.conn.query_row(&sql, &params).await;
        result.inspect_err(|e| self.log_failure(&sql, e))
    }

    /// Runs the buffered query and returns every row with column names.
    ///
    /// # Errors
    ///
    /// Returns the database error; the buffer is cleared either way.
    pub async fn query_rows(&mut self) -> Result<Rows> {
        let (sql, params) = self.take_statement();
        self.clauses.clear();
        self.log_statement(&sql, &params);
        let result = self.conn.query_rows(&sql, &params).await;
        result.inspect_err(|e| self.log_failure(&sql, e))
    }

    /// Returns the result columns of the buffered query without fetching
    /// rows.
    ///
    /// # Errors
    ///
    /// Returns the database error; the buffer is cleared either way.
    pub async fn columns(&mut self) -> Result<Vec<String>> {
        let (sql, params) = self.take_statement();
        self.clauses.clear();
        self.log_statement(&sql, &params);
        let result = self.conn.columns(&sql).await;
        result.inspect_err(|e| self.log_failure(&sql, e))
    }
}

impl<C> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("model", &self.binding.as_ref().map(|b| b.schema.entity()))
            .field("table", &self.binding.as_ref().map(Binding::table_name))
            .field("sql", &self.sql)
            .field("params", &self.params)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate_sqlite::SqliteDialect;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_session() -> Session<SqlitePool> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory SQLite pool");
        Session::new(pool, Arc::new(SchemaCatalog::new(Arc::new(SqliteDialect::new()))))
    }

    #[tokio::test]
    async fn test_raw_buffer_concatenates() {
        let mut session = create_test_session().await;
        session
            .raw("SELECT ?", [1_i64])
            .raw("+ ?", [2_i64]);
        assert_eq!(session.pending_sql(), "SELECT ? + ?");
        let row = session.query_row().await.unwrap();
        assert_eq!(row, Some(vec![SqlValue::Int(3)]));
        assert_eq!(session.pending_sql(), "");
    }

    #[tokio::test]
    async fn test_stage_appends_clauses_after_raw_prefix() {
        use slate_core::Clause;

        let mut session = create_test_session().await;
        session.raw("WITH t AS (SELECT ? AS a)", [1_i64]);
        session.clauses.set(Clause::select("t", &["a"]));
        session
            .clauses
            .set(Clause::filter("a >= ?", vec![SqlValue::Int(0)]));
        session.stage(&[ClauseKind::Select, ClauseKind::Where]);

        assert_eq!(
            session.pending_sql(),
            "WITH t AS (SELECT ? AS a) SELECT a FROM t WHERE a >= ?"
        );
        assert_eq!(session.params, vec![SqlValue::Int(1), SqlValue::Int(0)]);
        let row = session.query_row().await.unwrap();
        assert_eq!(row, Some(vec![SqlValue::Int(1)]));
    }

    #[tokio::test]
    async fn test_buffer_cleared_after_failure() {
        let mut session = create_test_session().await;
        let err = session
            .raw("SELECT * FROM missing", Vec::<SqlValue>::new())
            .query_rows()
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::Database(_)));
        assert_eq!(session.pending_sql(), "");

        let row = session
            .raw("SELECT 1", Vec::<SqlValue>::new())
            .query_row()
            .await
            .unwrap();
        assert_eq!(row, Some(vec![SqlValue::Int(1)]));
    }

    #[tokio::test]
    async fn test_exec_returns_affected_rows() {
        let mut session = create_test_session().await;
        session
            .raw("CREATE TABLE t (a integer)", Vec::<SqlValue>::new())
            .exec()
            .await
            .unwrap();
        let affected = session
            .raw("INSERT INTO t VALUES (?), (?)", [1_i64, 2])
            .exec()
            .await
            .unwrap();
        assert_eq!(affected, 2);
        let columns = session
            .raw("SELECT * FROM t", Vec::<SqlValue>::new())
            .columns()
            .await
            .unwrap();
        assert_eq!(columns, vec!["a"]);
    }

    #[tokio::test]
    async fn test_operations_without_model() {
        let mut session = create_test_session().await;
        assert!(matches!(session.create_table().await, Err(OrmError::NoModel)));
        assert!(matches!(session.count().await, Err(OrmError::NoModel)));
        assert!(matches!(session.delete().await, Err(OrmError::NoModel)));
        assert!(matches!(session.table("t"), Err(OrmError::NoModel)));
    }
}
