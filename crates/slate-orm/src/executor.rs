//! Statement execution over sqlx.
//!
//! Sessions talk to the database only through [`Executor`], implemented for
//! a pool, a single connection and an open transaction. Rows come back as
//! plain [`SqlValue`] vectors; decoding into entities happens in the session.

use slate_core::SqlValue;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column as _, Row as _, Sqlite, SqliteConnection, SqlitePool, Transaction};
use sqlx::{TypeInfo as _, ValueRef as _};

use crate::error::Result;

/// Rows returned by a query, with their column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// Row values in column order.
    pub rows: Vec<Vec<SqlValue>>,
}

/// Runs composed statements against a database.
#[allow(async_fn_in_trait)]
pub trait Executor {
    /// Executes a statement and returns the number of affected rows.
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    /// Runs a query and returns its first row, if any.
    async fn query_row(&mut self, sql: &str, params: &[SqlValue]) -> Result<Option<Vec<SqlValue>>>;

    /// Runs a query and returns every row.
    async fn query_rows(&mut self, sql: &str, params: &[SqlValue]) -> Result<Rows>;

    /// Returns the result columns of a query without fetching rows.
    async fn columns(&mut self, sql: &str) -> Result<Vec<String>>;
}

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Binds a SqlValue parameter to a raw query.
fn bind_param<'q>(query: SqliteQuery<'q>, value: &SqlValue) -> SqliteQuery<'q> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Blob(b) => query.bind(b.clone()),
    }
}

fn build_query<'q>(sql: &'q str, params: &[SqlValue]) -> SqliteQuery<'q> {
    params.iter().fold(sqlx::query(sql), bind_param)
}

/// Reads one column using the storage class of the stored value.
fn decode_column(row: &SqliteRow, index: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let storage = raw.type_info().name().to_string();
    let value = match storage.as_str() {
        "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get_unchecked(index)?),
        "REAL" => SqlValue::Float(row.try_get_unchecked(index)?),
        "BLOB" => SqlValue::Blob(row.try_get_unchecked(index)?),
        _ => SqlValue::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}

fn decode_row(row: &SqliteRow) -> Result<Vec<SqlValue>> {
    (0..row.len()).map(|i| decode_column(row, i)).collect()
}

async fn execute_on<'c, E>(conn: E, sql: &str, params: &[SqlValue]) -> Result<u64>
where
    E: sqlx::Executor<'c, Database = Sqlite>,
{
    let result = build_query(sql, params).execute(conn).await?;
    Ok(result.rows_affected())
}

async fn query_row_on<'c, E>(conn: E, sql: &str, params: &[SqlValue]) -> Result<Option<Vec<SqlValue>>>
where
    E: sqlx::Executor<'c, Database = Sqlite>,
{
    let row = build_query(sql, params).fetch_optional(conn).await?;
    row.as_ref().map(decode_row).transpose()
}

async fn query_rows_on<'c, E>(conn: E, sql: &str, params: &[SqlValue]) -> Result<Vec<SqliteRow>>
where
    E: sqlx::Executor<'c, Database = Sqlite>,
{
    Ok(build_query(sql, params).fetch_all(conn).await?)
}

async fn columns_on<'c, E>(conn: E, sql: &str) -> Result<Vec<String>>
where
    E: sqlx::Executor<'c, Database = Sqlite>,
{
    // Described statements are prepared fresh, never served from the
    // statement cache, so columns added by a migration are visible.
    let described = conn.describe(sql).await?;
    Ok(described
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect())
}

fn row_columns(row: &SqliteRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// Implements [`Executor`] for a type given how to borrow a sqlx executor
/// from it.
macro_rules! impl_executor {
    ($ty:ty, |$this:ident| $conn:expr) => {
        impl Executor for $ty {
            async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
                let $this = self;
                execute_on($conn, sql, params).await
            }

            async fn query_row(
                &mut self,
                sql: &str,
                params: &[SqlValue],
            ) -> Result<Option<Vec<SqlValue>>> {
                let $this = self;
                query_row_on($conn, sql, params).await
            }

            async fn query_rows(&mut self, sql: &str, params: &[SqlValue]) -> Result<Rows> {
                let $this = self;
                let fetched = query_rows_on($conn, sql, params).await?;
                let columns = match fetched.first() {
                    Some(row) => row_columns(row),
                    None => columns_on($conn, sql).await?,
                };
                let rows = fetched.iter().map(decode_row).collect::<Result<_>>()?;
                Ok(Rows { columns, rows })
            }

            async fn columns(&mut self, sql: &str) -> Result<Vec<String>> {
                let $this = self;
                columns_on($conn, sql).await
            }
        }
    };
}

impl_executor!(SqlitePool, |this| &*this);
impl_executor!(SqliteConnection, |this| &mut *this);
impl_executor!(Transaction<'_, Sqlite>, |this| &mut **this);
