//! Column-level table migration.
//!
//! A migration compares the live columns of an entity's table with the
//! entity's schema:
//!
//! - a missing table is created from the schema
//! - modeled columns missing from the table are added with `ALTER TABLE`
//! - live columns the entity no longer models trigger a rebuild: the modeled
//!   columns are copied into `tmp_<table>`, the table is dropped and the copy
//!   renamed. Data in the unmodeled columns is discarded.
//!
//! Every statement of one migration runs in a single transaction.

use slate_core::Entity;
use slate_orm::{Engine, Executor, Session, SqlValue};
use tracing::info;

use crate::error::{MigrateError, Result};

/// The statements needed to bring a table in line with its entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationPlan {
    /// Table being migrated.
    pub table: String,
    /// Whether the table is missing and will be created.
    pub create: bool,
    /// Modeled columns missing from the live table, in schema order.
    pub added: Vec<String>,
    /// Live columns no longer modeled, in table order.
    pub removed: Vec<String>,
    /// Statements to run, in order.
    pub statements: Vec<String>,
}

impl MigrationPlan {
    /// Returns whether the table already matches the entity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Outcome of an applied migration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Table that was migrated.
    pub table: String,
    /// Whether the table was created.
    pub created: bool,
    /// Columns that were added.
    pub added: Vec<String>,
    /// Columns that were dropped by a rebuild.
    pub removed: Vec<String>,
}

impl From<MigrationPlan> for MigrationReport {
    fn from(plan: MigrationPlan) -> Self {
        Self {
            table: plan.table,
            created: plan.create,
            added: plan.added,
            removed: plan.removed,
        }
    }
}

/// Migrates entity tables of one engine.
#[derive(Debug, Clone, Copy)]
pub struct Migrator<'e> {
    engine: &'e Engine,
}

impl<'e> Migrator<'e> {
    /// Creates a migrator for `engine`.
    #[must_use]
    pub const fn new(engine: &'e Engine) -> Self {
        Self { engine }
    }

    /// Brings the table of `E` in line with its schema.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Statement`] for the first rejected statement,
    /// or [`MigrateError::Orm`] for schema or connection failures. In both
    /// cases nothing of the migration is kept.
    pub async fn migrate<E: Entity>(&self) -> Result<MigrationReport> {
        let report: MigrationReport = self
            .engine
            .transaction(async |tx| -> Result<MigrationReport> {
                let plan = plan_on::<E, _>(tx).await?;
                apply(tx, &plan).await?;
                Ok(plan.into())
            })
            .await?;

        info!(
            parent: self.engine.span(),
            table = %report.table,
            created = report.created,
            added = ?report.added,
            removed = ?report.removed,
            "migrated table"
        );
        Ok(report)
    }

    /// Computes the migration of `E` without applying it.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Orm`] when the schema cannot be derived or the
    /// table cannot be inspected.
    pub async fn plan<E: Entity>(&self) -> Result<MigrationPlan> {
        let mut session = self.engine.session();
        plan_on::<E, _>(&mut session).await
    }

    /// Lists the user tables of the database.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Orm`] when the catalog query fails.
    pub async fn tables(&self) -> Result<Vec<String>> {
        let mut session = self.engine.session();
        let sql = session.dialect().list_tables_sql();
        let rows = session.raw(&sql, no_params()).query_rows().await?;
        Ok(rows
            .rows
            .into_iter()
            .filter_map(|row| match row.into_iter().next() {
                Some(SqlValue::Text(name)) => Some(name),
                _ => None,
            })
            .collect())
    }

    /// Returns the live columns of `table` without fetching any row.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Orm`] when the table cannot be queried.
    pub async fn columns(&self, table: &str) -> Result<Vec<String>> {
        let mut session = self.engine.session();
        Ok(live_columns(&mut session, table).await?)
    }

    /// Runs one raw statement and returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Orm`] when the statement is rejected.
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        let mut session = self.engine.session();
        Ok(session.raw(sql, no_params()).exec().await?)
    }
}

fn no_params() -> std::iter::Empty<SqlValue> {
    std::iter::empty()
}

async fn live_columns<C: Executor>(
    session: &mut Session<C>,
    table: &str,
) -> slate_orm::Result<Vec<String>> {
    let probe = format!("SELECT * FROM {table} LIMIT 1");
    session.raw(&probe, no_params()).columns().await
}

/// Items of `left` missing from `right`, in `left` order.
fn difference(left: &[String], right: &[String]) -> Vec<String> {
    left.iter()
        .filter(|column| !right.contains(column))
        .cloned()
        .collect()
}

async fn plan_on<E: Entity, C: Executor>(session: &mut Session<C>) -> Result<MigrationPlan> {
    session.model::<E>()?;
    let table = session.table_name()?.to_string();

    if !session.has_table().await? {
        let create_sql = session.ref_table()?.create_table_sql(&table);
        return Ok(MigrationPlan {
            table,
            create: true,
            statements: vec![create_sql],
            ..MigrationPlan::default()
        });
    }

    let live = live_columns(session, &table).await?;
    let schema = session.ref_table()?;
    let modeled = schema.column_names();
    let added = difference(modeled, &live);
    let removed = difference(&live, modeled);

    let mut statements: Vec<String> = added
        .iter()
        .filter_map(|column| schema.field(column))
        .map(|field| {
            format!(
                "ALTER TABLE {table} ADD COLUMN {} {}",
                field.column, field.data_type
            )
        })
        .collect();

    if !removed.is_empty() {
        let tmp = format!("tmp_{table}");
        statements.push(format!(
            "CREATE TABLE {tmp} AS SELECT {} FROM {table}",
            modeled.join(", ")
        ));
        statements.push(format!("DROP TABLE {table}"));
        statements.push(format!("ALTER TABLE {tmp} RENAME TO {table}"));
    }

    Ok(MigrationPlan {
        table,
        create: false,
        added,
        removed,
        statements,
    })
}

async fn apply<C: Executor>(session: &mut Session<C>, plan: &MigrationPlan) -> Result<()> {
    for sql in &plan.statements {
        session
            .raw(sql, no_params())
            .exec()
            .await
            .map_err(|source| MigrateError::Statement {
                table: plan.table.clone(),
                sql: sql.clone(),
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_difference_preserves_left_order() {
        let left = names(&["c", "a", "b", "d"]);
        let right = names(&["a", "d"]);
        assert_eq!(difference(&left, &right), names(&["c", "b"]));
        assert!(difference(&right, &left).is_empty());
    }

    #[test]
    fn test_report_from_plan() {
        let plan = MigrationPlan {
            table: "User".to_string(),
            create: false,
            added: names(&["email"]),
            removed: names(&["XXX"]),
            statements: names(&["ALTER TABLE User ADD COLUMN email text"]),
        };
        let report = MigrationReport::from(plan);
        assert_eq!(report.table, "User");
        assert!(!report.created);
        assert_eq!(report.added, names(&["email"]));
        assert_eq!(report.removed, names(&["XXX"]));
    }
}
