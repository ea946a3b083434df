//! Clause composition.
//!
//! A statement is assembled from independently settable clauses. Each
//! [`ClauseKind`] owns at most one rendered fragment; setting it again
//! replaces the previous one. [`ClauseBuilder::build`] joins the fragments in
//! the order the caller asks for and concatenates their bound values in that
//! same order, so placeholder positions always line up with parameters.
//!
//! ```rust
//! use slate_core::clause::{Clause, ClauseBuilder, ClauseKind};
//! use slate_core::SqlValue;
//!
//! let mut clauses = ClauseBuilder::new();
//! clauses.set(Clause::Limit(3));
//! clauses.set(Clause::select("User", &["*"]));
//! clauses.set(Clause::filter("Name = ?", vec![SqlValue::from("Tom")]));
//! clauses.set(Clause::OrderBy("Age ASC".into()));
//!
//! let (sql, params) = clauses.build(&[
//!     ClauseKind::Select,
//!     ClauseKind::Where,
//!     ClauseKind::OrderBy,
//!     ClauseKind::Limit,
//! ]);
//! assert_eq!(sql, "SELECT * FROM User WHERE Name = ? ORDER BY Age ASC LIMIT ?");
//! assert_eq!(params, vec![SqlValue::from("Tom"), SqlValue::Int(3)]);
//! ```

use std::collections::BTreeMap;

use crate::value::SqlValue;

/// The kinds of clause a statement can be composed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClauseKind {
    /// `INSERT INTO t (cols)`
    Insert,
    /// `VALUES (?, ?), ...`
    Values,
    /// `SELECT cols FROM t`
    Select,
    /// `LIMIT ?`
    Limit,
    /// `WHERE predicate`
    Where,
    /// `ORDER BY text`
    OrderBy,
    /// `UPDATE t SET col = ?, ...`
    Update,
    /// `DELETE FROM t`
    Delete,
    /// `SELECT count(*) FROM t`
    Count,
}

/// A clause together with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Insert target table and columns.
    Insert {
        /// Target table.
        table: String,
        /// Column names in value order.
        columns: Vec<String>,
    },
    /// One or more rows of values.
    Values(Vec<Vec<SqlValue>>),
    /// Select source table and columns.
    Select {
        /// Source table.
        table: String,
        /// Column names in row order.
        columns: Vec<String>,
    },
    /// Row limit, bound as a parameter.
    Limit(i64),
    /// Predicate template with positional parameters.
    Where {
        /// Boolean expression with `?` placeholders.
        predicate: String,
        /// Parameters in placeholder order.
        params: Vec<SqlValue>,
    },
    /// Ordering text, inserted verbatim.
    OrderBy(String),
    /// Update target and ordered assignments.
    Update {
        /// Target table.
        table: String,
        /// Column/value pairs; fragment and parameters follow this order.
        assignments: Vec<(String, SqlValue)>,
    },
    /// Delete target table.
    Delete {
        /// Target table.
        table: String,
    },
    /// Count source table.
    Count {
        /// Source table.
        table: String,
    },
}

impl Clause {
    /// Creates an INSERT clause.
    pub fn insert<S: AsRef<str>>(table: &str, columns: &[S]) -> Self {
        Self::Insert {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    /// Creates a SELECT clause.
    pub fn select<S: AsRef<str>>(table: &str, columns: &[S]) -> Self {
        Self::Select {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    /// Creates a WHERE clause.
    pub fn filter(predicate: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self::Where {
            predicate: predicate.into(),
            params,
        }
    }

    /// Returns the slot this clause occupies.
    #[must_use]
    pub const fn kind(&self) -> ClauseKind {
        match self {
            Self::Insert { .. } => ClauseKind::Insert,
            Self::Values(_) => ClauseKind::Values,
            Self::Select { .. } => ClauseKind::Select,
            Self::Limit(_) => ClauseKind::Limit,
            Self::Where { .. } => ClauseKind::Where,
            Self::OrderBy(_) => ClauseKind::OrderBy,
            Self::Update { .. } => ClauseKind::Update,
            Self::Delete { .. } => ClauseKind::Delete,
            Self::Count { .. } => ClauseKind::Count,
        }
    }

    /// Renders the clause into SQL text and its bound values.
    #[must_use]
    pub fn render(self) -> (String, Vec<SqlValue>) {
        match self {
            Self::Insert { table, columns } => {
                (format!("INSERT INTO {table} ({})", columns.join(",")), vec![])
            }
            Self::Values(rows) => render_values(rows),
            Self::Select { table, columns } => {
                (format!("SELECT {} FROM {table}", columns.join(", ")), vec![])
            }
            Self::Limit(n) => (String::from("LIMIT ?"), vec![SqlValue::Int(n)]),
            Self::Where { predicate, params } => (format!("WHERE {predicate}"), params),
            Self::OrderBy(text) => (format!("ORDER BY {text}"), vec![]),
            Self::Update { table, assignments } => {
                // One pass yields both the SET list and the values.
                let mut sets = Vec::with_capacity(assignments.len());
                let mut params = Vec::with_capacity(assignments.len());
                for (column, value) in assignments {
                    sets.push(format!("{column} = ?"));
                    params.push(value);
                }
                (format!("UPDATE {table} SET {}", sets.join(", ")), params)
            }
            Self::Delete { table } => (format!("DELETE FROM {table}"), vec![]),
            Self::Count { table } => Self::select(&table, &["count(*)"]).render(),
        }
    }
}

fn bind_vars(num: usize) -> String {
    vec![SqlValue::placeholder(); num].join(", ")
}

fn render_values(rows: Vec<Vec<SqlValue>>) -> (String, Vec<SqlValue>) {
    let mut sql = String::from("VALUES ");
    let mut params = Vec::new();
    for (i, row) in rows.into_iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        sql.push_str(&bind_vars(row.len()));
        sql.push(')');
        params.extend(row);
    }
    (sql, params)
}

#[derive(Debug, Clone, PartialEq)]
struct Fragment {
    sql: String,
    params: Vec<SqlValue>,
}

/// Holds one rendered fragment per clause kind and composes statements.
#[derive(Debug, Clone, Default)]
pub struct ClauseBuilder {
    slots: BTreeMap<ClauseKind, Fragment>,
}

impl ClauseBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `clause` into its slot, replacing whatever was there.
    pub fn set(&mut self, clause: Clause) {
        let kind = clause.kind();
        let (sql, params) = clause.render();
        self.slots.insert(kind, Fragment { sql, params });
    }

    /// Returns whether the slot for `kind` holds a fragment.
    #[must_use]
    pub fn is_set(&self, kind: ClauseKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// Returns whether no slot is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Joins the fragments of `order` with spaces, skipping unset slots.
    ///
    /// Bound values are concatenated in the same order as the fragments.
    #[must_use]
    pub fn build(&self, order: &[ClauseKind]) -> (String, Vec<SqlValue>) {
        let mut parts = Vec::with_capacity(order.len());
        let mut params = Vec::new();
        for kind in order {
            if let Some(fragment) = self.slots.get(kind) {
                parts.push(fragment.sql.as_str());
                params.extend(fragment.params.iter().cloned());
            }
        }
        (parts.join(" "), params)
    }

    /// Resets every slot.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
