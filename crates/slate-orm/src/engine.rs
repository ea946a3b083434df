//! The engine: a connection pool, a dialect and a shared schema catalog.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use slate_core::{Dialect, SchemaCatalog};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Connection, Sqlite, SqlitePool, Transaction};
use tracing::{Span, error, info, info_span, warn};

use crate::config::EngineOptions;
use crate::error::{OrmError, Result};
use crate::session::Session;

/// A session running inside a database transaction.
pub type TxSession = Session<Transaction<'static, Sqlite>>;

/// Entry point of the ORM: owns the pool and hands out sessions.
///
/// Cloning is cheap; clones share the pool and the schema catalog.
#[derive(Debug, Clone)]
pub struct Engine {
    pool: SqlitePool,
    catalog: Arc<SchemaCatalog>,
    span: Span,
    debug: bool,
}

impl Engine {
    /// Opens a pool for `options`, pings it and selects the dialect from the
    /// URL scheme.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Config`] for invalid options,
    /// [`OrmError::UnknownDialect`] for an unsupported scheme, or the
    /// database error when the pool cannot be opened or pinged.
    pub async fn connect(options: &EngineOptions) -> Result<Self> {
        options.validate()?;
        let driver = options.driver();
        let dialect = slate_sqlite::dialect_for(driver)
            .ok_or_else(|| OrmError::UnknownDialect(driver.to_string()))?;

        let mut pool_options = SqlitePoolOptions::new().max_connections(options.max_connections);
        if options.is_memory() {
            // Every connection to `:memory:` opens its own database.
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options.connect(&options.url).await.inspect_err(|e| {
            error!(url = %options.url, error = %e, "failed to open database");
        })?;
        pool.acquire().await?.ping().await?;

        let engine = Self::from_pool(pool, dialect).with_debug(options.debug);
        info!(
            parent: &engine.span,
            dialect = engine.dialect().name(),
            max_connections = options.max_connections,
            "connected to database"
        );
        Ok(engine)
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: SqlitePool, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            pool,
            catalog: Arc::new(SchemaCatalog::new(dialect)),
            span: info_span!("slate"),
            debug: false,
        }
    }

    /// Records events of this engine and its sessions under `span`.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Enables or disables logging statements at `INFO` in new sessions.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Returns the connection pool.
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the shared schema catalog.
    pub const fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.catalog
    }

    /// Returns the span engine and session events are recorded under.
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Returns the dialect.
    pub fn dialect(&self) -> &dyn Dialect {
        self.catalog.dialect().as_ref()
    }

    /// Opens a session running statements on the pool.
    pub fn session(&self) -> Session<SqlitePool> {
        self.session_on(self.pool.clone())
    }

    /// Opens a session over any executor, sharing this engine's catalog.
    pub fn session_on<C>(&self, conn: C) -> Session<C> {
        let mut session =
            Session::new(conn, Arc::clone(&self.catalog)).with_span(self.span.clone());
        session.debug(self.debug);
        session
    }

    /// Runs `work` in a transaction.
    ///
    /// Commits when `work` returns `Ok`. Rolls back and returns the error
    /// when it returns `Err`, and rolls back with [`OrmError::Aborted`]
    /// when it panics. `work` may use any error type that an [`OrmError`]
    /// converts into.
    ///
    /// # Errors
    ///
    /// Returns the error of `work`, [`OrmError::Aborted`], or the database
    /// error from begin or commit.
    pub async fn transaction<T, E, F>(&self, work: F) -> std::result::Result<T, E>
    where
        F: AsyncFnOnce(&mut TxSession) -> std::result::Result<T, E>,
        E: From<OrmError>,
    {
        let tx = self.pool.begin().await.map_err(OrmError::from)?;
        let mut session = self.session_on(tx);
        let outcome = AssertUnwindSafe(work(&mut session)).catch_unwind().await;
        let tx = session.into_inner();

        match outcome {
            Ok(Ok(value)) => {
                tx.commit().await.map_err(OrmError::from)?;
                Ok(value)
            }
            Ok(Err(err)) => {
                self.rollback(tx).await;
                Err(err)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(parent: &self.span, panic = %message, "unit of work panicked");
                self.rollback(tx).await;
                Err(OrmError::Aborted(message).into())
            }
        }
    }

    async fn rollback(&self, tx: Transaction<'static, Sqlite>) {
        if let Err(e) = tx.rollback().await {
            warn!(parent: &self.span, error = %e, "rollback failed");
        }
    }

    /// Closes the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
        info!(parent: &self.span, "database closed");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic with a non-string payload".to_string())
}
