//! Column-level schema migration for slate entities.
//!
//! `slate-migrate` keeps a live table's columns in line with the fields an
//! entity declares. It adds missing columns in place and rebuilds the table
//! when columns were removed from the entity. There is no migration history:
//! each run diffs the live table against the current schema.
//!
//! # Example
//!
//! ```rust,ignore
//! use slate_migrate::Migrator;
//! use slate_orm::{Engine, EngineOptions};
//!
//! let engine = Engine::connect(&EngineOptions::new("sqlite:app.db")).await?;
//! let report = Migrator::new(&engine).migrate::<User>().await?;
//! println!("added {:?}, removed {:?}", report.added, report.removed);
//! ```

pub mod error;
pub mod migrator;

pub use error::{MigrateError, Result};
pub use migrator::{MigrationPlan, MigrationReport, Migrator};
