//! # slate-orm
//!
//! Sessions and record verbs over sqlx for entities described with
//! `#[derive(Entity)]`.
//!
//! An [`Engine`] owns the connection pool and a schema catalog shared by all
//! of its sessions. A [`Session`] binds a model, collects clauses and runs
//! one statement per terminal verb:
//!
//! ```ignore
//! use slate_derive::Entity;
//! use slate_orm::{Engine, EngineOptions};
//!
//! #[derive(Debug, Default, Entity)]
//! struct User {
//!     #[orm("constraint:PRIMARY KEY")]
//!     name: String,
//!     age: i32,
//! }
//!
//! let engine = Engine::connect(&EngineOptions::default()).await?;
//! let mut session = engine.session();
//! session.model::<User>()?.create_table().await?;
//! session.insert(&[User { name: "Tom".into(), age: 18 }]).await?;
//!
//! let tom: User = session
//!     .where_sample(&User { name: "Tom".into(), ..User::default() })?
//!     .first()
//!     .await?;
//! ```
//!
//! Transactions run a closure against a [`TxSession`] and commit or roll
//! back depending on its outcome, see [`Engine::transaction`].

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod session;

pub use config::EngineOptions;
pub use engine::{Engine, TxSession};
pub use error::{OrmError, Result};
pub use executor::{Executor, Rows};
pub use session::Session;

pub use slate_core::{DecodeError, Entity, HookError, Hooks, SqlValue};
