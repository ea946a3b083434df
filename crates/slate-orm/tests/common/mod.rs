#![allow(dead_code)]

use slate_derive::Entity;
use slate_orm::{Engine, EngineOptions, Session};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Default, PartialEq, Entity)]
pub struct User {
    #[orm("constraint:PRIMARY KEY")]
    pub name: String,
    pub age: i32,
}

impl User {
    pub fn new(name: &str, age: i32) -> Self {
        Self {
            name: name.to_string(),
            age,
        }
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            age: 0,
        }
    }
}

pub async fn engine() -> Engine {
    Engine::connect(&EngineOptions::default().max_connections(1))
        .await
        .unwrap_or_else(|e| panic!("Failed to open in-memory engine: {e}"))
}

/// Returns a session over a fresh database with the `User` table created.
pub async fn user_session(engine: &Engine) -> Session<SqlitePool> {
    let mut session = engine.session();
    session
        .model::<User>()
        .unwrap()
        .create_table()
        .await
        .unwrap_or_else(|e| panic!("Failed to create User table: {e}"));
    session
}

pub async fn seed(session: &mut Session<SqlitePool>) {
    let users = [User::new("Tom", 18), User::new("Sam", 20), User::new("Jack", 22)];
    let affected = session.insert(&users).await.unwrap();
    assert_eq!(affected, 3);
}
