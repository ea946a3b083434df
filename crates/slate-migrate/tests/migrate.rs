//! Integration tests for `Migrator` against SQLite.

use slate_derive::Entity;
use slate_migrate::{MigrateError, Migrator};
use slate_orm::{Engine, EngineOptions, SqlValue};

#[derive(Debug, Clone, Default, PartialEq, Entity)]
pub struct User {
    #[orm("constraint:PRIMARY KEY")]
    pub name: String,
    pub age: i32,
}

async fn engine() -> Engine {
    Engine::connect(&EngineOptions::default())
        .await
        .unwrap_or_else(|e| panic!("Failed to open in-memory engine: {e}"))
}

async fn run(engine: &Engine, sql: &str) {
    Migrator::new(engine)
        .execute(sql)
        .await
        .unwrap_or_else(|e| panic!("Failed to run {sql}: {e}"));
}

async fn select(engine: &Engine, sql: &str) -> Vec<Vec<SqlValue>> {
    engine
        .session()
        .raw(sql, Vec::<SqlValue>::new())
        .query_rows()
        .await
        .unwrap_or_else(|e| panic!("Failed to query {sql}: {e}"))
        .rows
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_migrate_creates_missing_table() {
    let engine = engine().await;
    let migrator = Migrator::new(&engine);

    let report = migrator.migrate::<User>().await.unwrap();
    assert!(report.created);
    assert_eq!(report.table, "User");
    assert!(report.added.is_empty());
    assert_eq!(migrator.tables().await.unwrap(), names(&["User"]));
    assert_eq!(migrator.columns("User").await.unwrap(), names(&["name", "age"]));

    let plan = migrator.plan::<User>().await.unwrap();
    assert!(plan.is_empty());
    assert!(!plan.create);
}

// =============================================================================
// Add
// =============================================================================

#[tokio::test]
async fn test_migrate_adds_missing_column_and_keeps_rows() {
    let engine = engine().await;
    run(&engine, "CREATE TABLE User (name text PRIMARY KEY)").await;
    run(&engine, "INSERT INTO User (name) VALUES ('Tom'), ('Sam')").await;

    let migrator = Migrator::new(&engine);
    let plan = migrator.plan::<User>().await.unwrap();
    assert_eq!(
        plan.statements,
        names(&["ALTER TABLE User ADD COLUMN age integer"])
    );

    let report = migrator.migrate::<User>().await.unwrap();
    assert!(!report.created);
    assert_eq!(report.added, names(&["age"]));
    assert!(report.removed.is_empty());
    assert_eq!(migrator.columns("User").await.unwrap(), names(&["name", "age"]));

    let rows = select(&engine, "SELECT name, age FROM User ORDER BY name").await;
    assert_eq!(
        rows,
        vec![
            vec![SqlValue::from("Sam"), SqlValue::Null],
            vec![SqlValue::from("Tom"), SqlValue::Null],
        ]
    );
}

// =============================================================================
// Remove
// =============================================================================

#[tokio::test]
async fn test_migrate_drops_unmodeled_column_and_keeps_modeled_data() {
    let engine = engine().await;
    run(
        &engine,
        "CREATE TABLE User (name text PRIMARY KEY, XXX integer, age integer)",
    )
    .await;
    run(
        &engine,
        "INSERT INTO User (name, XXX, age) VALUES ('Tom', 7, 18), ('Sam', 8, 20)",
    )
    .await;

    let migrator = Migrator::new(&engine);
    let plan = migrator.plan::<User>().await.unwrap();
    assert_eq!(
        plan.statements,
        names(&[
            "CREATE TABLE tmp_User AS SELECT name, age FROM User",
            "DROP TABLE User",
            "ALTER TABLE tmp_User RENAME TO User",
        ])
    );

    let report = migrator.migrate::<User>().await.unwrap();
    assert!(report.added.is_empty());
    assert_eq!(report.removed, names(&["XXX"]));
    assert_eq!(migrator.columns("User").await.unwrap(), names(&["name", "age"]));
    assert_eq!(migrator.tables().await.unwrap(), names(&["User"]));

    let mut session = engine.session();
    let mut users: Vec<User> = Vec::new();
    session.order_by("age").find(&mut users).await.unwrap();
    assert_eq!(
        users,
        vec![
            User {
                name: "Tom".to_string(),
                age: 18
            },
            User {
                name: "Sam".to_string(),
                age: 20
            },
        ]
    );
}

#[tokio::test]
async fn test_migrate_adds_and_removes_in_one_run() {
    let engine = engine().await;
    run(&engine, "CREATE TABLE User (name text, legacy text)").await;
    run(&engine, "INSERT INTO User (name, legacy) VALUES ('Tom', 'x')").await;

    let report = Migrator::new(&engine).migrate::<User>().await.unwrap();
    assert_eq!(report.added, names(&["age"]));
    assert_eq!(report.removed, names(&["legacy"]));

    let rows = select(&engine, "SELECT * FROM User").await;
    assert_eq!(rows, vec![vec![SqlValue::from("Tom"), SqlValue::Null]]);
}

// =============================================================================
// Failure
// =============================================================================

#[tokio::test]
async fn test_failed_statement_rolls_back_whole_migration() {
    let engine = engine().await;
    run(&engine, "CREATE TABLE User (name text, legacy text)").await;
    // Occupies the rebuild's temporary name so the rebuild fails after the
    // ADD COLUMN already ran.
    run(&engine, "CREATE TABLE tmp_User (x integer)").await;

    let migrator = Migrator::new(&engine);
    let err = migrator.migrate::<User>().await.unwrap_err();
    match err {
        MigrateError::Statement { table, sql, .. } => {
            assert_eq!(table, "User");
            assert!(sql.starts_with("CREATE TABLE tmp_User"), "{sql}");
        }
        other => panic!("Expected a statement error, got {other:?}"),
    }
    assert_eq!(
        migrator.columns("User").await.unwrap(),
        names(&["name", "legacy"])
    );
}

// =============================================================================
// File-backed database
// =============================================================================

#[tokio::test]
async fn test_migration_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slate.db");
    let options = EngineOptions::new(format!("sqlite:{}?mode=rwc", path.display()))
        .max_connections(2);

    let engine = Engine::connect(&options).await.unwrap();
    run(&engine, "CREATE TABLE User (name text PRIMARY KEY, XXX integer)").await;
    run(&engine, "INSERT INTO User (name, XXX) VALUES ('Tom', 1)").await;
    let report = Migrator::new(&engine).migrate::<User>().await.unwrap();
    assert_eq!(report.added, names(&["age"]));
    assert_eq!(report.removed, names(&["XXX"]));
    engine.close().await;

    let engine = Engine::connect(&options).await.unwrap();
    let migrator = Migrator::new(&engine);
    assert!(migrator.plan::<User>().await.unwrap().is_empty());
    let rows = select(&engine, "SELECT name FROM User").await;
    assert_eq!(rows, vec![vec![SqlValue::from("Tom")]]);
    engine.close().await;
}
