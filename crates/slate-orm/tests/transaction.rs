//! Integration tests for `Engine::transaction`.

mod common;

use common::{User, engine, user_session};
use slate_orm::OrmError;

#[tokio::test]
async fn test_commit_on_success() {
    let engine = engine().await;
    let mut session = user_session(&engine).await;

    let inserted = engine
        .transaction(async |tx| {
            tx.insert(&[User::new("Tom", 18), User::new("Sam", 20)]).await
        })
        .await
        .unwrap();
    assert_eq!(inserted, 2);
    assert_eq!(session.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_rollback_on_error_returns_work_error() {
    let engine = engine().await;
    let mut session = user_session(&engine).await;

    let err = engine
        .transaction(async |tx| {
            tx.insert(&[User::new("Tom", 18)]).await?;
            // Duplicate primary key.
            tx.insert(&[User::new("Tom", 19)]).await
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Database(_)));
    assert_eq!(session.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_rollback_on_user_error() {
    let engine = engine().await;
    let mut session = user_session(&engine).await;

    let err = engine
        .transaction(async |tx| -> slate_orm::Result<()> {
            tx.insert(&[User::new("Tom", 18)]).await?;
            Err(OrmError::NotFound)
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(session.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_rollback_on_panic() {
    let engine = engine().await;
    let mut session = user_session(&engine).await;

    let err = engine
        .transaction(async |tx| -> slate_orm::Result<()> {
            tx.insert(&[User::new("Tom", 18)]).await?;
            panic!("worker crashed");
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Aborted(ref msg) if msg == "worker crashed"));
    assert_eq!(session.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_transaction_sees_its_own_writes() {
    let engine = engine().await;
    let _session = user_session(&engine).await;

    let count = engine
        .transaction(async |tx| {
            tx.insert(&[User::new("Tom", 18)]).await?;
            tx.model::<User>()?.count().await
        })
        .await
        .unwrap();
    assert_eq!(count, 1);
}
