//! Integration tests for entity hooks.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::engine;
use slate_derive::Entity;
use slate_orm::{HookError, Hooks, OrmError};

static UPDATES: AtomicUsize = AtomicUsize::new(0);
static DELETES: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Default, PartialEq, Entity)]
#[orm(hooks)]
struct Note {
    #[orm("constraint:PRIMARY KEY")]
    id: i64,
    body: String,
    #[orm(skip)]
    loaded: bool,
}

impl Hooks for Note {
    fn before_insert(&self) -> Result<(), HookError> {
        if self.body.is_empty() {
            return Err(HookError::new("body must not be empty"));
        }
        Ok(())
    }

    fn after_query(&mut self) -> Result<(), HookError> {
        self.loaded = true;
        Ok(())
    }

    fn after_update() -> Result<(), HookError> {
        UPDATES.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn before_delete() -> Result<(), HookError> {
        DELETES.fetch_add(1, Ordering::SeqCst);
        Err(HookError::new("notes are never deleted"))
    }
}

#[tokio::test]
async fn test_hooks_run_around_verbs() {
    let engine = engine().await;
    let mut session = engine.session();
    session.model::<Note>().unwrap().create_table().await.unwrap();

    let err = session
        .insert(&[Note {
            id: 1,
            ..Note::default()
        }])
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Hook(_)));
    assert_eq!(session.count().await.unwrap(), 0);

    session
        .insert(&[Note {
            id: 1,
            body: "hello".to_string(),
            loaded: false,
        }])
        .await
        .unwrap();

    let note: Note = session.first().await.unwrap();
    assert!(note.loaded);
    assert_eq!(note.body, "hello");

    let before = UPDATES.load(Ordering::SeqCst);
    session.update([("body", "bye")]).await.unwrap();
    assert_eq!(UPDATES.load(Ordering::SeqCst), before + 1);

    let err = session.delete().await.unwrap_err();
    assert!(matches!(err, OrmError::Hook(_)));
    assert_eq!(DELETES.load(Ordering::SeqCst), 1);
    assert_eq!(session.count().await.unwrap(), 1);
}
