//! Integration tests for sessions opened through the factory boundary.

use serde_json::json;
use storage::{InMemoryDatabase, RowKey, SessionFactory, Table};

const TEAMS: Table = Table::new("tasks", "teams");
const OTHER_TEAMS: Table = Table::new("scheduling", "teams");

#[tokio::test]
async fn concurrent_sessions_saving_same_key_leave_one_row() {
    let db = InMemoryDatabase::new();
    let factory: &dyn SessionFactory = &db;

    let mut first = factory.open();
    let mut second = factory.open();

    first
        .upsert(TEAMS, RowKey::of(7), json!({"id": 7, "name": "first"}))
        .await
        .unwrap();
    second
        .upsert(TEAMS, RowKey::of(7), json!({"id": 7, "name": "second"}))
        .await
        .unwrap();

    first.commit().await.unwrap();
    second.commit().await.unwrap();

    assert_eq!(db.row_count(TEAMS).await, 1);
    assert_eq!(
        db.get(TEAMS, &RowKey::of(7)).await.unwrap()["name"],
        "second"
    );
}

#[tokio::test]
async fn uncommitted_writes_are_invisible_to_other_sessions() {
    let db = InMemoryDatabase::new();

    let mut writer = db.open();
    let reader = db.open();

    writer
        .upsert(TEAMS, RowKey::of(1), json!({"id": 1}))
        .await
        .unwrap();

    assert!(reader.get(TEAMS, &RowKey::of(1)).await.unwrap().is_none());

    writer.commit().await.unwrap();
    assert!(reader.get(TEAMS, &RowKey::of(1)).await.unwrap().is_some());
}

#[tokio::test]
async fn contexts_have_disjoint_tables() {
    let db = InMemoryDatabase::new();
    let mut session = db.open();

    session
        .upsert(TEAMS, RowKey::of(7), json!({"id": 7}))
        .await
        .unwrap();
    session.commit().await.unwrap();

    assert_eq!(db.row_count(TEAMS).await, 1);
    assert_eq!(db.row_count(OTHER_TEAMS).await, 0);
}

#[tokio::test]
async fn close_discards_uncommitted_writes() {
    let db = InMemoryDatabase::new();
    let mut session = db.open();

    session
        .upsert(TEAMS, RowKey::of(1), json!({}))
        .await
        .unwrap();
    session.close().await.unwrap();

    assert_eq!(db.row_count(TEAMS).await, 0);
    assert!(session.commit().await.is_err());
}
