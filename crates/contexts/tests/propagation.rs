//! Cross-context propagation through the fully wired bus.

use std::sync::Arc;

use common::{TeamId, UserId, UserRole};
use contexts::shared::UserProjection;
use contexts::{Services, calendar, evaluations, scheduling, tasks, teams};
use domain::events::{
    MemberAddedToTeam, MemberRemovedFromTeam, MemberRoleChanged, TeamCreated, UserDeleted,
    UserRegistered, UserUpdated,
};
use domain::{DomainError, DomainEvent, EventBus, EventKind};
use storage::{InMemoryDatabase, RowKey, StorageError, Table};

async fn setup() -> (InMemoryDatabase, Services) {
    let db = InMemoryDatabase::new();
    let services = Services::bootstrap(Arc::new(db.clone()), EventBus::new())
        .await
        .unwrap();
    (db, services)
}

async fn publish(services: &Services, event: impl Into<DomainEvent>) -> domain::Result<()> {
    services.bus.publish(&event.into()).await
}

async fn user_row(db: &InMemoryDatabase, table: Table, id: i64) -> Option<UserProjection> {
    db.get(table, &RowKey::of(id))
        .await
        .map(|row| serde_json::from_value(row).unwrap())
}

#[tokio::test]
async fn every_event_type_has_handlers_in_table_order() {
    let (_db, services) = setup().await;

    for kind in EventKind::ALL {
        assert!(services.bus.subscriber_count(*kind).await > 0, "{kind}");
    }

    let names = services.bus.subscribers(EventKind::UserRegistered).await;
    let expected = [
        "TeamsRepositories",
        "TasksRepositories",
        "EvaluationsRepositories",
        "SchedulingRepositories",
        "CalendarRepositories",
    ];
    assert_eq!(names.len(), expected.len());
    for (name, context) in names.iter().zip(expected) {
        assert!(name.contains(context), "{name} should belong to {context}");
    }

    assert_eq!(services.bus.subscriber_count(EventKind::TeamCreated).await, 2);
    assert_eq!(services.bus.subscriber_count(EventKind::TaskUpdated).await, 2);
    assert_eq!(services.bus.subscriber_count(EventKind::MeetingCancelled).await, 1);
}

#[tokio::test]
async fn user_registration_reaches_every_consuming_context() {
    let (db, services) = setup().await;

    publish(&services, UserRegistered::new(UserId::new(42), "a"))
        .await
        .unwrap();

    for table in [
        teams::USERS,
        tasks::USERS,
        evaluations::USERS,
        scheduling::USERS,
        calendar::USERS,
    ] {
        let user = user_row(&db, table, 42).await.unwrap();
        assert_eq!(user, UserProjection::new(UserId::new(42), "a"), "{table}");
    }
}

#[tokio::test]
async fn failing_fourth_handler_leaves_partial_propagation() {
    let (db, services) = setup().await;
    db.reject_writes_to(scheduling::USERS).await;

    let err = publish(&services, UserRegistered::new(UserId::new(42), "a"))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Handler { .. }));
    assert!(matches!(
        err.root_cause(),
        DomainError::Storage(StorageError::CommitFailed(_))
    ));
    assert_eq!(err.handler_chain().len(), 1);
    assert!(err.handler_chain()[0].contains("SchedulingRepositories"));

    for table in [teams::USERS, tasks::USERS, evaluations::USERS] {
        assert!(user_row(&db, table, 42).await.is_some(), "{table}");
    }
    for table in [scheduling::USERS, calendar::USERS] {
        assert!(user_row(&db, table, 42).await.is_none(), "{table}");
    }
}

#[tokio::test]
async fn update_of_unknown_user_creates_the_row() {
    let (db, services) = setup().await;

    publish(&services, UserUpdated::new(UserId::new(5), "late"))
        .await
        .unwrap();

    let user = user_row(&db, tasks::USERS, 5).await.unwrap();
    assert_eq!(user.username, "late");
}

#[tokio::test]
async fn team_and_membership_flow_into_tasks_and_scheduling() {
    let (db, services) = setup().await;
    let team_id = TeamId::new(7);
    let user_id = UserId::new(3);

    publish(&services, TeamCreated::new(team_id, UserId::new(1)))
        .await
        .unwrap();
    assert!(db.get(tasks::TEAMS, &RowKey::of(7)).await.is_some());
    assert!(db.get(scheduling::TEAMS, &RowKey::of(7)).await.is_some());

    publish(
        &services,
        MemberAddedToTeam::new(team_id, user_id, UserRole::Member),
    )
    .await
    .unwrap();

    let member = db
        .get(tasks::MEMBERS, &RowKey::triple(7, 3, "member"))
        .await
        .unwrap();
    assert_eq!(member["team_id"], 7);
    assert_eq!(member["user_id"], 3);
    assert_eq!(member["role"], "member");

    let team: scheduling::TeamProjection =
        serde_json::from_value(db.get(scheduling::TEAMS, &RowKey::of(7)).await.unwrap()).unwrap();
    assert!(team.is_member(user_id));
    assert!(!team.is_manager(user_id));

    publish(
        &services,
        MemberRemovedFromTeam::new(team_id, user_id, UserRole::Member),
    )
    .await
    .unwrap();

    assert_eq!(db.row_count(tasks::MEMBERS).await, 0);
    let team: scheduling::TeamProjection =
        serde_json::from_value(db.get(scheduling::TEAMS, &RowKey::of(7)).await.unwrap()).unwrap();
    assert!(!team.is_member(user_id));
}

#[tokio::test]
async fn role_change_moves_the_membership_row() {
    let (db, services) = setup().await;
    let team_id = TeamId::new(7);
    let user_id = UserId::new(3);

    publish(
        &services,
        MemberAddedToTeam::new(team_id, user_id, UserRole::Member),
    )
    .await
    .unwrap();
    publish(
        &services,
        MemberRoleChanged::new(team_id, user_id, UserRole::Member, UserRole::Manager),
    )
    .await
    .unwrap();

    assert!(
        db.get(tasks::MEMBERS, &RowKey::triple(7, 3, "member"))
            .await
            .is_none()
    );
    assert!(
        db.get(tasks::MEMBERS, &RowKey::triple(7, 3, "manager"))
            .await
            .is_some()
    );

    let team: scheduling::TeamProjection =
        serde_json::from_value(db.get(scheduling::TEAMS, &RowKey::of(7)).await.unwrap()).unwrap();
    assert!(team.is_manager(user_id));
}

#[tokio::test]
async fn replaying_events_does_not_duplicate_rows() {
    let (db, services) = setup().await;
    let added = MemberAddedToTeam::new(TeamId::new(7), UserId::new(3), UserRole::Member);

    for _ in 0..2 {
        publish(&services, TeamCreated::new(TeamId::new(7), UserId::new(1)))
            .await
            .unwrap();
        publish(&services, added.clone()).await.unwrap();
        publish(&services, UserRegistered::new(UserId::new(3), "c"))
            .await
            .unwrap();
    }

    assert_eq!(db.row_count(tasks::TEAMS).await, 1);
    assert_eq!(db.row_count(tasks::MEMBERS).await, 1);
    assert_eq!(db.row_count(tasks::USERS).await, 1);
    assert_eq!(db.row_count(scheduling::TEAMS).await, 1);

    let team: scheduling::TeamProjection =
        serde_json::from_value(db.get(scheduling::TEAMS, &RowKey::of(7)).await.unwrap()).unwrap();
    assert_eq!(team.members.len(), 1);
}

#[tokio::test]
async fn replayed_registration_keeps_user_deleted() {
    let (db, services) = setup().await;
    let user_id = UserId::new(42);

    publish(&services, UserRegistered::new(user_id, "a"))
        .await
        .unwrap();
    publish(&services, UserDeleted::new(user_id)).await.unwrap();
    publish(&services, UserRegistered::new(user_id, "a"))
        .await
        .unwrap();

    for table in [
        teams::USERS,
        tasks::USERS,
        evaluations::USERS,
        scheduling::USERS,
        calendar::USERS,
    ] {
        let user = user_row(&db, table, 42).await.unwrap();
        assert!(user.deleted, "{table}");
        assert_eq!(user.username, "a");
    }
    assert_eq!(db.row_count(tasks::USERS).await, 1);
}
