//! Integration tests for the unit of work and event propagation.
//!
//! These tests verify commit ordering, publication after storage commit,
//! rollback on failure and the depth-first cascade of handler commits.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::{TeamId, UserId, UserRole};
use domain::events::{MemberAddedToTeam, TeamCreated, UserRegistered};
use domain::{
    AggregateRoot, DomainError, Entity, EventBus, EventHandler, EventRecorder, RepositoryProvider,
    Result, Scope, UnitOfWorkFactory, UnitState,
};
use serde::{Deserialize, Serialize};
use storage::{InMemoryDatabase, RowKey, Table};

const SQUADS: Table = Table::new("test", "squads");

#[derive(Debug, Serialize, Deserialize)]
struct Squad {
    id: i64,
    members: Vec<i64>,
    #[serde(skip)]
    events: EventRecorder,
}

impl Entity for Squad {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }
}

impl AggregateRoot for Squad {
    fn events(&self) -> &EventRecorder {
        &self.events
    }
}

impl Squad {
    fn found(id: i64, founder: i64) -> Self {
        let mut squad = Squad {
            id,
            members: vec![founder],
            events: EventRecorder::new(),
        };
        squad.record_event(TeamCreated::new(TeamId::new(id), UserId::new(founder)));
        squad
    }

    fn enlist(&mut self, user: i64) {
        self.members.push(user);
        self.record_event(MemberAddedToTeam::new(
            TeamId::new(self.id),
            UserId::new(user),
            UserRole::Member,
        ));
    }
}

struct TestRepositories;

impl RepositoryProvider for TestRepositories {
    const CONTEXT: &'static str = "test";

    type Repos<'s> = Squads<'s>;

    fn bind(scope: &mut Scope) -> Squads<'_> {
        Squads { scope }
    }
}

struct Squads<'s> {
    scope: &'s mut Scope,
}

impl Squads<'_> {
    async fn get(&self, id: i64) -> Result<Option<Squad>> {
        self.scope.fetch(SQUADS, &RowKey::of(id)).await
    }

    async fn save(&mut self, squad: &Squad) -> Result<()> {
        self.scope.save(SQUADS, RowKey::of(squad.id), squad).await
    }

    async fn next_id(&mut self) -> Result<i64> {
        self.scope.next_id(SQUADS).await
    }
}

#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

struct Logger {
    label: &'static str,
    journal: Journal,
}

#[async_trait]
impl EventHandler<TeamCreated> for Logger {
    fn name(&self) -> &'static str {
        self.label
    }

    async fn handle(&self, event: &TeamCreated) -> Result<()> {
        self.journal.push(format!("{}:{}", self.label, event.team_id));
        Ok(())
    }
}

#[async_trait]
impl EventHandler<MemberAddedToTeam> for Logger {
    fn name(&self) -> &'static str {
        self.label
    }

    async fn handle(&self, event: &MemberAddedToTeam) -> Result<()> {
        self.journal.push(format!(
            "{}:{}@{}",
            self.label,
            event.user_id,
            EventBus::current_depth()
        ));
        Ok(())
    }
}

/// Reacts to a new squad by founding a mirror squad in its own unit of work.
struct Mirror {
    units: UnitOfWorkFactory<TestRepositories>,
    journal: Journal,
}

#[async_trait]
impl EventHandler<TeamCreated> for Mirror {
    fn name(&self) -> &'static str {
        "mirror"
    }

    async fn handle(&self, event: &TeamCreated) -> Result<()> {
        let journal = self.journal.clone();
        let source = event.team_id.as_i64();

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    journal.push("mirror:start");
                    let mut squad = Squad {
                        id: source + 100,
                        members: Vec::new(),
                        events: EventRecorder::new(),
                    };
                    squad.enlist(3);
                    uow.repos()?.save(&squad).await?;
                    uow.commit().await?;
                    journal.push("mirror:end");
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}

/// Registers a new user every time a user is registered.
struct Echo {
    units: UnitOfWorkFactory<TestRepositories>,
}

#[async_trait]
impl EventHandler<UserRegistered> for Echo {
    async fn handle(&self, event: &UserRegistered) -> Result<()> {
        let username = event.username.clone();

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let id = repos.next_id().await?;
                    let mut squad = Squad {
                        id,
                        members: Vec::new(),
                        events: EventRecorder::new(),
                    };
                    squad.record_event(UserRegistered::new(UserId::new(id), username));
                    repos.save(&squad).await?;
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}

fn setup(bus: EventBus) -> (InMemoryDatabase, UnitOfWorkFactory<TestRepositories>) {
    let db = InMemoryDatabase::new();
    let units = UnitOfWorkFactory::new(Arc::new(db.clone()), bus);
    (db, units)
}

mod commit {
    use super::*;

    #[tokio::test]
    async fn publishes_after_storage_commit_in_recorded_order() {
        let bus = EventBus::new();
        let journal = Journal::default();
        let logger = || Logger {
            label: "log",
            journal: journal.clone(),
        };
        bus.subscribe::<TeamCreated, _>(logger()).await;
        bus.subscribe::<MemberAddedToTeam, _>(logger()).await;
        let (db, units) = setup(bus);

        let mut uow = units.create();
        uow.enter().unwrap();

        let mut first = Squad::found(1, 10);
        first.enlist(11);
        let mut second = Squad::found(2, 20);
        second.enlist(21);

        {
            let mut repos = uow.repos().unwrap();
            repos.save(&first).await.unwrap();
            repos.save(&second).await.unwrap();
        }
        assert!(journal.entries().is_empty());

        uow.commit().await.unwrap();
        uow.exit(false).await.unwrap();

        assert_eq!(db.row_count(SQUADS).await, 2);
        assert_eq!(
            journal.entries(),
            vec!["log:1", "log:11@1", "log:2", "log:21@1"]
        );
    }

    #[tokio::test]
    async fn saving_same_aggregate_twice_publishes_once() {
        let bus = EventBus::new();
        let journal = Journal::default();
        bus.subscribe::<TeamCreated, _>(Logger {
            label: "log",
            journal: journal.clone(),
        })
        .await;
        let (_db, units) = setup(bus);

        let mut uow = units.create();
        uow.enter().unwrap();

        let squad = Squad::found(1, 10);
        uow.repos().unwrap().save(&squad).await.unwrap();
        uow.repos().unwrap().save(&squad).await.unwrap();
        assert_eq!(uow.scope().unwrap().tracked(), 1);

        uow.commit().await.unwrap();
        uow.exit(false).await.unwrap();

        assert_eq!(journal.entries(), vec!["log:1"]);
    }

    #[tokio::test]
    async fn second_commit_does_not_republish() {
        let bus = EventBus::new();
        let journal = Journal::default();
        bus.subscribe::<TeamCreated, _>(Logger {
            label: "log",
            journal: journal.clone(),
        })
        .await;
        let (_db, units) = setup(bus);

        let mut uow = units.create();
        uow.enter().unwrap();
        let squad = Squad::found(1, 10);
        uow.repos().unwrap().save(&squad).await.unwrap();

        uow.commit().await.unwrap();
        assert_eq!(uow.state(), UnitState::Committed);
        uow.commit().await.unwrap();
        uow.exit(false).await.unwrap();

        assert_eq!(journal.entries(), vec!["log:1"]);
    }

    #[tokio::test]
    async fn storage_failure_publishes_nothing() {
        let bus = EventBus::new();
        let journal = Journal::default();
        bus.subscribe::<TeamCreated, _>(Logger {
            label: "log",
            journal: journal.clone(),
        })
        .await;
        let (db, units) = setup(bus);

        let mut uow = units.create();
        uow.enter().unwrap();
        let squad = Squad::found(1, 10);
        uow.repos().unwrap().save(&squad).await.unwrap();

        db.fail_next_commit();
        let err = uow.commit().await.unwrap_err();
        uow.exit(true).await.unwrap();

        assert!(matches!(err, DomainError::Storage(_)));
        assert!(journal.entries().is_empty());
        assert_eq!(db.row_count(SQUADS).await, 0);
        assert_eq!(squad.events().pending(), 1);
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn repos_require_an_entered_unit() {
        let (_db, units) = setup(EventBus::new());
        let mut uow = units.create();

        assert_eq!(uow.state(), UnitState::Unentered);
        assert!(matches!(uow.repos(), Err(DomainError::InvalidState(_))));
    }

    #[tokio::test]
    async fn entering_twice_fails() {
        let (_db, units) = setup(EventBus::new());
        let mut uow = units.create();

        uow.enter().unwrap();
        assert!(matches!(uow.enter(), Err(DomainError::InvalidState(_))));
        uow.exit(false).await.unwrap();
    }

    #[tokio::test]
    async fn exit_is_idempotent_and_final() {
        let (_db, units) = setup(EventBus::new());
        let mut uow = units.create();

        uow.enter().unwrap();
        uow.exit(false).await.unwrap();
        uow.exit(false).await.unwrap();

        assert_eq!(uow.state(), UnitState::Released);
        assert!(uow.repos().is_err());
        assert!(uow.commit().await.is_err());
        assert!(uow.enter().is_err());
    }

    #[tokio::test]
    async fn exit_without_commit_discards_writes() {
        let (db, units) = setup(EventBus::new());
        let mut uow = units.create();

        uow.enter().unwrap();
        uow.repos()
            .unwrap()
            .save(&Squad::found(1, 10))
            .await
            .unwrap();
        uow.exit(true).await.unwrap();

        assert_eq!(db.row_count(SQUADS).await, 0);
    }

    #[tokio::test]
    async fn run_rolls_back_when_work_fails() {
        let (db, units) = setup(EventBus::new());

        let result: std::result::Result<(), DomainError> = units
            .create()
            .run(|uow| {
                Box::pin(async move {
                    uow.repos()?.save(&Squad::found(1, 10)).await?;
                    Err::<(), _>(DomainError::InvalidState("squad 2 is full".to_string()))
                })
            })
            .await;

        assert!(matches!(result, Err(DomainError::InvalidState(_))));
        assert_eq!(db.row_count(SQUADS).await, 0);
    }

    #[tokio::test]
    async fn run_returns_work_value() {
        let (db, units) = setup(EventBus::new());

        let id = units
            .create()
            .run(|uow| {
                Box::pin(async move {
                    let squad = Squad::found(5, 10);
                    uow.repos()?.save(&squad).await?;
                    uow.commit().await?;
                    Ok::<_, DomainError>(squad.id())
                })
            })
            .await
            .unwrap();

        assert_eq!(id, 5);
        assert_eq!(db.row_count(SQUADS).await, 1);

        let loaded = units
            .create()
            .run(|uow| Box::pin(async move { uow.repos()?.get(5).await }))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.members, vec![10]);
        assert_eq!(loaded.events().pending(), 0);
    }

    #[tokio::test]
    async fn malformed_row_surfaces_as_serialization_error() {
        use storage::Session;

        let (db, units) = setup(EventBus::new());
        let mut session = db.session();
        session
            .upsert(SQUADS, RowKey::of(1), serde_json::json!({"id": 1, "members": "none"}))
            .await
            .unwrap();
        session.commit().await.unwrap();

        let result = units
            .create()
            .run(|uow| Box::pin(async move { uow.repos()?.get(1).await }))
            .await;

        assert!(matches!(result, Err(DomainError::Serialization(_))));
    }
}

mod cascade {
    use super::*;

    #[tokio::test]
    async fn handler_commits_cascade_depth_first() {
        let bus = EventBus::new();
        let journal = Journal::default();
        let (db, units) = setup(bus.clone());

        bus.subscribe::<TeamCreated, _>(Mirror {
            units: units.clone(),
            journal: journal.clone(),
        })
        .await;
        bus.subscribe::<TeamCreated, _>(Logger {
            label: "after",
            journal: journal.clone(),
        })
        .await;
        bus.subscribe::<MemberAddedToTeam, _>(Logger {
            label: "member",
            journal: journal.clone(),
        })
        .await;

        units
            .create()
            .run(|uow| {
                Box::pin(async move {
                    uow.repos()?.save(&Squad::found(1, 10)).await?;
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
            .unwrap();

        assert_eq!(
            journal.entries(),
            vec!["mirror:start", "member:3@2", "mirror:end", "after:1"]
        );
        assert_eq!(db.row_count(SQUADS).await, 2);
    }

    #[tokio::test]
    async fn runaway_cascade_is_cut_at_max_depth() {
        let bus = EventBus::with_max_depth(3);
        let (db, units) = setup(bus.clone());
        bus.subscribe::<UserRegistered, _>(Echo {
            units: units.clone(),
        })
        .await;

        let err = units
            .create()
            .run(|uow| {
                Box::pin(async move {
                    let mut squad = Squad {
                        id: 0,
                        members: Vec::new(),
                        events: EventRecorder::new(),
                    };
                    squad.record_event(UserRegistered::new(UserId::new(0), "seed"));
                    uow.repos()?.save(&squad).await?;
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.root_cause(),
            DomainError::CascadeDepthExceeded { limit: 3 }
        ));
        assert_eq!(err.handler_chain().len(), 3);
        // Every level committed its own storage before publishing
        assert_eq!(db.row_count(SQUADS).await, 4);
    }
}
