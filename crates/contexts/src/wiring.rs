//! Composition root: one unit-of-work factory per context and the static
//! subscription table of the event bus.

use std::sync::Arc;

use domain::events::{
    MeetingCancelled, MeetingCreated, MeetingUpdated, MemberAddedToTeam, MemberRemovedFromTeam,
    MemberRoleChanged, TaskCreated, TaskUpdated, TeamCreated, UserDeleted, UserRegistered,
    UserUpdated,
};
use domain::{DomainError, EventBus, EventKind, UnitOfWorkFactory};
use storage::SessionFactory;

use crate::calendar::{self, CalendarRepositories, CalendarService};
use crate::evaluations::{self, EvaluationService, EvaluationsRepositories};
use crate::identity::{IdentityRepositories, IdentityService};
use crate::scheduling::{self, SchedulingRepositories, SchedulingService};
use crate::shared::{
    UserDeletedHandler, UserProjectionContext, UserRegisteredHandler, UserUpdatedHandler,
};
use crate::tasks::{self, TaskService, TasksRepositories};
use crate::teams::{TeamService, TeamsRepositories};

/// Unit-of-work factories of every context, sharing one bus and one
/// session factory.
#[derive(Clone)]
pub struct Contexts {
    pub identity: UnitOfWorkFactory<IdentityRepositories>,
    pub teams: UnitOfWorkFactory<TeamsRepositories>,
    pub tasks: UnitOfWorkFactory<TasksRepositories>,
    pub evaluations: UnitOfWorkFactory<EvaluationsRepositories>,
    pub scheduling: UnitOfWorkFactory<SchedulingRepositories>,
    pub calendar: UnitOfWorkFactory<CalendarRepositories>,
}

impl Contexts {
    pub fn new(sessions: Arc<dyn SessionFactory>, bus: &EventBus) -> Self {
        Self {
            identity: UnitOfWorkFactory::new(Arc::clone(&sessions), bus.clone()),
            teams: UnitOfWorkFactory::new(Arc::clone(&sessions), bus.clone()),
            tasks: UnitOfWorkFactory::new(Arc::clone(&sessions), bus.clone()),
            evaluations: UnitOfWorkFactory::new(Arc::clone(&sessions), bus.clone()),
            scheduling: UnitOfWorkFactory::new(Arc::clone(&sessions), bus.clone()),
            calendar: UnitOfWorkFactory::new(sessions, bus.clone()),
        }
    }
}

async fn subscribe_user_projection<P: UserProjectionContext>(
    bus: &EventBus,
    units: &UnitOfWorkFactory<P>,
) {
    bus.subscribe::<UserRegistered, _>(UserRegisteredHandler::new(units.clone()))
        .await;
    bus.subscribe::<UserUpdated, _>(UserUpdatedHandler::new(units.clone()))
        .await;
    bus.subscribe::<UserDeleted, _>(UserDeletedHandler::new(units.clone()))
        .await;
}

/// Subscribes every cross-context handler, each bound to the factory of
/// the context it writes to.
///
/// Dispatch order per event type follows the order below. Fails with
/// [`DomainError::MissingSubscribers`] if any event type ends up with no
/// handler.
pub async fn register_event_handlers(
    bus: &EventBus,
    contexts: &Contexts,
) -> Result<(), DomainError> {
    subscribe_user_projection(bus, &contexts.teams).await;
    subscribe_user_projection(bus, &contexts.tasks).await;
    subscribe_user_projection(bus, &contexts.evaluations).await;
    subscribe_user_projection(bus, &contexts.scheduling).await;
    subscribe_user_projection(bus, &contexts.calendar).await;

    bus.subscribe::<TeamCreated, _>(tasks::TeamCreatedHandler::new(contexts.tasks.clone()))
        .await;
    bus.subscribe::<TeamCreated, _>(scheduling::TeamCreatedHandler::new(
        contexts.scheduling.clone(),
    ))
    .await;
    bus.subscribe::<MemberAddedToTeam, _>(tasks::MemberAddedHandler::new(contexts.tasks.clone()))
        .await;
    bus.subscribe::<MemberAddedToTeam, _>(scheduling::MemberAddedHandler::new(
        contexts.scheduling.clone(),
    ))
    .await;
    bus.subscribe::<MemberRemovedFromTeam, _>(tasks::MemberRemovedHandler::new(
        contexts.tasks.clone(),
    ))
    .await;
    bus.subscribe::<MemberRemovedFromTeam, _>(scheduling::MemberRemovedHandler::new(
        contexts.scheduling.clone(),
    ))
    .await;
    bus.subscribe::<MemberRoleChanged, _>(tasks::MemberRoleChangedHandler::new(
        contexts.tasks.clone(),
    ))
    .await;
    bus.subscribe::<MemberRoleChanged, _>(scheduling::MemberRoleChangedHandler::new(
        contexts.scheduling.clone(),
    ))
    .await;

    bus.subscribe::<TaskCreated, _>(evaluations::TaskCreatedHandler::new(
        contexts.evaluations.clone(),
    ))
    .await;
    bus.subscribe::<TaskCreated, _>(calendar::TaskCreatedHandler::new(contexts.calendar.clone()))
        .await;
    bus.subscribe::<TaskUpdated, _>(evaluations::TaskUpdatedHandler::new(
        contexts.evaluations.clone(),
    ))
    .await;
    bus.subscribe::<TaskUpdated, _>(calendar::TaskUpdatedHandler::new(contexts.calendar.clone()))
        .await;

    bus.subscribe::<MeetingCreated, _>(calendar::MeetingCreatedHandler::new(
        contexts.calendar.clone(),
    ))
    .await;
    bus.subscribe::<MeetingUpdated, _>(calendar::MeetingUpdatedHandler::new(
        contexts.calendar.clone(),
    ))
    .await;
    bus.subscribe::<MeetingCancelled, _>(calendar::MeetingCancelledHandler::new(
        contexts.calendar.clone(),
    ))
    .await;

    let mut missing = Vec::new();
    for kind in EventKind::ALL {
        if bus.subscriber_count(*kind).await == 0 {
            missing.push(kind.as_str());
        }
    }
    if !missing.is_empty() {
        return Err(DomainError::MissingSubscribers(missing));
    }

    tracing::info!(event_types = EventKind::ALL.len(), "event handlers registered");
    Ok(())
}

/// Every use-case service, wired to one bus with all handlers subscribed.
#[derive(Clone)]
pub struct Services {
    pub bus: EventBus,
    pub identity: IdentityService,
    pub teams: TeamService,
    pub tasks: TaskService,
    pub evaluations: EvaluationService,
    pub scheduling: SchedulingService,
    pub calendar: CalendarService,
}

impl Services {
    pub async fn bootstrap(
        sessions: Arc<dyn SessionFactory>,
        bus: EventBus,
    ) -> Result<Self, DomainError> {
        let contexts = Contexts::new(sessions, &bus);
        register_event_handlers(&bus, &contexts).await?;

        Ok(Self {
            identity: IdentityService::new(contexts.identity),
            teams: TeamService::new(contexts.teams),
            tasks: TaskService::new(contexts.tasks),
            evaluations: EvaluationService::new(contexts.evaluations),
            scheduling: SchedulingService::new(contexts.scheduling),
            calendar: CalendarService::new(contexts.calendar),
            bus,
        })
    }
}
