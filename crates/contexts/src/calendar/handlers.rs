//! Calendar entries derived from task and meeting events.

use async_trait::async_trait;
use common::UserId;
use domain::events::{MeetingCancelled, MeetingCreated, MeetingUpdated, TaskCreated, TaskUpdated};
use domain::{DomainError, EventHandler, Result, UnitOfWorkFactory};

use super::model::{EntryDraft, meeting_title, task_title};
use super::{CalendarRepos, CalendarRepositories, EntryKind};

/// Inserts or refreshes a user's entry, keeping its id stable.
async fn place(repos: &mut CalendarRepos<'_>, user_id: UserId, draft: &EntryDraft) -> Result<()> {
    repos.users().ensure(user_id).await?;

    let mut entries = repos.entries();
    let id = match entries.get(user_id, draft.kind, draft.reference_id).await? {
        Some(existing) => existing.id,
        None => entries.next_id().await?,
    };
    entries.save(&draft.clone().into_entry(id, user_id)).await
}

async fn cancel(
    repos: &mut CalendarRepos<'_>,
    user_id: UserId,
    kind: EntryKind,
    reference_id: i64,
) -> Result<()> {
    let mut entries = repos.entries();
    if let Some(mut entry) = entries.get(user_id, kind, reference_id).await?
        && !entry.cancelled
    {
        entry.cancelled = true;
        entries.save(&entry).await?;
    }
    Ok(())
}

async fn cancel_all(repos: &mut CalendarRepos<'_>, kind: EntryKind, reference_id: i64) -> Result<()> {
    let mut entries = repos.entries();
    for mut entry in entries.for_reference(kind, reference_id).await? {
        if !entry.cancelled {
            entry.cancelled = true;
            entries.save(&entry).await?;
        }
    }
    Ok(())
}

/// Supervisor first, then the executor if it is someone else.
fn task_targets(supervisor_id: UserId, executor_id: Option<UserId>) -> Vec<UserId> {
    let mut targets = vec![supervisor_id];
    targets.extend(executor_id.filter(|id| *id != supervisor_id));
    targets
}

pub struct TaskCreatedHandler {
    units: UnitOfWorkFactory<CalendarRepositories>,
}

impl TaskCreatedHandler {
    pub fn new(units: UnitOfWorkFactory<CalendarRepositories>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl EventHandler<TaskCreated> for TaskCreatedHandler {
    #[tracing::instrument(skip(self, event), fields(task_id = %event.task_id))]
    async fn handle(&self, event: &TaskCreated) -> Result<()> {
        let reference_id = event.task_id.as_i64();
        let draft = EntryDraft {
            kind: EntryKind::Task,
            reference_id,
            title: task_title(reference_id, &event.title),
            description: event.description.clone(),
            time: event.deadline,
            cancelled: event.deleted,
        };
        let targets = task_targets(event.supervisor_id, event.executor_id);

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    for user_id in targets {
                        place(&mut repos, user_id, &draft).await?;
                    }
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}

/// Refreshes task entries. A replaced executor loses theirs and a
/// deleted task is cancelled for everyone.
pub struct TaskUpdatedHandler {
    units: UnitOfWorkFactory<CalendarRepositories>,
}

impl TaskUpdatedHandler {
    pub fn new(units: UnitOfWorkFactory<CalendarRepositories>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl EventHandler<TaskUpdated> for TaskUpdatedHandler {
    #[tracing::instrument(skip(self, event), fields(task_id = %event.task_id))]
    async fn handle(&self, event: &TaskUpdated) -> Result<()> {
        let reference_id = event.task_id.as_i64();
        let deleted = event.deleted;
        let replaced = event
            .previous_executor_id
            .filter(|_| event.executor_replaced())
            .filter(|id| *id != event.supervisor_id);
        let draft = EntryDraft {
            kind: EntryKind::Task,
            reference_id,
            title: task_title(reference_id, &event.title),
            description: event.description.clone(),
            time: event.deadline,
            cancelled: false,
        };
        let targets = task_targets(event.supervisor_id, event.executor_id);

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    if deleted {
                        cancel_all(&mut repos, EntryKind::Task, reference_id).await?;
                    } else {
                        for user_id in targets {
                            place(&mut repos, user_id, &draft).await?;
                        }
                        if let Some(previous) = replaced {
                            cancel(&mut repos, previous, EntryKind::Task, reference_id).await?;
                        }
                    }
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}

fn meeting_draft(
    meeting_id: i64,
    description: &str,
    start: chrono::DateTime<chrono::Utc>,
    cancelled: bool,
) -> EntryDraft {
    EntryDraft {
        kind: EntryKind::Meeting,
        reference_id: meeting_id,
        title: meeting_title(meeting_id),
        description: description.to_string(),
        time: start,
        cancelled,
    }
}

pub struct MeetingCreatedHandler {
    units: UnitOfWorkFactory<CalendarRepositories>,
}

impl MeetingCreatedHandler {
    pub fn new(units: UnitOfWorkFactory<CalendarRepositories>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl EventHandler<MeetingCreated> for MeetingCreatedHandler {
    #[tracing::instrument(skip(self, event), fields(meeting_id = %event.meeting_id))]
    async fn handle(&self, event: &MeetingCreated) -> Result<()> {
        let draft = meeting_draft(
            event.meeting_id.as_i64(),
            &event.description,
            event.start,
            event.is_cancelled,
        );
        let participants = event.participant_ids.clone();

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    for user_id in participants {
                        place(&mut repos, user_id, &draft).await?;
                    }
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}

pub struct MeetingUpdatedHandler {
    units: UnitOfWorkFactory<CalendarRepositories>,
}

impl MeetingUpdatedHandler {
    pub fn new(units: UnitOfWorkFactory<CalendarRepositories>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl EventHandler<MeetingUpdated> for MeetingUpdatedHandler {
    #[tracing::instrument(skip(self, event), fields(meeting_id = %event.meeting_id))]
    async fn handle(&self, event: &MeetingUpdated) -> Result<()> {
        let reference_id = event.meeting_id.as_i64();
        let draft = meeting_draft(
            reference_id,
            &event.description,
            event.start,
            event.is_cancelled,
        );
        let participants = event.participant_ids.clone();
        let removed: Vec<UserId> = event.removed_participants().collect();

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    for user_id in participants {
                        place(&mut repos, user_id, &draft).await?;
                    }
                    for user_id in removed {
                        cancel(&mut repos, user_id, EntryKind::Meeting, reference_id).await?;
                    }
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}

pub struct MeetingCancelledHandler {
    units: UnitOfWorkFactory<CalendarRepositories>,
}

impl MeetingCancelledHandler {
    pub fn new(units: UnitOfWorkFactory<CalendarRepositories>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl EventHandler<MeetingCancelled> for MeetingCancelledHandler {
    #[tracing::instrument(skip(self, event), fields(meeting_id = %event.meeting_id))]
    async fn handle(&self, event: &MeetingCancelled) -> Result<()> {
        let reference_id = event.meeting_id.as_i64();

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    cancel_all(&mut uow.repos()?, EntryKind::Meeting, reference_id).await?;
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}
