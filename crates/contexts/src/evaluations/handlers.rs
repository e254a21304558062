use async_trait::async_trait;
use domain::events::{TaskCreated, TaskUpdated};
use domain::{DomainError, EventHandler, Result, UnitOfWorkFactory};

use super::{EvaluationsRepositories, TaskProjection};

async fn project(
    units: &UnitOfWorkFactory<EvaluationsRepositories>,
    task: TaskProjection,
) -> Result<()> {
    units
        .create()
        .run(move |uow| {
            Box::pin(async move {
                uow.repos()?.tasks().save(&task).await?;
                uow.commit().await?;
                Ok::<_, DomainError>(())
            })
        })
        .await
}

pub struct TaskCreatedHandler {
    units: UnitOfWorkFactory<EvaluationsRepositories>,
}

impl TaskCreatedHandler {
    pub fn new(units: UnitOfWorkFactory<EvaluationsRepositories>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl EventHandler<TaskCreated> for TaskCreatedHandler {
    #[tracing::instrument(skip(self, event), fields(task_id = %event.task_id))]
    async fn handle(&self, event: &TaskCreated) -> Result<()> {
        let task = TaskProjection {
            id: event.task_id,
            team_id: event.team_id,
            supervisor_id: event.supervisor_id,
            executor_id: event.executor_id,
            status: event.status,
            deleted: event.deleted,
        };
        project(&self.units, task).await
    }
}

/// Overwrites the projected task with its latest state.
pub struct TaskUpdatedHandler {
    units: UnitOfWorkFactory<EvaluationsRepositories>,
}

impl TaskUpdatedHandler {
    pub fn new(units: UnitOfWorkFactory<EvaluationsRepositories>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl EventHandler<TaskUpdated> for TaskUpdatedHandler {
    #[tracing::instrument(skip(self, event), fields(task_id = %event.task_id))]
    async fn handle(&self, event: &TaskUpdated) -> Result<()> {
        let task = TaskProjection {
            id: event.task_id,
            team_id: event.team_id,
            supervisor_id: event.supervisor_id,
            executor_id: event.executor_id,
            status: event.status,
            deleted: event.deleted,
        };
        project(&self.units, task).await
    }
}
