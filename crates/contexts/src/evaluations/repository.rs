use common::{EvaluationId, TaskId, TaskStatus, TeamId, UserId};
use domain::{RepositoryProvider, Result, Scope};
use serde::{Deserialize, Serialize};
use storage::{RowKey, Table};

use super::Evaluation;
use crate::shared::{UserProjectionContext, UserProjections};

pub const USERS: Table = Table::new("evaluations", "users");
pub const TASKS: Table = Table::new("evaluations", "tasks");
pub const EVALUATIONS: Table = Table::new("evaluations", "evaluations");

/// What evaluations needs to know about a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProjection {
    pub id: TaskId,
    pub team_id: TeamId,
    pub supervisor_id: UserId,
    pub executor_id: Option<UserId>,
    pub status: TaskStatus,
    #[serde(default)]
    pub deleted: bool,
}

pub struct EvaluationsRepositories;

impl RepositoryProvider for EvaluationsRepositories {
    const CONTEXT: &'static str = "evaluations";

    type Repos<'s> = EvaluationsRepos<'s>;

    fn bind(scope: &mut Scope) -> EvaluationsRepos<'_> {
        EvaluationsRepos { scope }
    }
}

impl UserProjectionContext for EvaluationsRepositories {
    const USERS: Table = USERS;
}

pub struct EvaluationsRepos<'s> {
    scope: &'s mut Scope,
}

impl EvaluationsRepos<'_> {
    pub fn users(&mut self) -> UserProjections<'_> {
        UserProjections::new(&mut *self.scope, USERS)
    }

    pub fn tasks(&mut self) -> TaskProjectionRepository<'_> {
        TaskProjectionRepository {
            scope: &mut *self.scope,
        }
    }

    pub fn evaluations(&mut self) -> EvaluationRepository<'_> {
        EvaluationRepository {
            scope: &mut *self.scope,
        }
    }
}

pub struct TaskProjectionRepository<'s> {
    scope: &'s mut Scope,
}

impl TaskProjectionRepository<'_> {
    pub async fn get(&self, id: TaskId) -> Result<Option<TaskProjection>> {
        self.scope.fetch(TASKS, &RowKey::of(id)).await
    }

    pub async fn save(&mut self, task: &TaskProjection) -> Result<()> {
        self.scope.upsert(TASKS, RowKey::of(task.id), task).await
    }
}

/// Evaluations keyed by the task they grade.
pub struct EvaluationRepository<'s> {
    scope: &'s mut Scope,
}

impl EvaluationRepository<'_> {
    pub async fn next_id(&mut self) -> Result<EvaluationId> {
        Ok(EvaluationId::new(self.scope.next_id(EVALUATIONS).await?))
    }

    pub async fn for_task(&self, task_id: TaskId) -> Result<Option<Evaluation>> {
        self.scope.fetch(EVALUATIONS, &RowKey::of(task_id)).await
    }

    pub async fn all(&self) -> Result<Vec<Evaluation>> {
        self.scope.fetch_all(EVALUATIONS, None).await
    }

    pub async fn save(&mut self, evaluation: &Evaluation) -> Result<()> {
        self.scope
            .upsert(EVALUATIONS, RowKey::of(evaluation.task_id), evaluation)
            .await
    }
}
