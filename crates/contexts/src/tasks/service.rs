use chrono::{DateTime, Utc};
use common::{Page, Paged, TaskId, TaskStatus, TeamId, UserId, UserRole};
use domain::{Entity, UnitOfWorkFactory};

use super::{Comment, Task, TaskError, TaskPatch, TaskRepository, TasksRepos, TasksRepositories};

#[derive(Debug, Clone)]
pub struct CreateTask {
    pub team_id: TeamId,
    pub executor_id: Option<UserId>,
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
}

/// Filter for [`TaskService::list_tasks`].
///
/// `assigned_only` wins over `team_id`. With neither set, the list holds the
/// tasks the actor supervises or executes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskQuery {
    pub team_id: Option<TeamId>,
    pub assigned_only: bool,
    pub page: Page,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub id: TaskId,
    pub team_id: TeamId,
    pub supervisor_id: UserId,
    pub executor_id: Option<UserId>,
    pub status: TaskStatus,
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub deleted: bool,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            team_id: task.team_id(),
            supervisor_id: task.supervisor_id(),
            executor_id: task.executor_id(),
            status: task.status(),
            title: task.title().to_string(),
            description: task.description().to_string(),
            deadline: task.deadline(),
            deleted: task.is_deleted(),
        }
    }
}

async fn ensure_member(
    repos: &mut TasksRepos<'_>,
    team_id: TeamId,
    user_id: UserId,
) -> Result<(), TaskError> {
    if repos.users().active(user_id).await?.is_none()
        || !repos.members().is_member(team_id, user_id).await?
    {
        return Err(TaskError::NotTeamMember { team_id, user_id });
    }
    Ok(())
}

/// Loads a task the actor supervises.
async fn supervised(
    tasks: &TaskRepository<'_>,
    task_id: TaskId,
    actor: UserId,
) -> Result<Task, TaskError> {
    let task = tasks
        .get(task_id)
        .await?
        .ok_or(TaskError::TaskNotFound(task_id))?;
    if task.supervisor_id() != actor {
        return Err(TaskError::NotSupervisor(task_id));
    }
    Ok(task)
}

/// Loads a task the actor may read: a team member, its supervisor or its
/// executor.
async fn readable(
    repos: &mut TasksRepos<'_>,
    task_id: TaskId,
    actor: UserId,
) -> Result<Task, TaskError> {
    let task = repos
        .tasks()
        .get(task_id)
        .await?
        .ok_or(TaskError::TaskNotFound(task_id))?;
    let involved = task.supervisor_id() == actor || task.executor_id() == Some(actor);
    if !involved && !repos.members().is_member(task.team_id(), actor).await? {
        return Err(TaskError::NoTaskAccess {
            task_id,
            user_id: actor,
        });
    }
    Ok(task)
}

#[derive(Clone)]
pub struct TaskService {
    units: UnitOfWorkFactory<TasksRepositories>,
}

impl TaskService {
    pub fn new(units: UnitOfWorkFactory<TasksRepositories>) -> Self {
        Self { units }
    }

    /// Creates a task supervised by `actor`, who must manage the team.
    #[tracing::instrument(skip(self, cmd), fields(team_id = %cmd.team_id))]
    pub async fn create_task(&self, actor: UserId, cmd: CreateTask) -> Result<TaskId, TaskError> {
        let task_id = self
            .units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    if repos.teams().get(cmd.team_id).await?.is_none() {
                        return Err(TaskError::TeamNotFound(cmd.team_id));
                    }
                    if !repos
                        .members()
                        .has_role(cmd.team_id, actor, UserRole::Manager)
                        .await?
                    {
                        return Err(TaskError::NotManager {
                            team_id: cmd.team_id,
                            user_id: actor,
                        });
                    }
                    if let Some(executor_id) = cmd.executor_id {
                        ensure_member(&mut repos, cmd.team_id, executor_id).await?;
                    }

                    let mut tasks = repos.tasks();
                    let task = Task::create(
                        tasks.next_id().await?,
                        cmd.team_id,
                        actor,
                        cmd.executor_id,
                        cmd.title,
                        cmd.description,
                        cmd.deadline,
                        Utc::now(),
                    )?;
                    tasks.save(&task).await?;
                    uow.commit().await?;
                    Ok::<_, TaskError>(task.id())
                })
            })
            .await?;

        tracing::info!(%task_id, "task created");
        Ok(task_id)
    }

    #[tracing::instrument(skip(self))]
    pub async fn assign_executor(
        &self,
        actor: UserId,
        task_id: TaskId,
        executor_id: UserId,
    ) -> Result<(), TaskError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let mut task = supervised(&repos.tasks(), task_id, actor).await?;
                    ensure_member(&mut repos, task.team_id(), executor_id).await?;

                    task.assign_executor(executor_id)?;
                    repos.tasks().save(&task).await?;
                    uow.commit().await?;
                    Ok::<_, TaskError>(())
                })
            })
            .await
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update_task(
        &self,
        actor: UserId,
        task_id: TaskId,
        patch: TaskPatch,
    ) -> Result<TaskView, TaskError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let mut tasks = repos.tasks();
                    let mut task = supervised(&tasks, task_id, actor).await?;
                    task.update(patch, Utc::now())?;
                    tasks.save(&task).await?;
                    uow.commit().await?;
                    Ok::<_, TaskError>(TaskView::from(&task))
                })
            })
            .await
    }

    pub async fn get_task(&self, actor: UserId, task_id: TaskId) -> Result<TaskView, TaskError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let task = readable(&mut uow.repos()?, task_id, actor).await?;
                    Ok::<_, TaskError>(TaskView::from(&task))
                })
            })
            .await
    }

    /// Live tasks visible to the actor, ordered by id.
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(
        &self,
        actor: UserId,
        query: TaskQuery,
    ) -> Result<Paged<TaskView>, TaskError> {
        let tasks = self
            .units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    if let (false, Some(team_id)) = (query.assigned_only, query.team_id) {
                        if !repos.members().is_member(team_id, actor).await? {
                            return Err(TaskError::NoTeamAccess {
                                team_id,
                                user_id: actor,
                            });
                        }
                    }
                    let tasks = repos.tasks().all().await?;
                    Ok::<_, TaskError>(tasks)
                })
            })
            .await?;

        let visible = tasks
            .iter()
            .filter(|task| !task.is_deleted())
            .filter(|task| {
                if query.assigned_only {
                    task.executor_id() == Some(actor)
                } else if let Some(team_id) = query.team_id {
                    task.team_id() == team_id
                } else {
                    task.supervisor_id() == actor || task.executor_id() == Some(actor)
                }
            })
            .map(TaskView::from)
            .collect();
        Ok(query.page.apply(visible))
    }

    /// Adds a comment. Only active members of the task's team may comment.
    #[tracing::instrument(skip(self, text))]
    pub async fn add_comment(
        &self,
        actor: UserId,
        task_id: TaskId,
        text: String,
    ) -> Result<Comment, TaskError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let task = repos
                        .tasks()
                        .get(task_id)
                        .await?
                        .ok_or(TaskError::TaskNotFound(task_id))?;
                    if !repos.members().is_member(task.team_id(), actor).await? {
                        return Err(TaskError::NoTaskAccess {
                            task_id,
                            user_id: actor,
                        });
                    }

                    let mut comments = repos.comments();
                    let comment = task.comment(comments.next_id().await?, actor, text, Utc::now())?;
                    comments.save(&comment).await?;
                    uow.commit().await?;
                    Ok::<_, TaskError>(comment)
                })
            })
            .await
    }

    /// Comments on a task the actor may read, oldest first.
    pub async fn list_comments(
        &self,
        actor: UserId,
        task_id: TaskId,
    ) -> Result<Vec<Comment>, TaskError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    readable(&mut repos, task_id, actor).await?;
                    let comments = repos.comments().for_task(task_id).await?;
                    Ok::<_, TaskError>(comments)
                })
            })
            .await
    }
}
