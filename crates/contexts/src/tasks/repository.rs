use common::{CommentId, TaskId, TeamId, UserId, UserRole};
use domain::{Entity, RepositoryProvider, Result, Scope};
use serde::{Deserialize, Serialize};
use storage::{RowKey, Table};

use super::{Comment, Task};
use crate::shared::{UserProjectionContext, UserProjections};

pub const USERS: Table = Table::new("tasks", "users");
pub const TEAMS: Table = Table::new("tasks", "teams");
pub const MEMBERS: Table = Table::new("tasks", "members");
pub const TASKS: Table = Table::new("tasks", "tasks");
pub const COMMENTS: Table = Table::new("tasks", "comments");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamProjection {
    pub id: TeamId,
}

/// One (team, user, role) triple. Admins are never projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProjection {
    pub team_id: TeamId,
    pub user_id: UserId,
    pub role: UserRole,
}

impl MemberProjection {
    fn key(&self) -> RowKey {
        RowKey::triple(self.team_id, self.user_id, self.role)
    }
}

pub struct TasksRepositories;

impl RepositoryProvider for TasksRepositories {
    const CONTEXT: &'static str = "tasks";

    type Repos<'s> = TasksRepos<'s>;

    fn bind(scope: &mut Scope) -> TasksRepos<'_> {
        TasksRepos { scope }
    }
}

impl UserProjectionContext for TasksRepositories {
    const USERS: Table = USERS;
}

pub struct TasksRepos<'s> {
    scope: &'s mut Scope,
}

impl TasksRepos<'_> {
    pub fn users(&mut self) -> UserProjections<'_> {
        UserProjections::new(&mut *self.scope, USERS)
    }

    pub fn teams(&mut self) -> TeamProjectionRepository<'_> {
        TeamProjectionRepository {
            scope: &mut *self.scope,
        }
    }

    pub fn members(&mut self) -> MemberRepository<'_> {
        MemberRepository {
            scope: &mut *self.scope,
        }
    }

    pub fn tasks(&mut self) -> TaskRepository<'_> {
        TaskRepository {
            scope: &mut *self.scope,
        }
    }

    pub fn comments(&mut self) -> CommentRepository<'_> {
        CommentRepository {
            scope: &mut *self.scope,
        }
    }
}

pub struct TeamProjectionRepository<'s> {
    scope: &'s mut Scope,
}

impl TeamProjectionRepository<'_> {
    pub async fn get(&self, id: TeamId) -> Result<Option<TeamProjection>> {
        self.scope.fetch(TEAMS, &RowKey::of(id)).await
    }

    pub async fn save(&mut self, team: &TeamProjection) -> Result<()> {
        self.scope.upsert(TEAMS, RowKey::of(team.id), team).await
    }
}

pub struct MemberRepository<'s> {
    scope: &'s mut Scope,
}

impl MemberRepository<'_> {
    /// Every role the user holds in the team.
    pub async fn roles(&self, team_id: TeamId, user_id: UserId) -> Result<Vec<UserRole>> {
        let prefix = RowKey::prefix(RowKey::pair(team_id, user_id));
        let members: Vec<MemberProjection> = self.scope.fetch_all(MEMBERS, Some(&prefix)).await?;
        Ok(members.into_iter().map(|m| m.role).collect())
    }

    pub async fn is_member(&self, team_id: TeamId, user_id: UserId) -> Result<bool> {
        Ok(!self.roles(team_id, user_id).await?.is_empty())
    }

    pub async fn has_role(&self, team_id: TeamId, user_id: UserId, role: UserRole) -> Result<bool> {
        let row: Option<MemberProjection> = self
            .scope
            .fetch(MEMBERS, &RowKey::triple(team_id, user_id, role))
            .await?;
        Ok(row.is_some())
    }

    pub async fn of_team(&self, team_id: TeamId) -> Result<Vec<MemberProjection>> {
        self.scope
            .fetch_all(MEMBERS, Some(&RowKey::prefix(team_id)))
            .await
    }

    pub async fn save(&mut self, member: &MemberProjection) -> Result<()> {
        self.scope.upsert(MEMBERS, member.key(), member).await
    }

    pub async fn remove(&mut self, member: &MemberProjection) -> Result<bool> {
        self.scope.remove(MEMBERS, &member.key()).await
    }
}

pub struct TaskRepository<'s> {
    scope: &'s mut Scope,
}

impl TaskRepository<'_> {
    pub async fn next_id(&mut self) -> Result<TaskId> {
        Ok(TaskId::new(self.scope.next_id(TASKS).await?))
    }

    pub async fn get(&self, id: TaskId) -> Result<Option<Task>> {
        self.scope.fetch(TASKS, &RowKey::of(id)).await
    }

    /// Every stored task, deleted ones included, ordered by id.
    pub async fn all(&self) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self.scope.fetch_all(TASKS, None).await?;
        tasks.sort_by_key(|task| task.id());
        Ok(tasks)
    }

    pub async fn save(&mut self, task: &Task) -> Result<()> {
        self.scope.save(TASKS, RowKey::of(task.id()), task).await
    }
}

/// Comments keyed by `(task, comment)`.
pub struct CommentRepository<'s> {
    scope: &'s mut Scope,
}

impl CommentRepository<'_> {
    pub async fn next_id(&mut self) -> Result<CommentId> {
        Ok(CommentId::new(self.scope.next_id(COMMENTS).await?))
    }

    /// Comments on the task, oldest first.
    pub async fn for_task(&self, task_id: TaskId) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .scope
            .fetch_all(COMMENTS, Some(&RowKey::prefix(task_id)))
            .await?;
        comments.sort_by_key(|comment| (comment.created_at, comment.id));
        Ok(comments)
    }

    pub async fn save(&mut self, comment: &Comment) -> Result<()> {
        self.scope
            .upsert(COMMENTS, RowKey::pair(comment.task_id, comment.id), comment)
            .await
    }
}
