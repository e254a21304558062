use common::{TaskId, TeamId, UserId};
use domain::DomainError;
use thiserror::Error;

/// Errors raised by the tasks context.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Team not found: {0}")]
    TeamNotFound(TeamId),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("User {user_id} is not a manager of team {team_id}")]
    NotManager { team_id: TeamId, user_id: UserId },

    #[error("User {user_id} is not a member of team {team_id}")]
    NotTeamMember { team_id: TeamId, user_id: UserId },

    #[error("Only the supervisor of task {0} may change it")]
    NotSupervisor(TaskId),

    #[error("Task title must not be empty")]
    EmptyTitle,

    #[error("Task deadline must be in the future")]
    DeadlineInPast,

    #[error("Task {0} is deleted")]
    TaskDeleted(TaskId),

    #[error("Comment text must not be empty")]
    EmptyComment,

    #[error("User {user_id} has no access to task {task_id}")]
    NoTaskAccess { task_id: TaskId, user_id: UserId },

    #[error("User {user_id} has no access to the tasks of team {team_id}")]
    NoTeamAccess { team_id: TeamId, user_id: UserId },
}
