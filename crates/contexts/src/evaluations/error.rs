use common::{TaskId, UserId};
use domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Task {0} is not done")]
    TaskNotDone(TaskId),

    #[error("Task {0} has no executor to evaluate")]
    NoExecutor(TaskId),

    #[error("User {user_id} does not supervise task {task_id}")]
    NotSupervisor { task_id: TaskId, user_id: UserId },

    #[error("Task {0} is already evaluated")]
    AlreadyEvaluated(TaskId),

    #[error("Evaluation not found for task {0}")]
    EvaluationNotFound(TaskId),
}
