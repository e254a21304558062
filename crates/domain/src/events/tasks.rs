use chrono::{DateTime, Utc};
use common::{TaskId, TaskStatus, TeamId, UserId};
use serde::{Deserialize, Serialize};

/// Data for TaskCreated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCreated {
    pub task_id: TaskId,
    pub team_id: TeamId,
    pub supervisor_id: UserId,
    pub executor_id: Option<UserId>,
    pub status: TaskStatus,
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub deleted: bool,
}

/// Data for TaskUpdated event.
///
/// Carries the full task state after the change, plus the executor it had
/// before so consumers can release the previous assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdated {
    pub task_id: TaskId,
    pub team_id: TeamId,
    pub supervisor_id: UserId,
    pub executor_id: Option<UserId>,
    pub previous_executor_id: Option<UserId>,
    pub status: TaskStatus,
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub deleted: bool,
}

impl TaskUpdated {
    /// Whether the executor changed away from a previous one.
    pub fn executor_replaced(&self) -> bool {
        self.previous_executor_id.is_some() && self.previous_executor_id != self.executor_id
    }
}
