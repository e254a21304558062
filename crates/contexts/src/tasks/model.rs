use chrono::{DateTime, Utc};
use common::{CommentId, TaskId, TaskStatus, TeamId, UserId};
use domain::events::{TaskCreated, TaskUpdated};
use domain::{AggregateRoot, Entity, EventRecorder, entity_identity};
use serde::{Deserialize, Serialize};

use super::TaskError;

/// Partial update of a task. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    pub deleted: Option<bool>,
}

/// A note left on a task by a team member. Comments do not emit events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub task_id: TaskId,
    pub team_id: TeamId,
    pub author_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for Comment {
    type Id = CommentId;

    fn id(&self) -> CommentId {
        self.id
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    team_id: TeamId,
    supervisor_id: UserId,
    executor_id: Option<UserId>,
    status: TaskStatus,
    title: String,
    description: String,
    deadline: DateTime<Utc>,
    deleted: bool,
    #[serde(skip)]
    events: EventRecorder,
}

impl Entity for Task {
    type Id = TaskId;

    fn id(&self) -> TaskId {
        self.id
    }
}

entity_identity!(Task);

impl AggregateRoot for Task {
    fn events(&self) -> &EventRecorder {
        &self.events
    }
}

impl Task {
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        id: TaskId,
        team_id: TeamId,
        supervisor_id: UserId,
        executor_id: Option<UserId>,
        title: impl Into<String>,
        description: impl Into<String>,
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Self, TaskError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        if deadline <= now {
            return Err(TaskError::DeadlineInPast);
        }

        let mut task = Self {
            id,
            team_id,
            supervisor_id,
            executor_id,
            status: TaskStatus::Open,
            title,
            description: description.into(),
            deadline,
            deleted: false,
            events: EventRecorder::new(),
        };
        task.record_event(TaskCreated {
            task_id: task.id,
            team_id: task.team_id,
            supervisor_id: task.supervisor_id,
            executor_id: task.executor_id,
            status: task.status,
            title: task.title.clone(),
            description: task.description.clone(),
            deadline: task.deadline,
            deleted: task.deleted,
        });
        Ok(task)
    }

    pub fn team_id(&self) -> TeamId {
        self.team_id
    }

    pub fn supervisor_id(&self) -> UserId {
        self.supervisor_id
    }

    pub fn executor_id(&self) -> Option<UserId> {
        self.executor_id
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn ensure_mutable(&self) -> Result<(), TaskError> {
        if self.deleted {
            return Err(TaskError::TaskDeleted(self.id));
        }
        Ok(())
    }

    fn record_update(&mut self, previous_executor_id: Option<UserId>) {
        let event = TaskUpdated {
            task_id: self.id,
            team_id: self.team_id,
            supervisor_id: self.supervisor_id,
            executor_id: self.executor_id,
            previous_executor_id,
            status: self.status,
            title: self.title.clone(),
            description: self.description.clone(),
            deadline: self.deadline,
            deleted: self.deleted,
        };
        self.record_event(event);
    }

    /// Hands the task to a new executor. Reassigning the current executor
    /// records nothing.
    pub fn assign_executor(&mut self, executor_id: UserId) -> Result<(), TaskError> {
        self.ensure_mutable()?;
        if self.executor_id == Some(executor_id) {
            return Ok(());
        }

        let previous = self.executor_id.replace(executor_id);
        self.record_update(previous);
        Ok(())
    }

    /// Applies a patch. Setting `deleted` soft-deletes the task for good.
    pub fn update(&mut self, patch: TaskPatch, now: DateTime<Utc>) -> Result<(), TaskError> {
        self.ensure_mutable()?;

        if let Some(title) = &patch.title
            && title.trim().is_empty()
        {
            return Err(TaskError::EmptyTitle);
        }
        if let Some(deadline) = patch.deadline
            && deadline != self.deadline
            && deadline <= now
        {
            return Err(TaskError::DeadlineInPast);
        }

        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(deleted) = patch.deleted {
            self.deleted = deleted;
        }

        self.record_update(self.executor_id);
        Ok(())
    }

    /// Writes a comment on this task. The author's membership is checked
    /// by the caller.
    pub fn comment(
        &self,
        id: CommentId,
        author_id: UserId,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Comment, TaskError> {
        self.ensure_mutable()?;
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TaskError::EmptyComment);
        }
        Ok(Comment {
            id,
            task_id: self.id,
            team_id: self.team_id,
            author_id,
            text,
            created_at: now,
        })
    }
}
