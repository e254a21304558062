use chrono::{DateTime, Utc};
use common::{EvaluationId, Grade, TaskId, TeamId, UserId};
use domain::{Entity, entity_identity};
use serde::{Deserialize, Serialize};

/// Grade given by a supervisor to the executor of a finished task.
/// A task is evaluated at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub task_id: TaskId,
    pub team_id: TeamId,
    pub evaluator_id: UserId,
    pub executor_id: UserId,
    pub grade: Grade,
    pub created_at: DateTime<Utc>,
}

impl Entity for Evaluation {
    type Id = EvaluationId;

    fn id(&self) -> EvaluationId {
        self.id
    }
}

entity_identity!(Evaluation);

/// Half-open time range `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Period {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at < self.to
    }
}

/// Mean grade of the evaluations, `None` when there are none.
pub fn average<'a>(evaluations: impl IntoIterator<Item = &'a Evaluation>) -> Option<f64> {
    let (sum, count) = evaluations
        .into_iter()
        .fold((0u32, 0u32), |(sum, count), e| {
            (sum + u32::from(e.grade.value()), count + 1)
        });
    (count > 0).then(|| f64::from(sum) / f64::from(count))
}
