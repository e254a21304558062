use chrono::Utc;
use common::{EvaluationId, Grade, TaskId, TaskStatus, TeamId, UserId};
use domain::UnitOfWorkFactory;

use super::{Evaluation, EvaluationError, EvaluationsRepositories, Period, average};

#[derive(Debug, Clone, Copy)]
pub struct CreateEvaluation {
    pub task_id: TaskId,
    pub grade: Grade,
}

#[derive(Clone)]
pub struct EvaluationService {
    units: UnitOfWorkFactory<EvaluationsRepositories>,
}

impl EvaluationService {
    pub fn new(units: UnitOfWorkFactory<EvaluationsRepositories>) -> Self {
        Self { units }
    }

    /// Grades the executor of a finished task. Only the task's supervisor
    /// may do this, once.
    #[tracing::instrument(skip(self), fields(task_id = %cmd.task_id, grade = %cmd.grade))]
    pub async fn create_evaluation(
        &self,
        actor: UserId,
        cmd: CreateEvaluation,
    ) -> Result<EvaluationId, EvaluationError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let task = repos
                        .tasks()
                        .get(cmd.task_id)
                        .await?
                        .filter(|task| !task.deleted)
                        .ok_or(EvaluationError::TaskNotFound(cmd.task_id))?;

                    if task.supervisor_id != actor {
                        return Err(EvaluationError::NotSupervisor {
                            task_id: task.id,
                            user_id: actor,
                        });
                    }
                    if task.status != TaskStatus::Done {
                        return Err(EvaluationError::TaskNotDone(task.id));
                    }
                    let executor_id = task.executor_id.ok_or(EvaluationError::NoExecutor(task.id))?;

                    let mut evaluations = repos.evaluations();
                    if evaluations.for_task(task.id).await?.is_some() {
                        return Err(EvaluationError::AlreadyEvaluated(task.id));
                    }

                    let evaluation = Evaluation {
                        id: evaluations.next_id().await?,
                        task_id: task.id,
                        team_id: task.team_id,
                        evaluator_id: actor,
                        executor_id,
                        grade: cmd.grade,
                        created_at: Utc::now(),
                    };
                    evaluations.save(&evaluation).await?;
                    uow.commit().await?;
                    Ok::<_, EvaluationError>(evaluation.id)
                })
            })
            .await
    }

    pub async fn get_evaluation(&self, task_id: TaskId) -> Result<Evaluation, EvaluationError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let evaluation = uow
                        .repos()?
                        .evaluations()
                        .for_task(task_id)
                        .await?
                        .ok_or(EvaluationError::EvaluationNotFound(task_id))?;
                    Ok::<_, EvaluationError>(evaluation)
                })
            })
            .await
    }

    /// Evaluations received by a user, oldest first, optionally within one
    /// team and one period.
    pub async fn evaluations_for_user(
        &self,
        user_id: UserId,
        team_id: Option<TeamId>,
        period: Option<Period>,
    ) -> Result<Vec<Evaluation>, EvaluationError> {
        let mut evaluations = self
            .units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let all = uow.repos()?.evaluations().all().await?;
                    Ok::<_, EvaluationError>(all)
                })
            })
            .await?;

        evaluations.retain(|e| {
            e.executor_id == user_id
                && team_id.is_none_or(|team_id| e.team_id == team_id)
                && period.is_none_or(|period| period.contains(e.created_at))
        });
        evaluations.sort_by_key(|e| (e.created_at, e.id));
        Ok(evaluations)
    }

    /// Average grade received by a user, optionally within one team and
    /// one period. `None` when nothing matches.
    pub async fn average_grade(
        &self,
        user_id: UserId,
        team_id: Option<TeamId>,
        period: Option<Period>,
    ) -> Result<Option<f64>, EvaluationError> {
        let evaluations = self.evaluations_for_user(user_id, team_id, period).await?;
        Ok(average(&evaluations))
    }
}
