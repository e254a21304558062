//! Task evaluation and grade statistics endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{Grade, TaskId, TeamId, UserId};
use contexts::evaluations::{CreateEvaluation, Evaluation, Period};
use serde::{Deserialize, Serialize};

use super::{Actor, AppState, CreatedResponse};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct EvaluateRequest {
    pub grade: Grade,
}

#[derive(Deserialize)]
pub struct AverageQuery {
    pub team_id: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl AverageQuery {
    fn period(&self) -> Result<Option<Period>, ApiError> {
        match (self.from, self.to) {
            (None, None) => Ok(None),
            (Some(from), Some(to)) if from < to => Ok(Some(Period { from, to })),
            (Some(_), Some(_)) => Err(ApiError::BadRequest(
                "`from` must be before `to`".to_string(),
            )),
            _ => Err(ApiError::BadRequest(
                "`from` and `to` must be given together".to_string(),
            )),
        }
    }
}

#[derive(Serialize)]
pub struct EvaluationList {
    pub items: Vec<Evaluation>,
    pub total: usize,
}

#[derive(Serialize)]
pub struct AverageResponse {
    pub user_id: i64,
    pub average: Option<f64>,
}

/// POST /tasks/{id}/evaluation
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(task_id): Path<i64>,
    Json(req): Json<EvaluateRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let evaluation_id = state
        .services
        .evaluations
        .create_evaluation(
            actor,
            CreateEvaluation {
                task_id: TaskId::new(task_id),
                grade: req.grade,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: evaluation_id.as_i64(),
        }),
    ))
}

/// GET /tasks/{id}/evaluation
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<i64>,
) -> Result<Json<Evaluation>, ApiError> {
    let evaluation = state
        .services
        .evaluations
        .get_evaluation(TaskId::new(task_id))
        .await?;
    Ok(Json(evaluation))
}

/// GET /users/{id}/average-grade?team_id=&from=&to=
#[tracing::instrument(skip(state, query))]
pub async fn average(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<AverageQuery>,
) -> Result<Json<AverageResponse>, ApiError> {
    let period = query.period()?;
    let average = state
        .services
        .evaluations
        .average_grade(UserId::new(user_id), query.team_id.map(TeamId::new), period)
        .await?;

    Ok(Json(AverageResponse { user_id, average }))
}

/// GET /evaluations/me?team_id=&from=&to=
#[tracing::instrument(skip(state, query))]
pub async fn mine(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Query(query): Query<AverageQuery>,
) -> Result<Json<EvaluationList>, ApiError> {
    let period = query.period()?;
    let items = state
        .services
        .evaluations
        .evaluations_for_user(actor, query.team_id.map(TeamId::new), period)
        .await?;

    Ok(Json(EvaluationList {
        total: items.len(),
        items,
    }))
}
