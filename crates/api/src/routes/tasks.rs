//! Task endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{Paged, TaskId, TaskStatus, TeamId, UserId};
use contexts::tasks::{Comment, CreateTask, TaskPatch, TaskQuery, TaskView};
use serde::{Deserialize, Serialize};

use super::{Actor, AppState, CreatedResponse};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub team_id: i64,
    pub executor_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub deadline: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct AssignRequest {
    pub executor_id: i64,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub team_id: Option<i64>,
    #[serde(default)]
    pub assigned_only: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct TaskResponse {
    pub id: i64,
    pub team_id: i64,
    pub supervisor_id: i64,
    pub executor_id: Option<i64>,
    pub status: TaskStatus,
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub deleted: bool,
}

impl From<TaskView> for TaskResponse {
    fn from(task: TaskView) -> Self {
        Self {
            id: task.id.as_i64(),
            team_id: task.team_id.as_i64(),
            supervisor_id: task.supervisor_id.as_i64(),
            executor_id: task.executor_id.map(|id| id.as_i64()),
            status: task.status,
            title: task.title,
            description: task.description,
            deadline: task.deadline,
            deleted: task.deleted,
        }
    }
}

/// POST /tasks
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let task_id = state
        .services
        .tasks
        .create_task(
            actor,
            CreateTask {
                team_id: TeamId::new(req.team_id),
                executor_id: req.executor_id.map(UserId::new),
                title: req.title,
                description: req.description,
                deadline: req.deadline,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: task_id.as_i64(),
        }),
    ))
}

/// GET /tasks?team_id=&assigned_only=&limit=&offset=
#[tracing::instrument(skip(state, query))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paged<TaskResponse>>, ApiError> {
    let tasks = state
        .services
        .tasks
        .list_tasks(
            actor,
            TaskQuery {
                team_id: query.team_id.map(TeamId::new),
                assigned_only: query.assigned_only,
                page: super::page(query.limit, query.offset)?,
            },
        )
        .await?;
    Ok(Json(tasks.map(TaskResponse::from)))
}

/// GET /tasks/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state.services.tasks.get_task(actor, TaskId::new(id)).await?;
    Ok(Json(task.into()))
}

/// POST /tasks/{id}/comments
#[tracing::instrument(skip(state, req))]
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state
        .services
        .tasks
        .add_comment(actor, TaskId::new(id), req.text)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /tasks/{id}/comments
#[tracing::instrument(skip(state))]
pub async fn comments(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let comments = state
        .services
        .tasks
        .list_comments(actor, TaskId::new(id))
        .await?;
    Ok(Json(comments))
}

/// PATCH /tasks/{id}
#[tracing::instrument(skip(state, patch))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state
        .services
        .tasks
        .update_task(actor, TaskId::new(id), patch)
        .await?;
    Ok(Json(task.into()))
}

/// PUT /tasks/{id}/executor
#[tracing::instrument(skip(state, req))]
pub async fn assign(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
    Json(req): Json<AssignRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .services
        .tasks
        .assign_executor(actor, TaskId::new(id), UserId::new(req.executor_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
