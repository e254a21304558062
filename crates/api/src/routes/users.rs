//! User account endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::UserId;
use contexts::identity::{RegisterUser, UpdateUser, UserView};
use serde::{Deserialize, Serialize};

use super::{AppState, CreatedResponse};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct UpdateRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub deleted: bool,
}

impl From<UserView> for UserResponse {
    fn from(user: UserView) -> Self {
        Self {
            id: user.id.as_i64(),
            username: user.username,
            email: user.email,
            deleted: user.deleted,
        }
    }
}

/// POST /users
#[tracing::instrument(skip(state, req))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let user_id = state
        .services
        .identity
        .register_user(RegisterUser::new(req.username, req.email))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: user_id.as_i64(),
        }),
    ))
}

/// GET /users/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.services.identity.get_user(UserId::new(id)).await?;
    Ok(Json(user.into()))
}

/// PATCH /users/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .services
        .identity
        .update_user(UpdateUser {
            user_id: UserId::new(id),
            username: req.username,
            email: req.email,
        })
        .await?;
    Ok(Json(user.into()))
}

/// DELETE /users/{id}
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.services.identity.delete_user(UserId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
