//! Meeting endpoints. Changes are limited to the meeting's organizer.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{MeetingId, Paged, TeamId, UserId};
use contexts::scheduling::{CreateMeeting, MeetingView};
use serde::{Deserialize, Serialize};

use super::{Actor, AppState, CreatedResponse};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateMeetingRequest {
    pub team_id: i64,
    #[serde(default)]
    pub participant_ids: Vec<i64>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct ParticipantRequest {
    pub user_id: i64,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub team_id: i64,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Serialize)]
pub struct MeetingResponse {
    pub id: i64,
    pub team_id: i64,
    pub organizer_id: i64,
    pub participant_ids: Vec<i64>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: String,
    pub is_cancelled: bool,
}

impl From<MeetingView> for MeetingResponse {
    fn from(meeting: MeetingView) -> Self {
        Self {
            id: meeting.id.as_i64(),
            team_id: meeting.team_id.as_i64(),
            organizer_id: meeting.organizer_id.as_i64(),
            participant_ids: meeting
                .participant_ids
                .iter()
                .map(UserId::as_i64)
                .collect(),
            start: meeting.start,
            end: meeting.end,
            description: meeting.description,
            is_cancelled: meeting.is_cancelled,
        }
    }
}

/// POST /meetings
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(req): Json<CreateMeetingRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let meeting_id = state
        .services
        .scheduling
        .create_meeting(
            actor,
            CreateMeeting {
                team_id: TeamId::new(req.team_id),
                participant_ids: req.participant_ids.into_iter().map(UserId::new).collect(),
                start: req.start,
                end: req.end,
                description: req.description,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: meeting_id.as_i64(),
        }),
    ))
}

/// GET /meetings/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
) -> Result<Json<MeetingResponse>, ApiError> {
    let meeting = state
        .services
        .scheduling
        .get_meeting(actor, MeetingId::new(id))
        .await?;
    Ok(Json(meeting.into()))
}

/// GET /meetings?team_id=&limit=&offset=
#[tracing::instrument(skip(state, query))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paged<MeetingResponse>>, ApiError> {
    let meetings = state
        .services
        .scheduling
        .list_team_meetings(
            actor,
            TeamId::new(query.team_id),
            super::page(query.limit, query.offset)?,
        )
        .await?;
    Ok(Json(meetings.map(MeetingResponse::from)))
}

/// POST /meetings/{id}/participants
#[tracing::instrument(skip(state, req))]
pub async fn add_participant(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
    Json(req): Json<ParticipantRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .services
        .scheduling
        .add_participant(actor, MeetingId::new(id), UserId::new(req.user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /meetings/{id}/participants/{user_id}
#[tracing::instrument(skip(state))]
pub async fn remove_participant(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state
        .services
        .scheduling
        .remove_participant(actor, MeetingId::new(id), UserId::new(user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /meetings/{id}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .services
        .scheduling
        .cancel_meeting(actor, MeetingId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/{id}/meetings
#[tracing::instrument(skip(state))]
pub async fn for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<MeetingResponse>>, ApiError> {
    let meetings = state
        .services
        .scheduling
        .meetings_for_user(UserId::new(user_id))
        .await?;
    Ok(Json(meetings.into_iter().map(Into::into).collect()))
}
