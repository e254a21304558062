//! Team and membership endpoints. All changes require an admin actor.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{TeamId, UserId, UserRole};
use contexts::teams::{AddMember, ChangeMemberRole, CreateTeam, RemoveMember, TeamView};
use serde::{Deserialize, Serialize};

use super::{Actor, AppState, CreatedResponse};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub user_id: i64,
    pub role: UserRole,
}

#[derive(Deserialize)]
pub struct RoleQuery {
    pub role: UserRole,
}

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub old_role: UserRole,
    pub new_role: UserRole,
}

#[derive(Serialize)]
pub struct MemberResponse {
    pub user_id: i64,
    pub role: UserRole,
}

#[derive(Serialize)]
pub struct TeamResponse {
    pub id: i64,
    pub name: String,
    pub creator_id: i64,
    pub members: Vec<MemberResponse>,
}

impl From<TeamView> for TeamResponse {
    fn from(team: TeamView) -> Self {
        Self {
            id: team.id.as_i64(),
            name: team.name,
            creator_id: team.creator_id.as_i64(),
            members: team
                .members
                .into_iter()
                .map(|m| MemberResponse {
                    user_id: m.user_id.as_i64(),
                    role: m.role,
                })
                .collect(),
        }
    }
}

/// POST /teams
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let team_id = state
        .services
        .teams
        .create_team(CreateTeam {
            creator_id: actor,
            name: req.name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: team_id.as_i64(),
        }),
    ))
}

/// GET /teams/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state.services.teams.get_team(TeamId::new(id)).await?;
    Ok(Json(team.into()))
}

/// POST /teams/{id}/members
#[tracing::instrument(skip(state, req))]
pub async fn add_member(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
    Json(req): Json<AddMemberRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .services
        .teams
        .add_member(
            actor,
            AddMember {
                team_id: TeamId::new(id),
                user_id: UserId::new(req.user_id),
                role: req.role,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /teams/{id}/members/{user_id}?role=...
#[tracing::instrument(skip(state, query))]
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path((id, user_id)): Path<(i64, i64)>,
    Query(query): Query<RoleQuery>,
) -> Result<StatusCode, ApiError> {
    state
        .services
        .teams
        .remove_member(
            actor,
            RemoveMember {
                team_id: TeamId::new(id),
                user_id: UserId::new(user_id),
                role: query.role,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /teams/{id}/members/{user_id}
#[tracing::instrument(skip(state, req))]
pub async fn change_role(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Path((id, user_id)): Path<(i64, i64)>,
    Json(req): Json<ChangeRoleRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .services
        .teams
        .change_member_role(
            actor,
            ChangeMemberRole {
                team_id: TeamId::new(id),
                user_id: UserId::new(user_id),
                old_role: req.old_role,
                new_role: req.new_role,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
