//! HTTP handlers, one module per resource.

pub mod calendar;
pub mod evaluations;
pub mod health;
pub mod meetings;
pub mod metrics;
pub mod tasks;
pub mod teams;
pub mod users;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{Page, UserId};
use contexts::Services;
use serde::Serialize;

use crate::error::ApiError;

/// Header carrying the id of the user performing the request.
pub const ACTOR_HEADER: &str = "x-user-id";

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub services: Services,
}

/// The user performing the request, taken from [`ACTOR_HEADER`].
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {ACTOR_HEADER} header")))?;

        header
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<i64>().ok())
            .map(|id| Actor(UserId::new(id)))
            .ok_or_else(|| ApiError::Unauthorized(format!("invalid {ACTOR_HEADER} header")))
    }
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

/// Builds the page window from optional `limit` and `offset` query values.
pub fn page(limit: Option<usize>, offset: Option<usize>) -> Result<Page, ApiError> {
    Page::new(limit.unwrap_or(Page::DEFAULT_LIMIT), offset.unwrap_or(0))
        .map_err(|err| ApiError::BadRequest(err.to_string()))
}
