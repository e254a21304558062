//! Per-user calendar views.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::NaiveDate;
use common::UserId;
use contexts::calendar::CalendarEntry;

use super::AppState;
use crate::error::ApiError;

/// GET /users/{id}/calendar
#[tracing::instrument(skip(state))]
pub async fn all(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<CalendarEntry>>, ApiError> {
    let entries = state.services.calendar.all(UserId::new(user_id)).await?;
    Ok(Json(entries))
}

/// GET /users/{id}/calendar/day/{date}
#[tracing::instrument(skip(state))]
pub async fn day(
    State(state): State<Arc<AppState>>,
    Path((user_id, date)): Path<(i64, NaiveDate)>,
) -> Result<Json<Vec<CalendarEntry>>, ApiError> {
    let entries = state
        .services
        .calendar
        .day(UserId::new(user_id), date)
        .await?;
    Ok(Json(entries))
}

/// GET /users/{id}/calendar/month/{year}/{month}
#[tracing::instrument(skip(state))]
pub async fn month(
    State(state): State<Arc<AppState>>,
    Path((user_id, year, month)): Path<(i64, i32, u32)>,
) -> Result<Json<Vec<CalendarEntry>>, ApiError> {
    let entries = state
        .services
        .calendar
        .month(UserId::new(user_id), year, month)
        .await?;
    Ok(Json(entries))
}
