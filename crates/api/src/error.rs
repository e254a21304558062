//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use contexts::calendar::CalendarError;
use contexts::evaluations::EvaluationError;
use contexts::identity::IdentityError;
use contexts::scheduling::SchedulingError;
use contexts::tasks::TaskError;
use contexts::teams::TeamError;
use domain::DomainError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    /// Missing or malformed actor header.
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        metrics::counter!("api_errors_total", "status" => status.as_u16().to_string())
            .increment(1);
        if status.is_server_error() {
            tracing::error!(error = %self, "internal server error");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::Handler { .. } => {
                tracing::warn!(
                    handlers = ?err.handler_chain(),
                    cause = %err.root_cause(),
                    "write committed but propagation failed"
                );
                ApiError::Internal(message)
            }
            _ => ApiError::Internal(message),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        let message = err.to_string();
        match err {
            IdentityError::Domain(err) => err.into(),
            IdentityError::NotFound(_) => ApiError::NotFound(message),
            IdentityError::EmptyUsername | IdentityError::InvalidEmail(_) => {
                ApiError::BadRequest(message)
            }
            IdentityError::EmailTaken(_) | IdentityError::UserDeleted(_) => {
                ApiError::Conflict(message)
            }
        }
    }
}

impl From<TeamError> for ApiError {
    fn from(err: TeamError) -> Self {
        let message = err.to_string();
        match err {
            TeamError::Domain(err) => err.into(),
            TeamError::TeamNotFound(_) | TeamError::NotMember { .. } => ApiError::NotFound(message),
            TeamError::EmptyName | TeamError::UnknownUser(_) => ApiError::BadRequest(message),
            TeamError::NotAdmin { .. } => ApiError::Forbidden(message),
            TeamError::AlreadyMember { .. } | TeamError::LastAdmin(_) => ApiError::Conflict(message),
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        let message = err.to_string();
        match err {
            TaskError::Domain(err) => err.into(),
            TaskError::TeamNotFound(_) | TaskError::TaskNotFound(_) => ApiError::NotFound(message),
            TaskError::NotManager { .. }
            | TaskError::NotSupervisor(_)
            | TaskError::NoTaskAccess { .. }
            | TaskError::NoTeamAccess { .. } => ApiError::Forbidden(message),
            TaskError::NotTeamMember { .. }
            | TaskError::EmptyTitle
            | TaskError::DeadlineInPast
            | TaskError::EmptyComment => ApiError::BadRequest(message),
            TaskError::TaskDeleted(_) => ApiError::Conflict(message),
        }
    }
}

impl From<EvaluationError> for ApiError {
    fn from(err: EvaluationError) -> Self {
        let message = err.to_string();
        match err {
            EvaluationError::Domain(err) => err.into(),
            EvaluationError::TaskNotFound(_) | EvaluationError::EvaluationNotFound(_) => {
                ApiError::NotFound(message)
            }
            EvaluationError::NotSupervisor { .. } => ApiError::Forbidden(message),
            EvaluationError::TaskNotDone(_)
            | EvaluationError::NoExecutor(_)
            | EvaluationError::AlreadyEvaluated(_) => ApiError::Conflict(message),
        }
    }
}

impl From<SchedulingError> for ApiError {
    fn from(err: SchedulingError) -> Self {
        let message = err.to_string();
        match err {
            SchedulingError::Domain(err) => err.into(),
            SchedulingError::TeamNotFound(_)
            | SchedulingError::MeetingNotFound(_)
            | SchedulingError::NotParticipant(_) => ApiError::NotFound(message),
            SchedulingError::NotManager { .. }
            | SchedulingError::NotOrganizer(_)
            | SchedulingError::NoMeetingAccess { .. }
            | SchedulingError::NoTeamAccess { .. } => ApiError::Forbidden(message),
            SchedulingError::NotTeamMember { .. }
            | SchedulingError::InvalidTimeRange
            | SchedulingError::StartInPast
            | SchedulingError::CannotRemoveOrganizer => ApiError::BadRequest(message),
            SchedulingError::Overlap(_)
            | SchedulingError::AlreadyParticipant(_)
            | SchedulingError::Cancelled(_)
            | SchedulingError::AlreadyStarted(_) => ApiError::Conflict(message),
        }
    }
}

impl From<CalendarError> for ApiError {
    fn from(err: CalendarError) -> Self {
        let message = err.to_string();
        match err {
            CalendarError::Domain(err) => err.into(),
            CalendarError::InvalidMonth { .. } | CalendarError::InvalidDate(_) => {
                ApiError::BadRequest(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{TaskId, TeamId, UserId};

    #[test]
    fn context_errors_map_to_statuses() {
        let cases = [
            (ApiError::from(IdentityError::EmptyUsername), StatusCode::BAD_REQUEST),
            (
                ApiError::from(TaskError::NotSupervisor(TaskId::new(1))),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::from(EvaluationError::AlreadyEvaluated(TaskId::new(1))),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(SchedulingError::Overlap(UserId::new(1))),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(TeamError::TeamNotFound(TeamId::new(7))),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(DomainError::InvalidState("boom".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err}");
        }
    }
}
