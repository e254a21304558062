use common::{TeamId, UserId, UserRole};
use domain::DomainError;
use thiserror::Error;

/// Errors raised by the teams context.
#[derive(Debug, Error)]
pub enum TeamError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Team not found: {0}")]
    TeamNotFound(TeamId),

    #[error("Team name must not be empty")]
    EmptyName,

    #[error("Unknown or deleted user: {0}")]
    UnknownUser(UserId),

    #[error("User {user_id} is not an admin of team {team_id}")]
    NotAdmin { team_id: TeamId, user_id: UserId },

    #[error("User {user_id} already holds role {role}")]
    AlreadyMember { user_id: UserId, role: UserRole },

    #[error("User {user_id} does not hold role {role}")]
    NotMember { user_id: UserId, role: UserRole },

    #[error("Team {0} must keep at least one admin")]
    LastAdmin(TeamId),
}
