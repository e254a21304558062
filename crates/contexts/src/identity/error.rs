use common::UserId;
use domain::DomainError;
use thiserror::Error;

/// Errors raised by the identity context.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("User not found: {0}")]
    NotFound(UserId),

    #[error("Username must not be empty")]
    EmptyUsername,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("User {0} is deleted")]
    UserDeleted(UserId),
}
