use common::UserId;
use domain::events::{UserDeleted, UserRegistered, UserUpdated};
use domain::{AggregateRoot, Entity, EventRecorder, entity_identity};
use serde::{Deserialize, Serialize};

use super::IdentityError;

/// A registered account. Owned by the identity context.
#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: String,
    email: String,
    deleted: bool,
    #[serde(skip)]
    events: EventRecorder,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

entity_identity!(User);

impl AggregateRoot for User {
    fn events(&self) -> &EventRecorder {
        &self.events
    }
}

fn validate_username(username: &str) -> Result<(), IdentityError> {
    if username.trim().is_empty() {
        return Err(IdentityError::EmptyUsername);
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), IdentityError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(IdentityError::InvalidEmail(email.to_string())),
    }
}

impl User {
    /// Registers a new account under an id drawn from the users sequence.
    pub fn register(
        id: UserId,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let username = username.into();
        let email = email.into();
        validate_username(&username)?;
        validate_email(&email)?;

        let mut user = Self {
            id,
            username,
            email,
            deleted: false,
            events: EventRecorder::new(),
        };
        user.record_event(UserRegistered::new(id, user.username.clone()));
        Ok(user)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Changes the username and/or email. Records nothing when no value
    /// actually changed.
    pub fn update(
        &mut self,
        username: Option<String>,
        email: Option<String>,
    ) -> Result<(), IdentityError> {
        if self.deleted {
            return Err(IdentityError::UserDeleted(self.id));
        }

        let mut changed = false;
        if let Some(username) = username.filter(|u| *u != self.username) {
            validate_username(&username)?;
            self.username = username;
            changed = true;
        }
        if let Some(email) = email.filter(|e| *e != self.email) {
            validate_email(&email)?;
            self.email = email;
            changed = true;
        }

        if changed {
            self.record_event(UserUpdated::new(self.id, self.username.clone()));
        }
        Ok(())
    }

    /// Soft-deletes the account. Deleting twice records one event.
    pub fn delete(&mut self) {
        if self.deleted {
            return;
        }
        self.deleted = true;
        self.record_event(UserDeleted::new(self.id));
    }
}
