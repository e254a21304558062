//! Identity use cases.

use common::UserId;
use domain::{Entity, UnitOfWorkFactory};

use super::{IdentityError, IdentityRepositories, User};

/// Command to register a new account.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
}

impl RegisterUser {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
        }
    }
}

/// Command to change an account's username and/or email.
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub user_id: UserId,
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Read model returned by identity queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub deleted: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            username: user.username().to_string(),
            email: user.email().to_string(),
            deleted: user.is_deleted(),
        }
    }
}

/// Service for managing user accounts.
#[derive(Clone)]
pub struct IdentityService {
    units: UnitOfWorkFactory<IdentityRepositories>,
}

impl IdentityService {
    pub fn new(units: UnitOfWorkFactory<IdentityRepositories>) -> Self {
        Self { units }
    }

    /// Registers a user and propagates the registration to every context.
    #[tracing::instrument(skip(self, cmd), fields(username = %cmd.username))]
    pub async fn register_user(&self, cmd: RegisterUser) -> Result<UserId, IdentityError> {
        let user_id = self
            .units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let mut users = repos.users();
                    if users.find_by_email(&cmd.email).await?.is_some() {
                        return Err(IdentityError::EmailTaken(cmd.email));
                    }

                    let id = users.next_id().await?;
                    let user = User::register(id, cmd.username, cmd.email)?;
                    users.save(&user).await?;
                    uow.commit().await?;
                    Ok::<_, IdentityError>(id)
                })
            })
            .await?;

        metrics::counter!("users_registered_total").increment(1);
        tracing::info!(%user_id, "user registered");
        Ok(user_id)
    }

    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user_id))]
    pub async fn update_user(&self, cmd: UpdateUser) -> Result<UserView, IdentityError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let mut users = repos.users();
                    let mut user = users
                        .get(cmd.user_id)
                        .await?
                        .ok_or(IdentityError::NotFound(cmd.user_id))?;

                    if let Some(email) = cmd.email.as_deref()
                        && let Some(owner) = users.find_by_email(email).await?
                        && owner.id() != user.id()
                    {
                        return Err(IdentityError::EmailTaken(email.to_string()));
                    }

                    user.update(cmd.username, cmd.email)?;
                    users.save(&user).await?;
                    uow.commit().await?;
                    Ok::<_, IdentityError>(UserView::from(&user))
                })
            })
            .await
    }

    /// Soft-deletes a user. Deleting an already deleted user is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, user_id: UserId) -> Result<(), IdentityError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let mut users = repos.users();
                    let mut user = users
                        .get(user_id)
                        .await?
                        .ok_or(IdentityError::NotFound(user_id))?;

                    user.delete();
                    users.save(&user).await?;
                    uow.commit().await?;
                    Ok::<_, IdentityError>(())
                })
            })
            .await?;

        tracing::info!(%user_id, "user deleted");
        Ok(())
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<UserView, IdentityError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let user = uow
                        .repos()?
                        .users()
                        .get(user_id)
                        .await?
                        .ok_or(IdentityError::NotFound(user_id))?;
                    Ok::<_, IdentityError>(UserView::from(&user))
                })
            })
            .await
    }
}
