//! Local copy of identity's users, kept by every consuming context.

use async_trait::async_trait;
use common::UserId;
use domain::events::{UserDeleted, UserRegistered, UserUpdated};
use domain::{DomainError, EventHandler, RepositoryProvider, Result, Scope, UnitOfWorkFactory};
use serde::{Deserialize, Serialize};
use storage::{RowKey, Table};

/// A user as seen by a context that does not own users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProjection {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub deleted: bool,
}

impl UserProjection {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            deleted: false,
        }
    }

    /// Row created when another event references a user this context has
    /// not heard about yet. The username fills in on the next UserUpdated.
    pub fn placeholder(id: UserId) -> Self {
        Self::new(id, "")
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }
}

/// A context that keeps a [`UserProjection`] table.
pub trait UserProjectionContext: RepositoryProvider {
    const USERS: Table;
}

/// Repository over a context's user projection table.
pub struct UserProjections<'s> {
    scope: &'s mut Scope,
    table: Table,
}

impl<'s> UserProjections<'s> {
    pub fn new(scope: &'s mut Scope, table: Table) -> Self {
        Self { scope, table }
    }

    pub async fn get(&self, id: UserId) -> Result<Option<UserProjection>> {
        self.scope.fetch(self.table, &RowKey::of(id)).await
    }

    /// Returns the user if present and not deleted.
    pub async fn active(&self, id: UserId) -> Result<Option<UserProjection>> {
        Ok(self.get(id).await?.filter(UserProjection::is_active))
    }

    pub async fn save(&mut self, user: &UserProjection) -> Result<()> {
        self.scope.upsert(self.table, RowKey::of(user.id), user).await
    }

    /// Creates a placeholder row unless the user is already known.
    pub async fn ensure(&mut self, id: UserId) -> Result<UserProjection> {
        if let Some(user) = self.get(id).await? {
            return Ok(user);
        }
        let user = UserProjection::placeholder(id);
        self.save(&user).await?;
        Ok(user)
    }
}

/// Copies a newly registered user into the context's projection. An
/// existing row keeps its deleted flag.
pub struct UserRegisteredHandler<P: UserProjectionContext> {
    units: UnitOfWorkFactory<P>,
}

impl<P: UserProjectionContext> UserRegisteredHandler<P> {
    pub fn new(units: UnitOfWorkFactory<P>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl<P: UserProjectionContext> EventHandler<UserRegistered> for UserRegisteredHandler<P> {
    #[tracing::instrument(skip(self, event), fields(context = P::CONTEXT, user_id = %event.user_id))]
    async fn handle(&self, event: &UserRegistered) -> Result<()> {
        let user_id = event.user_id;
        let username = event.username.clone();

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut users = UserProjections::new(uow.scope()?, P::USERS);
                    // A replayed registration must not revive a deleted user.
                    let user = match users.get(user_id).await? {
                        Some(mut user) => {
                            user.username = username;
                            user
                        }
                        None => UserProjection::new(user_id, username),
                    };
                    users.save(&user).await?;
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}

/// Applies a username change, creating the row if it was never seen.
pub struct UserUpdatedHandler<P: UserProjectionContext> {
    units: UnitOfWorkFactory<P>,
}

impl<P: UserProjectionContext> UserUpdatedHandler<P> {
    pub fn new(units: UnitOfWorkFactory<P>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl<P: UserProjectionContext> EventHandler<UserUpdated> for UserUpdatedHandler<P> {
    #[tracing::instrument(skip(self, event), fields(context = P::CONTEXT, user_id = %event.user_id))]
    async fn handle(&self, event: &UserUpdated) -> Result<()> {
        let user_id = event.user_id;
        let username = event.username.clone();

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut users = UserProjections::new(uow.scope()?, P::USERS);
                    let mut user = users
                        .get(user_id)
                        .await?
                        .unwrap_or_else(|| UserProjection::placeholder(user_id));
                    user.username = username;
                    users.save(&user).await?;
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}

/// Marks the projected user as deleted. Unknown users are ignored.
pub struct UserDeletedHandler<P: UserProjectionContext> {
    units: UnitOfWorkFactory<P>,
}

impl<P: UserProjectionContext> UserDeletedHandler<P> {
    pub fn new(units: UnitOfWorkFactory<P>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl<P: UserProjectionContext> EventHandler<UserDeleted> for UserDeletedHandler<P> {
    #[tracing::instrument(skip(self, event), fields(context = P::CONTEXT, user_id = %event.user_id))]
    async fn handle(&self, event: &UserDeleted) -> Result<()> {
        let user_id = event.user_id;

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut users = UserProjections::new(uow.scope()?, P::USERS);
                    let Some(mut user) = users.get(user_id).await? else {
                        tracing::debug!("deleted user was never projected");
                        return Ok(());
                    };
                    user.deleted = true;
                    users.save(&user).await?;
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}
