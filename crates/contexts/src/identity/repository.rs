use common::UserId;
use domain::{Entity, RepositoryProvider, Result, Scope};
use storage::{RowKey, Table};

use super::User;

pub const USERS: Table = Table::new("identity", "users");

/// Repositories of the identity context.
pub struct IdentityRepositories;

impl RepositoryProvider for IdentityRepositories {
    const CONTEXT: &'static str = "identity";

    type Repos<'s> = IdentityRepos<'s>;

    fn bind(scope: &mut Scope) -> IdentityRepos<'_> {
        IdentityRepos { scope }
    }
}

pub struct IdentityRepos<'s> {
    scope: &'s mut Scope,
}

impl IdentityRepos<'_> {
    pub fn users(&mut self) -> UserRepository<'_> {
        UserRepository {
            scope: &mut *self.scope,
        }
    }
}

pub struct UserRepository<'s> {
    scope: &'s mut Scope,
}

impl UserRepository<'_> {
    pub async fn next_id(&mut self) -> Result<UserId> {
        Ok(UserId::new(self.scope.next_id(USERS).await?))
    }

    pub async fn get(&self, id: UserId) -> Result<Option<User>> {
        self.scope.fetch(USERS, &RowKey::of(id)).await
    }

    /// Finds a user by email, ignoring case.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users: Vec<User> = self.scope.fetch_all(USERS, None).await?;
        Ok(users
            .into_iter()
            .find(|user| user.email().eq_ignore_ascii_case(email)))
    }

    pub async fn save(&mut self, user: &User) -> Result<()> {
        self.scope.save(USERS, RowKey::of(user.id()), user).await
    }
}
