use common::TeamId;
use domain::{Entity, RepositoryProvider, Result, Scope};
use storage::{RowKey, Table};

use super::Team;
use crate::shared::{UserProjectionContext, UserProjections};

pub const USERS: Table = Table::new("teams", "users");
pub const TEAMS: Table = Table::new("teams", "teams");

/// Repositories of the teams context.
pub struct TeamsRepositories;

impl RepositoryProvider for TeamsRepositories {
    const CONTEXT: &'static str = "teams";

    type Repos<'s> = TeamsRepos<'s>;

    fn bind(scope: &mut Scope) -> TeamsRepos<'_> {
        TeamsRepos { scope }
    }
}

impl UserProjectionContext for TeamsRepositories {
    const USERS: Table = USERS;
}

pub struct TeamsRepos<'s> {
    scope: &'s mut Scope,
}

impl TeamsRepos<'_> {
    pub fn users(&mut self) -> UserProjections<'_> {
        UserProjections::new(&mut *self.scope, USERS)
    }

    pub fn teams(&mut self) -> TeamRepository<'_> {
        TeamRepository {
            scope: &mut *self.scope,
        }
    }
}

pub struct TeamRepository<'s> {
    scope: &'s mut Scope,
}

impl TeamRepository<'_> {
    pub async fn next_id(&mut self) -> Result<TeamId> {
        Ok(TeamId::new(self.scope.next_id(TEAMS).await?))
    }

    pub async fn get(&self, id: TeamId) -> Result<Option<Team>> {
        self.scope.fetch(TEAMS, &RowKey::of(id)).await
    }

    pub async fn save(&mut self, team: &Team) -> Result<()> {
        self.scope.save(TEAMS, RowKey::of(team.id()), team).await
    }
}
