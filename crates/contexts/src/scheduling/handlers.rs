//! Team projection kept in step with the teams context.

use async_trait::async_trait;
use common::TeamId;
use domain::events::{MemberAddedToTeam, MemberRemovedFromTeam, MemberRoleChanged, TeamCreated};
use domain::{DomainError, EventHandler, Result, UnitOfWorkFactory};

use super::{SchedulingRepositories, TeamProjection};

/// Loads a team (empty if unknown), applies `change` and saves it.
async fn update_team<F>(
    units: &UnitOfWorkFactory<SchedulingRepositories>,
    team_id: TeamId,
    change: F,
) -> Result<()>
where
    F: FnOnce(&mut TeamProjection) + Send + 'static,
{
    units
        .create()
        .run(move |uow| {
            Box::pin(async move {
                let mut repos = uow.repos()?;
                let mut teams = repos.teams();
                let mut team = teams.get_or_new(team_id).await?;
                change(&mut team);
                teams.save(&team).await?;
                uow.commit().await?;
                Ok::<_, DomainError>(())
            })
        })
        .await
}

pub struct TeamCreatedHandler {
    units: UnitOfWorkFactory<SchedulingRepositories>,
}

impl TeamCreatedHandler {
    pub fn new(units: UnitOfWorkFactory<SchedulingRepositories>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl EventHandler<TeamCreated> for TeamCreatedHandler {
    #[tracing::instrument(skip(self, event), fields(team_id = %event.team_id))]
    async fn handle(&self, event: &TeamCreated) -> Result<()> {
        update_team(&self.units, event.team_id, |_| {}).await
    }
}

pub struct MemberAddedHandler {
    units: UnitOfWorkFactory<SchedulingRepositories>,
}

impl MemberAddedHandler {
    pub fn new(units: UnitOfWorkFactory<SchedulingRepositories>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl EventHandler<MemberAddedToTeam> for MemberAddedHandler {
    #[tracing::instrument(skip(self, event), fields(team_id = %event.team_id, user_id = %event.user_id))]
    async fn handle(&self, event: &MemberAddedToTeam) -> Result<()> {
        let MemberAddedToTeam {
            team_id,
            user_id,
            role,
        } = *event;

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    repos.users().ensure(user_id).await?;

                    let mut teams = repos.teams();
                    let mut team = teams.get_or_new(team_id).await?;
                    team.add(user_id, role);
                    teams.save(&team).await?;
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}

pub struct MemberRemovedHandler {
    units: UnitOfWorkFactory<SchedulingRepositories>,
}

impl MemberRemovedHandler {
    pub fn new(units: UnitOfWorkFactory<SchedulingRepositories>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl EventHandler<MemberRemovedFromTeam> for MemberRemovedHandler {
    #[tracing::instrument(skip(self, event), fields(team_id = %event.team_id, user_id = %event.user_id))]
    async fn handle(&self, event: &MemberRemovedFromTeam) -> Result<()> {
        let MemberRemovedFromTeam {
            team_id,
            user_id,
            role,
        } = *event;

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let mut teams = repos.teams();
                    let Some(mut team) = teams.get(team_id).await? else {
                        tracing::debug!("team was never projected");
                        return Ok(());
                    };
                    team.remove(user_id, role);
                    teams.save(&team).await?;
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}

pub struct MemberRoleChangedHandler {
    units: UnitOfWorkFactory<SchedulingRepositories>,
}

impl MemberRoleChangedHandler {
    pub fn new(units: UnitOfWorkFactory<SchedulingRepositories>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl EventHandler<MemberRoleChanged> for MemberRoleChangedHandler {
    #[tracing::instrument(skip(self, event), fields(team_id = %event.team_id, user_id = %event.user_id))]
    async fn handle(&self, event: &MemberRoleChanged) -> Result<()> {
        let MemberRoleChanged {
            team_id,
            user_id,
            old_role,
            new_role,
        } = *event;

        update_team(&self.units, team_id, move |team| {
            team.remove(user_id, old_role);
            team.add(user_id, new_role);
        })
        .await
    }
}
