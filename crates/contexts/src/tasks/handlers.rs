//! Team and membership projections fed by the teams context.

use async_trait::async_trait;
use domain::events::{MemberAddedToTeam, MemberRemovedFromTeam, MemberRoleChanged, TeamCreated};
use domain::{DomainError, EventHandler, Result, UnitOfWorkFactory};

use super::{MemberProjection, TasksRepositories, TeamProjection};

pub struct TeamCreatedHandler {
    units: UnitOfWorkFactory<TasksRepositories>,
}

impl TeamCreatedHandler {
    pub fn new(units: UnitOfWorkFactory<TasksRepositories>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl EventHandler<TeamCreated> for TeamCreatedHandler {
    #[tracing::instrument(skip(self, event), fields(team_id = %event.team_id))]
    async fn handle(&self, event: &TeamCreated) -> Result<()> {
        let team = TeamProjection { id: event.team_id };

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    uow.repos()?.teams().save(&team).await?;
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}

/// Records a membership, creating the team and user rows if they were
/// never seen.
pub struct MemberAddedHandler {
    units: UnitOfWorkFactory<TasksRepositories>,
}

impl MemberAddedHandler {
    pub fn new(units: UnitOfWorkFactory<TasksRepositories>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl EventHandler<MemberAddedToTeam> for MemberAddedHandler {
    #[tracing::instrument(skip(self, event), fields(team_id = %event.team_id, user_id = %event.user_id))]
    async fn handle(&self, event: &MemberAddedToTeam) -> Result<()> {
        let member = MemberProjection {
            team_id: event.team_id,
            user_id: event.user_id,
            role: event.role,
        };

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let mut teams = repos.teams();
                    if teams.get(member.team_id).await?.is_none() {
                        teams.save(&TeamProjection { id: member.team_id }).await?;
                    }
                    repos.users().ensure(member.user_id).await?;
                    repos.members().save(&member).await?;
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}

pub struct MemberRemovedHandler {
    units: UnitOfWorkFactory<TasksRepositories>,
}

impl MemberRemovedHandler {
    pub fn new(units: UnitOfWorkFactory<TasksRepositories>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl EventHandler<MemberRemovedFromTeam> for MemberRemovedHandler {
    #[tracing::instrument(skip(self, event), fields(team_id = %event.team_id, user_id = %event.user_id))]
    async fn handle(&self, event: &MemberRemovedFromTeam) -> Result<()> {
        let member = MemberProjection {
            team_id: event.team_id,
            user_id: event.user_id,
            role: event.role,
        };

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    if !uow.repos()?.members().remove(&member).await? {
                        tracing::debug!(role = %member.role, "membership was never projected");
                    }
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}

/// Replaces the old role row with the new one.
pub struct MemberRoleChangedHandler {
    units: UnitOfWorkFactory<TasksRepositories>,
}

impl MemberRoleChangedHandler {
    pub fn new(units: UnitOfWorkFactory<TasksRepositories>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl EventHandler<MemberRoleChanged> for MemberRoleChangedHandler {
    #[tracing::instrument(skip(self, event), fields(team_id = %event.team_id, user_id = %event.user_id))]
    async fn handle(&self, event: &MemberRoleChanged) -> Result<()> {
        let old = MemberProjection {
            team_id: event.team_id,
            user_id: event.user_id,
            role: event.old_role,
        };
        let new = MemberProjection {
            role: event.new_role,
            ..old
        };

        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let mut members = repos.members();
                    members.remove(&old).await?;
                    members.save(&new).await?;
                    uow.commit().await?;
                    Ok::<_, DomainError>(())
                })
            })
            .await
    }
}
