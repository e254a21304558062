use common::{TeamId, UserId, UserRole};
use domain::{Entity, UnitOfWorkFactory};

use super::{Member, Team, TeamError, TeamRepository, TeamsRepositories};

#[derive(Debug, Clone)]
pub struct CreateTeam {
    pub creator_id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, Copy)]
pub struct AddMember {
    pub team_id: TeamId,
    pub user_id: UserId,
    pub role: UserRole,
}

#[derive(Debug, Clone, Copy)]
pub struct RemoveMember {
    pub team_id: TeamId,
    pub user_id: UserId,
    pub role: UserRole,
}

#[derive(Debug, Clone, Copy)]
pub struct ChangeMemberRole {
    pub team_id: TeamId,
    pub user_id: UserId,
    pub old_role: UserRole,
    pub new_role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamView {
    pub id: TeamId,
    pub name: String,
    pub creator_id: UserId,
    pub members: Vec<Member>,
}

impl From<&Team> for TeamView {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id(),
            name: team.name().to_string(),
            creator_id: team.creator_id(),
            members: team.members().to_vec(),
        }
    }
}

/// Loads a team the actor administers.
async fn administered(
    teams: &TeamRepository<'_>,
    team_id: TeamId,
    actor: UserId,
) -> Result<Team, TeamError> {
    let team = teams
        .get(team_id)
        .await?
        .ok_or(TeamError::TeamNotFound(team_id))?;
    if !team.is_admin(actor) {
        return Err(TeamError::NotAdmin {
            team_id,
            user_id: actor,
        });
    }
    Ok(team)
}

/// Team management. Every change except creation requires an admin.
#[derive(Clone)]
pub struct TeamService {
    units: UnitOfWorkFactory<TeamsRepositories>,
}

impl TeamService {
    pub fn new(units: UnitOfWorkFactory<TeamsRepositories>) -> Self {
        Self { units }
    }

    #[tracing::instrument(skip(self, cmd), fields(creator_id = %cmd.creator_id))]
    pub async fn create_team(&self, cmd: CreateTeam) -> Result<TeamId, TeamError> {
        let team_id = self
            .units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    if repos.users().active(cmd.creator_id).await?.is_none() {
                        return Err(TeamError::UnknownUser(cmd.creator_id));
                    }

                    let mut teams = repos.teams();
                    let team = Team::create(teams.next_id().await?, cmd.name, cmd.creator_id)?;
                    teams.save(&team).await?;
                    uow.commit().await?;
                    Ok::<_, TeamError>(team.id())
                })
            })
            .await?;

        tracing::info!(%team_id, "team created");
        Ok(team_id)
    }

    #[tracing::instrument(skip(self), fields(team_id = %cmd.team_id, user_id = %cmd.user_id))]
    pub async fn add_member(&self, actor: UserId, cmd: AddMember) -> Result<(), TeamError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    if repos.users().active(cmd.user_id).await?.is_none() {
                        return Err(TeamError::UnknownUser(cmd.user_id));
                    }

                    let mut teams = repos.teams();
                    let mut team = administered(&teams, cmd.team_id, actor).await?;
                    team.add_member(cmd.user_id, cmd.role)?;
                    teams.save(&team).await?;
                    uow.commit().await?;
                    Ok::<_, TeamError>(())
                })
            })
            .await
    }

    #[tracing::instrument(skip(self), fields(team_id = %cmd.team_id, user_id = %cmd.user_id))]
    pub async fn remove_member(&self, actor: UserId, cmd: RemoveMember) -> Result<(), TeamError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let mut teams = repos.teams();
                    let mut team = administered(&teams, cmd.team_id, actor).await?;
                    team.remove_member(cmd.user_id, cmd.role)?;
                    teams.save(&team).await?;
                    uow.commit().await?;
                    Ok::<_, TeamError>(())
                })
            })
            .await
    }

    #[tracing::instrument(skip(self), fields(team_id = %cmd.team_id, user_id = %cmd.user_id))]
    pub async fn change_member_role(
        &self,
        actor: UserId,
        cmd: ChangeMemberRole,
    ) -> Result<(), TeamError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let mut teams = repos.teams();
                    let mut team = administered(&teams, cmd.team_id, actor).await?;
                    team.change_role(cmd.user_id, cmd.old_role, cmd.new_role)?;
                    teams.save(&team).await?;
                    uow.commit().await?;
                    Ok::<_, TeamError>(())
                })
            })
            .await
    }

    pub async fn get_team(&self, team_id: TeamId) -> Result<TeamView, TeamError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let team = uow
                        .repos()?
                        .teams()
                        .get(team_id)
                        .await?
                        .ok_or(TeamError::TeamNotFound(team_id))?;
                    Ok::<_, TeamError>(TeamView::from(&team))
                })
            })
            .await
    }
}
