use common::{MeetingId, TeamId, UserId, UserRole};
use domain::{Entity, RepositoryProvider, Result, Scope};
use serde::{Deserialize, Serialize};
use storage::{RowKey, Table};

use super::Meeting;
use crate::shared::{UserProjectionContext, UserProjections};

pub const USERS: Table = Table::new("scheduling", "users");
pub const TEAMS: Table = Table::new("scheduling", "teams");
pub const MEETINGS: Table = Table::new("scheduling", "meetings");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: UserId,
    pub role: UserRole,
}

/// A team with its non-admin memberships stored inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamProjection {
    pub id: TeamId,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

impl TeamProjection {
    pub fn new(id: TeamId) -> Self {
        Self {
            id,
            members: Vec::new(),
        }
    }

    pub fn is_member(&self, user_id: UserId) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    pub fn is_manager(&self, user_id: UserId) -> bool {
        self.members
            .iter()
            .any(|m| m.user_id == user_id && m.role == UserRole::Manager)
    }

    /// Adds the membership unless already present.
    pub fn add(&mut self, user_id: UserId, role: UserRole) {
        let member = TeamMember { user_id, role };
        if !self.members.contains(&member) {
            self.members.push(member);
        }
    }

    pub fn remove(&mut self, user_id: UserId, role: UserRole) {
        self.members
            .retain(|m| !(m.user_id == user_id && m.role == role));
    }
}

pub struct SchedulingRepositories;

impl RepositoryProvider for SchedulingRepositories {
    const CONTEXT: &'static str = "scheduling";

    type Repos<'s> = SchedulingRepos<'s>;

    fn bind(scope: &mut Scope) -> SchedulingRepos<'_> {
        SchedulingRepos { scope }
    }
}

impl UserProjectionContext for SchedulingRepositories {
    const USERS: Table = USERS;
}

pub struct SchedulingRepos<'s> {
    scope: &'s mut Scope,
}

impl SchedulingRepos<'_> {
    pub fn users(&mut self) -> UserProjections<'_> {
        UserProjections::new(&mut *self.scope, USERS)
    }

    pub fn teams(&mut self) -> TeamProjectionRepository<'_> {
        TeamProjectionRepository {
            scope: &mut *self.scope,
        }
    }

    pub fn meetings(&mut self) -> MeetingRepository<'_> {
        MeetingRepository {
            scope: &mut *self.scope,
        }
    }
}

pub struct TeamProjectionRepository<'s> {
    scope: &'s mut Scope,
}

impl TeamProjectionRepository<'_> {
    pub async fn get(&self, id: TeamId) -> Result<Option<TeamProjection>> {
        self.scope.fetch(TEAMS, &RowKey::of(id)).await
    }

    /// Loads the team, or an empty one if it was never projected.
    pub async fn get_or_new(&self, id: TeamId) -> Result<TeamProjection> {
        Ok(self
            .get(id)
            .await?
            .unwrap_or_else(|| TeamProjection::new(id)))
    }

    pub async fn save(&mut self, team: &TeamProjection) -> Result<()> {
        self.scope.upsert(TEAMS, RowKey::of(team.id), team).await
    }
}

pub struct MeetingRepository<'s> {
    scope: &'s mut Scope,
}

impl MeetingRepository<'_> {
    pub async fn next_id(&mut self) -> Result<MeetingId> {
        Ok(MeetingId::new(self.scope.next_id(MEETINGS).await?))
    }

    pub async fn get(&self, id: MeetingId) -> Result<Option<Meeting>> {
        self.scope.fetch(MEETINGS, &RowKey::of(id)).await
    }

    /// Every meeting the user participates in, cancelled ones included.
    pub async fn for_participant(&self, user_id: UserId) -> Result<Vec<Meeting>> {
        let meetings: Vec<Meeting> = self.scope.fetch_all(MEETINGS, None).await?;
        Ok(meetings
            .into_iter()
            .filter(|m| m.has_participant(user_id))
            .collect())
    }

    /// Every meeting of the team ordered by start, cancelled ones included.
    pub async fn for_team(&self, team_id: TeamId) -> Result<Vec<Meeting>> {
        let mut meetings: Vec<Meeting> = self.scope.fetch_all(MEETINGS, None).await?;
        meetings.retain(|m| m.team_id() == team_id);
        meetings.sort_by_key(|m| (m.start(), m.id()));
        Ok(meetings)
    }

    pub async fn save(&mut self, meeting: &Meeting) -> Result<()> {
        self.scope.save(MEETINGS, RowKey::of(meeting.id()), meeting).await
    }
}
