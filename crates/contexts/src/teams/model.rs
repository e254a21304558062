use common::{TeamId, UserId, UserRole};
use domain::events::{MemberAddedToTeam, MemberRemovedFromTeam, MemberRoleChanged, TeamCreated};
use domain::{AggregateRoot, DomainEvent, Entity, EventRecorder, entity_identity};
use serde::{Deserialize, Serialize};

use super::TeamError;

/// One role held by a user in a team. A user may hold several roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub role: UserRole,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Team {
    id: TeamId,
    name: String,
    creator_id: UserId,
    members: Vec<Member>,
    #[serde(skip)]
    events: EventRecorder,
}

impl Entity for Team {
    type Id = TeamId;

    fn id(&self) -> TeamId {
        self.id
    }
}

entity_identity!(Team);

impl AggregateRoot for Team {
    fn events(&self) -> &EventRecorder {
        &self.events
    }
}

/// Picks the event announcing a role change to other contexts.
///
/// Admins are not members anywhere outside the teams context, so becoming
/// an admin looks like leaving and ceasing to be one looks like joining.
pub fn role_change_event(
    team_id: TeamId,
    user_id: UserId,
    old_role: UserRole,
    new_role: UserRole,
) -> Option<DomainEvent> {
    match (old_role, new_role) {
        (old, new) if old == new => None,
        (old, UserRole::Admin) => Some(MemberRemovedFromTeam::new(team_id, user_id, old).into()),
        (UserRole::Admin, new) => Some(MemberAddedToTeam::new(team_id, user_id, new).into()),
        (old, new) => Some(MemberRoleChanged::new(team_id, user_id, old, new).into()),
    }
}

impl Team {
    /// Creates a team with its creator as the only admin.
    pub fn create(id: TeamId, name: impl Into<String>, creator_id: UserId) -> Result<Self, TeamError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TeamError::EmptyName);
        }

        let mut team = Self {
            id,
            name,
            creator_id,
            members: vec![Member {
                user_id: creator_id,
                role: UserRole::Admin,
            }],
            events: EventRecorder::new(),
        };
        team.record_event(TeamCreated::new(id, creator_id));
        Ok(team)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn creator_id(&self) -> UserId {
        self.creator_id
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn has_role(&self, user_id: UserId, role: UserRole) -> bool {
        self.members
            .iter()
            .any(|m| m.user_id == user_id && m.role == role)
    }

    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.has_role(user_id, UserRole::Admin)
    }

    fn admin_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.role == UserRole::Admin)
            .count()
    }

    fn ensure_not_last_admin(&self, role: UserRole) -> Result<(), TeamError> {
        if role == UserRole::Admin && self.admin_count() == 1 {
            return Err(TeamError::LastAdmin(self.id));
        }
        Ok(())
    }

    fn position(&self, user_id: UserId, role: UserRole) -> Result<usize, TeamError> {
        self.members
            .iter()
            .position(|m| m.user_id == user_id && m.role == role)
            .ok_or(TeamError::NotMember { user_id, role })
    }

    pub fn add_member(&mut self, user_id: UserId, role: UserRole) -> Result<(), TeamError> {
        if self.has_role(user_id, role) {
            return Err(TeamError::AlreadyMember { user_id, role });
        }

        self.members.push(Member { user_id, role });
        if role != UserRole::Admin {
            self.record_event(MemberAddedToTeam::new(self.id, user_id, role));
        }
        Ok(())
    }

    pub fn remove_member(&mut self, user_id: UserId, role: UserRole) -> Result<(), TeamError> {
        let index = self.position(user_id, role)?;
        self.ensure_not_last_admin(role)?;

        self.members.remove(index);
        if role != UserRole::Admin {
            self.record_event(MemberRemovedFromTeam::new(self.id, user_id, role));
        }
        Ok(())
    }

    /// Moves a user from one role to another.
    ///
    /// If the user already holds `new_role` the old role is simply dropped.
    pub fn change_role(
        &mut self,
        user_id: UserId,
        old_role: UserRole,
        new_role: UserRole,
    ) -> Result<(), TeamError> {
        if old_role == new_role {
            return Ok(());
        }
        let index = self.position(user_id, old_role)?;
        self.ensure_not_last_admin(old_role)?;

        if self.has_role(user_id, new_role) {
            return self.remove_member(user_id, old_role);
        }

        self.members[index].role = new_role;
        if let Some(event) = role_change_event(self.id, user_id, old_role, new_role) {
            self.record_event(event);
        }
        Ok(())
    }
}
