use common::{TeamId, UserId, UserRole};
use serde::{Deserialize, Serialize};

/// Data for TeamCreated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamCreated {
    pub team_id: TeamId,

    /// The creator, who becomes the team's admin.
    pub user_id: UserId,
}

impl TeamCreated {
    pub fn new(team_id: TeamId, user_id: UserId) -> Self {
        Self { team_id, user_id }
    }
}

/// Data for MemberAddedToTeam event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAddedToTeam {
    pub team_id: TeamId,
    pub user_id: UserId,
    pub role: UserRole,
}

impl MemberAddedToTeam {
    pub fn new(team_id: TeamId, user_id: UserId, role: UserRole) -> Self {
        Self {
            team_id,
            user_id,
            role,
        }
    }
}

/// Data for MemberRemovedFromTeam event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRemovedFromTeam {
    pub team_id: TeamId,
    pub user_id: UserId,

    /// The role the user no longer holds.
    pub role: UserRole,
}

impl MemberRemovedFromTeam {
    pub fn new(team_id: TeamId, user_id: UserId, role: UserRole) -> Self {
        Self {
            team_id,
            user_id,
            role,
        }
    }
}

/// Data for MemberRoleChanged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRoleChanged {
    pub team_id: TeamId,
    pub user_id: UserId,
    pub old_role: UserRole,
    pub new_role: UserRole,
}

impl MemberRoleChanged {
    pub fn new(team_id: TeamId, user_id: UserId, old_role: UserRole, new_role: UserRole) -> Self {
        Self {
            team_id,
            user_id,
            old_role,
            new_role,
        }
    }
}
