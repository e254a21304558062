//! Teams context: owns teams and their memberships.

mod error;
mod model;
mod repository;
mod service;

pub use error::TeamError;
pub use model::{Member, Team, role_change_event};
pub use repository::{TEAMS, TeamRepository, TeamsRepos, TeamsRepositories, USERS};
pub use service::{AddMember, ChangeMemberRole, CreateTeam, RemoveMember, TeamService, TeamView};
