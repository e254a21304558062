//! Scheduling context: owns meetings, projects users, teams and memberships.

mod error;
mod handlers;
mod model;
mod repository;
mod service;

pub use error::SchedulingError;
pub use handlers::{
    MemberAddedHandler, MemberRemovedHandler, MemberRoleChangedHandler, TeamCreatedHandler,
};
pub use model::Meeting;
pub use repository::{
    MEETINGS, MeetingRepository, SchedulingRepos, SchedulingRepositories, TEAMS, TeamMember,
    TeamProjection, TeamProjectionRepository, USERS,
};
pub use service::{CreateMeeting, MeetingView, SchedulingService};
