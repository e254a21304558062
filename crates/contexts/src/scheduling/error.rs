use common::{MeetingId, TeamId, UserId};
use domain::DomainError;
use thiserror::Error;

/// Errors raised by the scheduling context.
#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Team not found: {0}")]
    TeamNotFound(TeamId),

    #[error("Meeting not found: {0}")]
    MeetingNotFound(MeetingId),

    #[error("User {user_id} is not a manager of team {team_id}")]
    NotManager { team_id: TeamId, user_id: UserId },

    #[error("User {user_id} is not a member of team {team_id}")]
    NotTeamMember { team_id: TeamId, user_id: UserId },

    #[error("User {user_id} has no access to meeting {meeting_id}")]
    NoMeetingAccess { meeting_id: MeetingId, user_id: UserId },

    #[error("User {user_id} has no access to the meetings of team {team_id}")]
    NoTeamAccess { team_id: TeamId, user_id: UserId },

    #[error("Only the organizer may change meeting {0}")]
    NotOrganizer(MeetingId),

    #[error("Meeting must end after it starts")]
    InvalidTimeRange,

    #[error("Meeting must start in the future")]
    StartInPast,

    #[error("User {0} already has a meeting at that time")]
    Overlap(UserId),

    #[error("User {0} already participates")]
    AlreadyParticipant(UserId),

    #[error("User {0} does not participate")]
    NotParticipant(UserId),

    #[error("The organizer cannot leave their own meeting")]
    CannotRemoveOrganizer,

    #[error("Meeting {0} is cancelled")]
    Cancelled(MeetingId),

    #[error("Meeting {0} has already started")]
    AlreadyStarted(MeetingId),
}
