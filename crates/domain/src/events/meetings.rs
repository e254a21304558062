use chrono::{DateTime, Utc};
use common::{MeetingId, TeamId, UserId};
use serde::{Deserialize, Serialize};

/// Data for MeetingCreated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingCreated {
    pub meeting_id: MeetingId,
    pub team_id: TeamId,
    pub organizer_id: UserId,
    pub participant_ids: Vec<UserId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: String,
    pub is_cancelled: bool,
}

/// Data for MeetingUpdated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingUpdated {
    pub meeting_id: MeetingId,
    pub team_id: TeamId,
    pub organizer_id: UserId,
    pub participant_ids: Vec<UserId>,
    pub previous_participant_ids: Vec<UserId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: String,
    pub is_cancelled: bool,
}

impl MeetingUpdated {
    /// Participants that were invited before the change but no longer are.
    pub fn removed_participants(&self) -> impl Iterator<Item = UserId> + '_ {
        self.previous_participant_ids
            .iter()
            .copied()
            .filter(|id| !self.participant_ids.contains(id))
    }
}

/// Data for MeetingCancelled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingCancelled {
    pub meeting_id: MeetingId,
    pub team_id: TeamId,
    pub organizer_id: UserId,
    pub participant_ids: Vec<UserId>,
}
