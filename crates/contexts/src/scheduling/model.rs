use chrono::{DateTime, Utc};
use common::{MeetingId, TeamId, UserId};
use domain::events::{MeetingCancelled, MeetingCreated, MeetingUpdated};
use domain::{AggregateRoot, Entity, EventRecorder, entity_identity};
use serde::{Deserialize, Serialize};

use super::SchedulingError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Meeting {
    id: MeetingId,
    team_id: TeamId,
    organizer_id: UserId,
    participant_ids: Vec<UserId>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    description: String,
    is_cancelled: bool,
    #[serde(skip)]
    events: EventRecorder,
}

impl Entity for Meeting {
    type Id = MeetingId;

    fn id(&self) -> MeetingId {
        self.id
    }
}

entity_identity!(Meeting);

impl AggregateRoot for Meeting {
    fn events(&self) -> &EventRecorder {
        &self.events
    }
}

impl Meeting {
    /// Schedules a meeting. The organizer always participates.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        id: MeetingId,
        team_id: TeamId,
        organizer_id: UserId,
        participant_ids: impl IntoIterator<Item = UserId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, SchedulingError> {
        if end <= start {
            return Err(SchedulingError::InvalidTimeRange);
        }
        if start <= now {
            return Err(SchedulingError::StartInPast);
        }

        let mut participants = vec![organizer_id];
        for user_id in participant_ids {
            if !participants.contains(&user_id) {
                participants.push(user_id);
            }
        }

        let mut meeting = Self {
            id,
            team_id,
            organizer_id,
            participant_ids: participants,
            start,
            end,
            description: description.into(),
            is_cancelled: false,
            events: EventRecorder::new(),
        };
        meeting.record_event(MeetingCreated {
            meeting_id: meeting.id,
            team_id: meeting.team_id,
            organizer_id: meeting.organizer_id,
            participant_ids: meeting.participant_ids.clone(),
            start: meeting.start,
            end: meeting.end,
            description: meeting.description.clone(),
            is_cancelled: meeting.is_cancelled,
        });
        Ok(meeting)
    }

    pub fn team_id(&self) -> TeamId {
        self.team_id
    }

    pub fn organizer_id(&self) -> UserId {
        self.organizer_id
    }

    pub fn participant_ids(&self) -> &[UserId] {
        &self.participant_ids
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled
    }

    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.participant_ids.contains(&user_id)
    }

    /// Whether this meeting, if still on, intersects `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        !self.is_cancelled && self.start < end && start < self.end
    }

    fn ensure_active(&self) -> Result<(), SchedulingError> {
        if self.is_cancelled {
            return Err(SchedulingError::Cancelled(self.id));
        }
        Ok(())
    }

    fn record_update(&mut self, previous_participant_ids: Vec<UserId>) {
        let event = MeetingUpdated {
            meeting_id: self.id,
            team_id: self.team_id,
            organizer_id: self.organizer_id,
            participant_ids: self.participant_ids.clone(),
            previous_participant_ids,
            start: self.start,
            end: self.end,
            description: self.description.clone(),
            is_cancelled: self.is_cancelled,
        };
        self.record_event(event);
    }

    pub fn add_participant(&mut self, user_id: UserId) -> Result<(), SchedulingError> {
        self.ensure_active()?;
        if self.has_participant(user_id) {
            return Err(SchedulingError::AlreadyParticipant(user_id));
        }

        let previous = self.participant_ids.clone();
        self.participant_ids.push(user_id);
        self.record_update(previous);
        Ok(())
    }

    pub fn remove_participant(&mut self, user_id: UserId) -> Result<(), SchedulingError> {
        self.ensure_active()?;
        if user_id == self.organizer_id {
            return Err(SchedulingError::CannotRemoveOrganizer);
        }
        if !self.has_participant(user_id) {
            return Err(SchedulingError::NotParticipant(user_id));
        }

        let previous = self.participant_ids.clone();
        self.participant_ids.retain(|id| *id != user_id);
        self.record_update(previous);
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), SchedulingError> {
        self.ensure_active()?;
        if self.start <= now {
            return Err(SchedulingError::AlreadyStarted(self.id));
        }

        self.is_cancelled = true;
        self.record_event(MeetingCancelled {
            meeting_id: self.id,
            team_id: self.team_id,
            organizer_id: self.organizer_id,
            participant_ids: self.participant_ids.clone(),
        });
        Ok(())
    }
}
