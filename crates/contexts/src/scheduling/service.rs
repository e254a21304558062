use chrono::{DateTime, Utc};
use common::{MeetingId, Page, Paged, TeamId, UserId};
use domain::{Entity, UnitOfWorkFactory};

use super::{
    Meeting, MeetingRepository, SchedulingError, SchedulingRepos, SchedulingRepositories,
    TeamProjection,
};

#[derive(Debug, Clone)]
pub struct CreateMeeting {
    pub team_id: TeamId,
    pub participant_ids: Vec<UserId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingView {
    pub id: MeetingId,
    pub team_id: TeamId,
    pub organizer_id: UserId,
    pub participant_ids: Vec<UserId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: String,
    pub is_cancelled: bool,
}

impl From<&Meeting> for MeetingView {
    fn from(meeting: &Meeting) -> Self {
        Self {
            id: meeting.id(),
            team_id: meeting.team_id(),
            organizer_id: meeting.organizer_id(),
            participant_ids: meeting.participant_ids().to_vec(),
            start: meeting.start(),
            end: meeting.end(),
            description: meeting.description().to_string(),
            is_cancelled: meeting.is_cancelled(),
        }
    }
}

/// Fails unless the user is an active member of the team.
async fn ensure_member(
    repos: &mut SchedulingRepos<'_>,
    team: &TeamProjection,
    user_id: UserId,
) -> Result<(), SchedulingError> {
    if !team.is_member(user_id) || repos.users().active(user_id).await?.is_none() {
        return Err(SchedulingError::NotTeamMember {
            team_id: team.id,
            user_id,
        });
    }
    Ok(())
}

/// Fails if the user already has another meeting intersecting the range.
async fn ensure_free(
    meetings: &MeetingRepository<'_>,
    user_id: UserId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    except: Option<MeetingId>,
) -> Result<(), SchedulingError> {
    let busy = meetings
        .for_participant(user_id)
        .await?
        .iter()
        .any(|m| Some(m.id()) != except && m.overlaps(start, end));
    if busy {
        return Err(SchedulingError::Overlap(user_id));
    }
    Ok(())
}

async fn organized(
    meetings: &MeetingRepository<'_>,
    meeting_id: MeetingId,
    actor: UserId,
) -> Result<Meeting, SchedulingError> {
    let meeting = meetings
        .get(meeting_id)
        .await?
        .ok_or(SchedulingError::MeetingNotFound(meeting_id))?;
    if meeting.organizer_id() != actor {
        return Err(SchedulingError::NotOrganizer(meeting_id));
    }
    Ok(meeting)
}

#[derive(Clone)]
pub struct SchedulingService {
    units: UnitOfWorkFactory<SchedulingRepositories>,
}

impl SchedulingService {
    pub fn new(units: UnitOfWorkFactory<SchedulingRepositories>) -> Self {
        Self { units }
    }

    /// Schedules a meeting organized by `actor`, who must manage the team.
    /// Every participant must be a team member with a free slot.
    #[tracing::instrument(skip(self, cmd), fields(team_id = %cmd.team_id))]
    pub async fn create_meeting(
        &self,
        actor: UserId,
        cmd: CreateMeeting,
    ) -> Result<MeetingId, SchedulingError> {
        let meeting_id = self
            .units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let team = repos
                        .teams()
                        .get(cmd.team_id)
                        .await?
                        .ok_or(SchedulingError::TeamNotFound(cmd.team_id))?;
                    if !team.is_manager(actor) {
                        return Err(SchedulingError::NotManager {
                            team_id: team.id,
                            user_id: actor,
                        });
                    }

                    let mut meetings = repos.meetings();
                    let meeting = Meeting::create(
                        meetings.next_id().await?,
                        team.id,
                        actor,
                        cmd.participant_ids,
                        cmd.start,
                        cmd.end,
                        cmd.description,
                        Utc::now(),
                    )?;

                    for &user_id in meeting.participant_ids() {
                        ensure_member(&mut repos, &team, user_id).await?;
                        ensure_free(&repos.meetings(), user_id, cmd.start, cmd.end, None).await?;
                    }

                    repos.meetings().save(&meeting).await?;
                    uow.commit().await?;
                    Ok::<_, SchedulingError>(meeting.id())
                })
            })
            .await?;

        tracing::info!(%meeting_id, "meeting created");
        Ok(meeting_id)
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_participant(
        &self,
        actor: UserId,
        meeting_id: MeetingId,
        user_id: UserId,
    ) -> Result<(), SchedulingError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let mut meeting = organized(&repos.meetings(), meeting_id, actor).await?;
                    let team = repos
                        .teams()
                        .get(meeting.team_id())
                        .await?
                        .ok_or(SchedulingError::TeamNotFound(meeting.team_id()))?;
                    ensure_member(&mut repos, &team, user_id).await?;

                    meeting.add_participant(user_id)?;
                    let mut meetings = repos.meetings();
                    ensure_free(
                        &meetings,
                        user_id,
                        meeting.start(),
                        meeting.end(),
                        Some(meeting_id),
                    )
                    .await?;
                    meetings.save(&meeting).await?;
                    uow.commit().await?;
                    Ok::<_, SchedulingError>(())
                })
            })
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_participant(
        &self,
        actor: UserId,
        meeting_id: MeetingId,
        user_id: UserId,
    ) -> Result<(), SchedulingError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let mut meetings = repos.meetings();
                    let mut meeting = organized(&meetings, meeting_id, actor).await?;
                    meeting.remove_participant(user_id)?;
                    meetings.save(&meeting).await?;
                    uow.commit().await?;
                    Ok::<_, SchedulingError>(())
                })
            })
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel_meeting(
        &self,
        actor: UserId,
        meeting_id: MeetingId,
    ) -> Result<(), SchedulingError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let mut meetings = repos.meetings();
                    let mut meeting = organized(&meetings, meeting_id, actor).await?;
                    meeting.cancel(Utc::now())?;
                    meetings.save(&meeting).await?;
                    uow.commit().await?;
                    Ok::<_, SchedulingError>(())
                })
            })
            .await
    }

    /// Reads a meeting. Only members of its team may see it.
    pub async fn get_meeting(
        &self,
        actor: UserId,
        meeting_id: MeetingId,
    ) -> Result<MeetingView, SchedulingError> {
        self.units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let meeting = repos
                        .meetings()
                        .get(meeting_id)
                        .await?
                        .ok_or(SchedulingError::MeetingNotFound(meeting_id))?;
                    let team = repos.teams().get_or_new(meeting.team_id()).await?;
                    if !team.is_member(actor) {
                        return Err(SchedulingError::NoMeetingAccess {
                            meeting_id,
                            user_id: actor,
                        });
                    }
                    Ok::<_, SchedulingError>(MeetingView::from(&meeting))
                })
            })
            .await
    }

    /// Meetings of a team ordered by start, for members of that team.
    #[tracing::instrument(skip(self))]
    pub async fn list_team_meetings(
        &self,
        actor: UserId,
        team_id: TeamId,
        page: Page,
    ) -> Result<Paged<MeetingView>, SchedulingError> {
        let meetings = self
            .units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let mut repos = uow.repos()?;
                    let team = repos
                        .teams()
                        .get(team_id)
                        .await?
                        .ok_or(SchedulingError::TeamNotFound(team_id))?;
                    if !team.is_member(actor) {
                        return Err(SchedulingError::NoTeamAccess {
                            team_id,
                            user_id: actor,
                        });
                    }
                    let meetings = repos.meetings().for_team(team_id).await?;
                    Ok::<_, SchedulingError>(meetings)
                })
            })
            .await?;

        Ok(page.apply(meetings.iter().map(MeetingView::from).collect()))
    }

    /// Meetings the user participates in, ordered by start time.
    pub async fn meetings_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<MeetingView>, SchedulingError> {
        let mut views = self
            .units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let meetings = uow.repos()?.meetings().for_participant(user_id).await?;
                    Ok::<_, SchedulingError>(
                        meetings.iter().map(MeetingView::from).collect::<Vec<_>>(),
                    )
                })
            })
            .await?;
        views.sort_by_key(|view| view.start);
        Ok(views)
    }
}
