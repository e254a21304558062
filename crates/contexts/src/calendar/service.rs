use chrono::{DateTime, Months, NaiveDate, NaiveTime, Utc};
use common::UserId;
use domain::UnitOfWorkFactory;

use super::{CalendarEntry, CalendarError, CalendarRepositories};

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Read side of the calendar. Cancelled entries are hidden.
#[derive(Clone)]
pub struct CalendarService {
    units: UnitOfWorkFactory<CalendarRepositories>,
}

impl CalendarService {
    pub fn new(units: UnitOfWorkFactory<CalendarRepositories>) -> Self {
        Self { units }
    }

    /// Active entries of the user in `[from, to)`, ordered by time.
    async fn between(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CalendarEntry>, CalendarError> {
        let entries = self
            .units
            .create()
            .run(move |uow| {
                Box::pin(async move {
                    let entries = uow.repos()?.entries().for_user(user_id).await?;
                    Ok::<_, CalendarError>(entries)
                })
            })
            .await?;

        let mut entries: Vec<_> = entries
            .into_iter()
            .filter(|e| !e.cancelled && from <= e.time && e.time < to)
            .collect();
        entries.sort_by_key(|e| e.time);
        Ok(entries)
    }

    pub async fn day(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<CalendarEntry>, CalendarError> {
        let next = date.succ_opt().ok_or(CalendarError::InvalidDate(date))?;
        self.between(user_id, start_of(date), start_of(next)).await
    }

    pub async fn month(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<Vec<CalendarEntry>, CalendarError> {
        let invalid = || CalendarError::InvalidMonth { year, month };
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let next = first.checked_add_months(Months::new(1)).ok_or_else(invalid)?;
        self.between(user_id, start_of(first), start_of(next)).await
    }

    /// Every active entry of the user, ordered by time.
    pub async fn all(&self, user_id: UserId) -> Result<Vec<CalendarEntry>, CalendarError> {
        self.between(user_id, DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC)
            .await
    }
}
