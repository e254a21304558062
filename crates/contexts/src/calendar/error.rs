use chrono::NaiveDate;
use domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Invalid month: {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Date out of range: {0}")]
    InvalidDate(NaiveDate),
}
