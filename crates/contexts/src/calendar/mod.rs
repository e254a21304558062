//! Calendar context: per-user agenda built from tasks and meetings.

mod error;
mod handlers;
mod model;
mod repository;
mod service;

pub use error::CalendarError;
pub use handlers::{
    MeetingCancelledHandler, MeetingCreatedHandler, MeetingUpdatedHandler, TaskCreatedHandler,
    TaskUpdatedHandler,
};
pub use model::{CalendarEntry, EntryKind};
pub use repository::{CalendarRepos, CalendarRepositories, ENTRIES, EntryRepository, USERS};
pub use service::CalendarService;
