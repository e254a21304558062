//! Identifiers and value types shared by every bounded context.
//!
//! Contexts never share storage, but they agree on these primitives so that
//! domain events can carry plain ids and roles across context boundaries.

pub mod page;
pub mod roles;
pub mod types;

pub use page::{Page, Paged};
pub use roles::{Grade, ParseValueError, TaskStatus, UserRole};
pub use types::{CalendarEventId, CommentId, EvaluationId, MeetingId, TaskId, TeamId, UserId};
