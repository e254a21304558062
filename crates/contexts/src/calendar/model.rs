use chrono::{DateTime, Utc};
use common::{CalendarEventId, UserId};
use serde::{Deserialize, Serialize};

/// What a calendar entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Task,
    Meeting,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Task => "task",
            EntryKind::Meeting => "meeting",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line in a user's calendar: a task deadline or a meeting start.
/// Unique per `(user_id, kind, reference_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub id: CalendarEventId,
    pub user_id: UserId,
    pub kind: EntryKind,
    pub reference_id: i64,
    pub title: String,
    pub description: String,
    pub time: DateTime<Utc>,
    pub cancelled: bool,
}

/// Entry contents as carried by an event, before an id is attached.
#[derive(Debug, Clone)]
pub(crate) struct EntryDraft {
    pub kind: EntryKind,
    pub reference_id: i64,
    pub title: String,
    pub description: String,
    pub time: DateTime<Utc>,
    pub cancelled: bool,
}

impl EntryDraft {
    pub fn into_entry(self, id: CalendarEventId, user_id: UserId) -> CalendarEntry {
        CalendarEntry {
            id,
            user_id,
            kind: self.kind,
            reference_id: self.reference_id,
            title: self.title,
            description: self.description,
            time: self.time,
            cancelled: self.cancelled,
        }
    }
}

/// Title shown for a task, falling back to its id.
pub(crate) fn task_title(task_id: i64, title: &str) -> String {
    if title.trim().is_empty() {
        format!("Task #{task_id}")
    } else {
        title.to_string()
    }
}

pub(crate) fn meeting_title(meeting_id: i64) -> String {
    format!("Meeting #{meeting_id}")
}
