use common::{CalendarEventId, UserId};
use domain::{RepositoryProvider, Result, Scope};
use storage::{RowKey, Table};

use super::{CalendarEntry, EntryKind};
use crate::shared::{UserProjectionContext, UserProjections};

pub const USERS: Table = Table::new("calendar", "users");
pub const ENTRIES: Table = Table::new("calendar", "entries");

pub struct CalendarRepositories;

impl RepositoryProvider for CalendarRepositories {
    const CONTEXT: &'static str = "calendar";

    type Repos<'s> = CalendarRepos<'s>;

    fn bind(scope: &mut Scope) -> CalendarRepos<'_> {
        CalendarRepos { scope }
    }
}

impl UserProjectionContext for CalendarRepositories {
    const USERS: Table = USERS;
}

pub struct CalendarRepos<'s> {
    scope: &'s mut Scope,
}

impl CalendarRepos<'_> {
    pub fn users(&mut self) -> UserProjections<'_> {
        UserProjections::new(&mut *self.scope, USERS)
    }

    pub fn entries(&mut self) -> EntryRepository<'_> {
        EntryRepository {
            scope: &mut *self.scope,
        }
    }
}

fn key(user_id: UserId, kind: EntryKind, reference_id: i64) -> RowKey {
    RowKey::triple(user_id, kind, reference_id)
}

pub struct EntryRepository<'s> {
    scope: &'s mut Scope,
}

impl EntryRepository<'_> {
    pub async fn next_id(&mut self) -> Result<CalendarEventId> {
        Ok(CalendarEventId::new(self.scope.next_id(ENTRIES).await?))
    }

    pub async fn get(
        &self,
        user_id: UserId,
        kind: EntryKind,
        reference_id: i64,
    ) -> Result<Option<CalendarEntry>> {
        self.scope
            .fetch(ENTRIES, &key(user_id, kind, reference_id))
            .await
    }

    pub async fn for_user(&self, user_id: UserId) -> Result<Vec<CalendarEntry>> {
        self.scope
            .fetch_all(ENTRIES, Some(&RowKey::prefix(user_id)))
            .await
    }

    /// Every user's entry for one task or meeting.
    pub async fn for_reference(
        &self,
        kind: EntryKind,
        reference_id: i64,
    ) -> Result<Vec<CalendarEntry>> {
        let entries: Vec<CalendarEntry> = self.scope.fetch_all(ENTRIES, None).await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.kind == kind && e.reference_id == reference_id)
            .collect())
    }

    pub async fn save(&mut self, entry: &CalendarEntry) -> Result<()> {
        self.scope
            .upsert(ENTRIES, key(entry.user_id, entry.kind, entry.reference_id), entry)
            .await
    }
}
