use async_trait::async_trait;
use serde_json::Value;

use crate::{Result, RowKey, Table};

/// A scoped transactional handle to storage.
///
/// Reads observe the session's own uncommitted writes. Writes become visible
/// to other sessions only after [`Session::commit`] succeeds, and all of them
/// become visible together.
#[async_trait]
pub trait Session: Send + Sync {
    /// Fetches a single row by key.
    async fn get(&self, table: Table, key: &RowKey) -> Result<Option<Value>>;

    /// Returns every row of `table`, optionally restricted to keys starting
    /// with `prefix`, ordered by key.
    async fn scan(&self, table: Table, prefix: Option<&str>) -> Result<Vec<(RowKey, Value)>>;

    /// Inserts the row if its key is absent, otherwise replaces it.
    async fn upsert(&mut self, table: Table, key: RowKey, row: Value) -> Result<()>;

    /// Deletes a row. Returns whether a row was visible under that key.
    async fn delete(&mut self, table: Table, key: &RowKey) -> Result<bool>;

    /// Draws the next value of the table's id sequence.
    ///
    /// Sequences are not transactional: a rolled back session still consumes
    /// the ids it drew.
    async fn next_id(&mut self, table: Table) -> Result<i64>;

    /// Applies every buffered write atomically.
    async fn commit(&mut self) -> Result<()>;

    /// Discards every buffered write.
    async fn rollback(&mut self) -> Result<()>;

    /// Releases the session. Uncommitted writes are discarded and any further
    /// use fails with [`crate::StorageError::SessionClosed`].
    async fn close(&mut self) -> Result<()>;
}

/// Opens sessions against one database.
pub trait SessionFactory: Send + Sync {
    fn open(&self) -> Box<dyn Session>;
}
