use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    Result, RowKey, StorageError, Table,
    session::{Session, SessionFactory},
};

#[derive(Default)]
struct State {
    tables: HashMap<Table, BTreeMap<RowKey, Value>>,
    sequences: HashMap<Table, i64>,
    rejected: HashSet<Table>,
}

/// In-memory database shared by every context of the process.
///
/// Cloning the handle shares the underlying data. Each context only ever
/// addresses its own tables, so sharing one database does not let contexts
/// see each other's rows.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    state: Arc<RwLock<State>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryDatabase {
    /// Creates a new empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new session.
    pub fn session(&self) -> InMemorySession {
        InMemorySession {
            database: self.clone(),
            pending: BTreeMap::new(),
            closed: false,
        }
    }

    /// Makes the next commit of any session fail without writing anything.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Makes every commit that writes to `table` fail without writing
    /// anything, until [`InMemoryDatabase::accept_writes_to`] is called.
    pub async fn reject_writes_to(&self, table: Table) {
        self.state.write().await.rejected.insert(table);
    }

    pub async fn accept_writes_to(&self, table: Table) {
        self.state.write().await.rejected.remove(&table);
    }

    /// Returns a committed row.
    pub async fn get(&self, table: Table, key: &RowKey) -> Option<Value> {
        let state = self.state.read().await;
        state.tables.get(&table).and_then(|rows| rows.get(key)).cloned()
    }

    /// Returns every committed row of a table, ordered by key.
    pub async fn rows(&self, table: Table) -> Vec<(RowKey, Value)> {
        let state = self.state.read().await;
        state
            .tables
            .get(&table)
            .map(|rows| rows.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// Returns the number of committed rows in a table.
    pub async fn row_count(&self, table: Table) -> usize {
        let state = self.state.read().await;
        state.tables.get(&table).map_or(0, BTreeMap::len)
    }

    /// Clears all tables and sequences.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.tables.clear();
        state.sequences.clear();
        state.rejected.clear();
    }
}

impl SessionFactory for InMemoryDatabase {
    fn open(&self) -> Box<dyn Session> {
        Box::new(self.session())
    }
}

/// Session over an [`InMemoryDatabase`].
///
/// Writes are buffered per `(table, key)`; `None` marks a pending delete.
pub struct InMemorySession {
    database: InMemoryDatabase,
    pending: BTreeMap<(Table, RowKey), Option<Value>>,
    closed: bool,
}

impl InMemorySession {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(StorageError::SessionClosed);
        }
        Ok(())
    }

    /// Number of buffered writes not yet committed.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }
}

#[async_trait]
impl Session for InMemorySession {
    async fn get(&self, table: Table, key: &RowKey) -> Result<Option<Value>> {
        self.ensure_open()?;

        if let Some(pending) = self.pending.get(&(table, key.clone())) {
            return Ok(pending.clone());
        }
        Ok(self.database.get(table, key).await)
    }

    async fn scan(&self, table: Table, prefix: Option<&str>) -> Result<Vec<(RowKey, Value)>> {
        self.ensure_open()?;

        let in_range = |key: &RowKey| prefix.is_none_or(|p| key.starts_with(p));

        let mut rows: BTreeMap<RowKey, Value> = self
            .database
            .rows(table)
            .await
            .into_iter()
            .filter(|(key, _)| in_range(key))
            .collect();

        // Overlay this session's own writes
        for ((pending_table, key), row) in &self.pending {
            if *pending_table != table || !in_range(key) {
                continue;
            }
            match row {
                Some(value) => {
                    rows.insert(key.clone(), value.clone());
                }
                None => {
                    rows.remove(key);
                }
            }
        }

        Ok(rows.into_iter().collect())
    }

    async fn upsert(&mut self, table: Table, key: RowKey, row: Value) -> Result<()> {
        self.ensure_open()?;
        self.pending.insert((table, key), Some(row));
        Ok(())
    }

    async fn delete(&mut self, table: Table, key: &RowKey) -> Result<bool> {
        self.ensure_open()?;
        let existed = self.get(table, key).await?.is_some();
        self.pending.insert((table, key.clone()), None);
        Ok(existed)
    }

    async fn next_id(&mut self, table: Table) -> Result<i64> {
        self.ensure_open()?;
        let mut state = self.database.state.write().await;
        let sequence = state.sequences.entry(table).or_insert(0);
        *sequence += 1;
        Ok(*sequence)
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;

        let mut state = self.database.state.write().await;

        let rejected_table = self
            .pending
            .keys()
            .map(|(table, _)| *table)
            .find(|table| state.rejected.contains(table));

        if self.database.fail_next_commit.swap(false, Ordering::SeqCst) || rejected_table.is_some()
        {
            let discarded = std::mem::take(&mut self.pending).len();
            let reason = match rejected_table {
                Some(table) => format!("writes to {table} are rejected"),
                None => "storage rejected the transaction".to_string(),
            };
            tracing::warn!(discarded, %reason, "commit rejected by storage");
            return Err(StorageError::CommitFailed(reason));
        }

        let writes = self.pending.len();
        for ((table, key), row) in std::mem::take(&mut self.pending) {
            let rows = state.tables.entry(table).or_default();
            match row {
                Some(value) => {
                    rows.insert(key, value);
                }
                None => {
                    rows.remove(&key);
                }
            }
        }

        metrics::counter!("storage_rows_written_total").increment(writes as u64);
        tracing::debug!(writes, "session committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.ensure_open()?;
        let discarded = std::mem::take(&mut self.pending).len();
        tracing::debug!(discarded, "session rolled back");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.pending.clear();
        self.closed = true;
        Ok(())
    }
}
