//! Transactional boundary of one bounded context.
//!
//! A [`UnitOfWork`] owns a storage session for its lifetime and remembers
//! every aggregate saved through it. Committing flushes the session first
//! and only then drains the remembered aggregates and publishes their
//! events, so no event ever describes a write that did not persist.

use std::marker::PhantomData;
use std::sync::Arc;

use futures_core::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use storage::{RowKey, Session, SessionFactory, Table};
use uuid::Uuid;

use crate::aggregate::{AggregateRoot, PendingEvents};
use crate::bus::EventBus;
use crate::error::{DomainError, Result};

/// Binds a context's repositories to an active [`Scope`].
///
/// `Repos` is usually a thin struct holding the scope, with one accessor per
/// repository. Accessors build the repository on demand, so a unit that only
/// touches one table never constructs the others.
pub trait RepositoryProvider: Send + Sync + 'static {
    /// Name of the owning context, used in logs and metrics.
    const CONTEXT: &'static str;

    type Repos<'s>: Send;

    fn bind(scope: &mut Scope) -> Self::Repos<'_>;
}

/// The open session of an active unit of work and its seen aggregates.
pub struct Scope {
    session: Box<dyn Session>,
    seen: Vec<PendingEvents>,
}

impl Scope {
    fn new(session: Box<dyn Session>) -> Self {
        Self {
            session,
            seen: Vec::new(),
        }
    }

    /// Loads and decodes one row.
    pub async fn fetch<T: DeserializeOwned>(&self, table: Table, key: &RowKey) -> Result<Option<T>> {
        match self.session.get(table, key).await? {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    /// Loads and decodes every row of a table, optionally filtered by key
    /// prefix, ordered by key.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        table: Table,
        prefix: Option<&str>,
    ) -> Result<Vec<T>> {
        self.session
            .scan(table, prefix)
            .await?
            .into_iter()
            .map(|(_, row)| serde_json::from_value(row).map_err(DomainError::from))
            .collect()
    }

    /// Inserts or replaces the row stored under `key`.
    pub async fn upsert<T: Serialize + Sync>(
        &mut self,
        table: Table,
        key: RowKey,
        row: &T,
    ) -> Result<()> {
        let value = serde_json::to_value(row)?;
        self.session.upsert(table, key, value).await?;
        Ok(())
    }

    /// Upserts an aggregate and tracks it so its events publish on commit.
    pub async fn save<A>(&mut self, table: Table, key: RowKey, aggregate: &A) -> Result<()>
    where
        A: AggregateRoot + Serialize + Sync,
    {
        self.upsert(table, key, aggregate).await?;
        self.track(aggregate);
        Ok(())
    }

    pub async fn remove(&mut self, table: Table, key: &RowKey) -> Result<bool> {
        Ok(self.session.delete(table, key).await?)
    }

    pub async fn next_id(&mut self, table: Table) -> Result<i64> {
        Ok(self.session.next_id(table).await?)
    }

    /// Adds an aggregate to the seen set.
    ///
    /// Tracking the same aggregate instance again is a no-op, so its events
    /// are published once per commit however many times it was saved.
    pub fn track<A: AggregateRoot + ?Sized>(&mut self, aggregate: &A) {
        let handle = aggregate.events().handle();
        if !self.seen.iter().any(|seen| seen.same_queue(&handle)) {
            self.seen.push(handle);
        }
    }

    /// Number of distinct aggregates tracked since the last commit.
    pub fn tracked(&self) -> usize {
        self.seen.len()
    }
}

/// Lifecycle of a [`UnitOfWork`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Unentered,
    Active,
    /// At least one commit succeeded; the session is still open.
    Committed,
    Released,
}

/// One logical transaction against one context's storage.
///
/// Single use: [`enter`], any number of repository operations and
/// [`commit`]s, then [`exit`]. [`run`] drives that sequence around a closure
/// and guarantees the exit.
///
/// [`enter`]: UnitOfWork::enter
/// [`commit`]: UnitOfWork::commit
/// [`exit`]: UnitOfWork::exit
/// [`run`]: UnitOfWork::run
pub struct UnitOfWork<P: RepositoryProvider> {
    id: Uuid,
    sessions: Arc<dyn SessionFactory>,
    bus: EventBus,
    state: UnitState,
    scope: Option<Scope>,
    _provider: PhantomData<fn() -> P>,
}

impl<P: RepositoryProvider> UnitOfWork<P> {
    pub fn new(sessions: Arc<dyn SessionFactory>, bus: EventBus) -> Self {
        Self {
            id: Uuid::new_v4(),
            sessions,
            bus,
            state: UnitState::Unentered,
            scope: None,
            _provider: PhantomData,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn context(&self) -> &'static str {
        P::CONTEXT
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Opens the session. Fails unless the unit was never entered.
    pub fn enter(&mut self) -> Result<()> {
        if self.state != UnitState::Unentered {
            return Err(DomainError::InvalidState(format!(
                "{} unit of work {} cannot be entered from {:?}",
                P::CONTEXT,
                self.id,
                self.state
            )));
        }

        self.scope = Some(Scope::new(self.sessions.open()));
        self.state = UnitState::Active;
        tracing::debug!(context = P::CONTEXT, unit_id = %self.id, "unit of work entered");
        Ok(())
    }

    /// The active scope, for direct table access.
    pub fn scope(&mut self) -> Result<&mut Scope> {
        let state = self.state;
        match (&mut self.scope, state) {
            (Some(scope), UnitState::Active | UnitState::Committed) => Ok(scope),
            _ => Err(DomainError::InvalidState(format!(
                "{} unit of work {} is not active ({:?})",
                P::CONTEXT,
                self.id,
                state
            ))),
        }
    }

    /// The context's repositories bound to this unit.
    pub fn repos(&mut self) -> Result<P::Repos<'_>> {
        Ok(P::bind(self.scope()?))
    }

    /// Commits the session, then publishes every event recorded by the
    /// aggregates saved since the previous commit.
    ///
    /// When storage rejects the commit nothing is published. When a handler
    /// fails, this unit's writes are already durable; the handler error is
    /// returned and events not yet published are dropped.
    #[tracing::instrument(skip(self), fields(context = P::CONTEXT, unit_id = %self.id))]
    pub async fn commit(&mut self) -> Result<()> {
        let scope = self.scope()?;

        if let Err(err) = scope.session.commit().await {
            metrics::counter!("uow_commit_failures_total", "context" => P::CONTEXT).increment(1);
            tracing::error!(error = %err, "storage commit failed, no events published");
            return Err(err.into());
        }

        let seen = std::mem::take(&mut scope.seen);
        self.state = UnitState::Committed;
        metrics::counter!("uow_commits_total", "context" => P::CONTEXT).increment(1);

        let mut published = 0usize;
        for aggregate in &seen {
            for event in aggregate.drain() {
                self.bus.publish(&event).await?;
                published += 1;
            }
        }

        tracing::debug!(aggregates = seen.len(), published, "unit of work committed");
        Ok(())
    }

    /// Releases the unit. Rolls back first when `failed`; always closes the
    /// session. Calling it again is a no-op.
    pub async fn exit(&mut self, failed: bool) -> Result<()> {
        let Some(mut scope) = self.scope.take() else {
            self.state = UnitState::Released;
            return Ok(());
        };
        self.state = UnitState::Released;

        let rolled_back = if failed {
            tracing::debug!(context = P::CONTEXT, unit_id = %self.id, "rolling back unit of work");
            scope.session.rollback().await
        } else {
            Ok(())
        };
        let closed = scope.session.close().await;

        rolled_back?;
        closed?;
        Ok(())
    }

    /// Enters the unit, runs `work`, and exits, rolling back if `work`
    /// returned an error.
    ///
    /// ```ignore
    /// let team_id = units
    ///     .create()
    ///     .run(move |uow| {
    ///         Box::pin(async move {
    ///             let team = Team::create(id, creator)?;
    ///             uow.repos()?.teams().save(&team).await?;
    ///             uow.commit().await?;
    ///             Ok(team.id())
    ///         })
    ///     })
    ///     .await?;
    /// ```
    pub async fn run<T, E, F>(mut self, work: F) -> std::result::Result<T, E>
    where
        F: for<'u> FnOnce(&'u mut UnitOfWork<P>) -> BoxFuture<'u, std::result::Result<T, E>>
            + Send,
        T: Send,
        E: From<DomainError> + Send,
    {
        self.enter()?;
        let outcome = work(&mut self).await;
        let released = self.exit(outcome.is_err()).await;

        let value = outcome?;
        released?;
        Ok(value)
    }
}

impl<P: RepositoryProvider> Drop for UnitOfWork<P> {
    fn drop(&mut self) {
        if self.scope.is_some() {
            tracing::warn!(
                context = P::CONTEXT,
                unit_id = %self.id,
                "unit of work dropped without exit, uncommitted writes discarded"
            );
        }
    }
}

/// Creates fresh units of work for one context.
pub struct UnitOfWorkFactory<P: RepositoryProvider> {
    sessions: Arc<dyn SessionFactory>,
    bus: EventBus,
    _provider: PhantomData<fn() -> P>,
}

impl<P: RepositoryProvider> Clone for UnitOfWorkFactory<P> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            bus: self.bus.clone(),
            _provider: PhantomData,
        }
    }
}

impl<P: RepositoryProvider> UnitOfWorkFactory<P> {
    pub fn new(sessions: Arc<dyn SessionFactory>, bus: EventBus) -> Self {
        Self {
            sessions,
            bus,
            _provider: PhantomData,
        }
    }

    pub fn create(&self) -> UnitOfWork<P> {
        UnitOfWork::new(Arc::clone(&self.sessions), self.bus.clone())
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}
