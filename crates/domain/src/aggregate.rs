//! Aggregate root and its pending-event queue.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::entity::Entity;
use crate::events::DomainEvent;

type Queue = Arc<Mutex<Vec<DomainEvent>>>;

fn lock(queue: &Queue) -> MutexGuard<'_, Vec<DomainEvent>> {
    // The Vec is never left half-updated, so poisoning is ignored
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ordered queue of events an aggregate has recorded but not yet published.
///
/// The queue is shared with the unit of work that tracks the aggregate, so
/// the unit can drain it at commit time without holding the aggregate
/// itself. It is not `Clone`: a copy of an aggregate must never
/// publish the original's events. Aggregates loaded from storage start with
/// an empty queue (`#[serde(skip)]` uses [`Default`]).
#[derive(Default)]
pub struct EventRecorder {
    queue: Queue,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event. No validation, no limit.
    pub fn record(&self, event: DomainEvent) {
        lock(&self.queue).push(event);
    }

    /// Returns every pending event in recorded order and empties the queue.
    pub fn drain(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut *lock(&self.queue))
    }

    /// Number of events waiting to be drained.
    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }

    pub(crate) fn handle(&self) -> PendingEvents {
        PendingEvents(Arc::clone(&self.queue))
    }
}

impl std::fmt::Debug for EventRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRecorder")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Handle on an aggregate's queue held by a unit of work.
///
/// Two handles are the same when they point at the same queue, which is
/// what makes the unit's seen set identity-based.
#[derive(Clone)]
pub(crate) struct PendingEvents(Queue);

impl PendingEvents {
    pub(crate) fn same_queue(&self, other: &PendingEvents) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn drain(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut *lock(&self.0))
    }
}

/// An entity that records domain events produced by its own state changes.
///
/// Only the aggregate's own mutating methods call [`record_event`]. The
/// queue is drained by the unit of work after a successful storage commit.
///
/// [`record_event`]: AggregateRoot::record_event
pub trait AggregateRoot: Entity {
    fn events(&self) -> &EventRecorder;

    fn record_event(&mut self, event: impl Into<DomainEvent>)
    where
        Self: Sized,
    {
        self.events().record(event.into());
    }

    /// Returns the pending events and clears them. A second call returns an
    /// empty list.
    fn pull_events(&mut self) -> Vec<DomainEvent> {
        self.events().drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{UserDeleted, UserRegistered};
    use common::UserId;

    #[derive(Debug, Default)]
    struct Account {
        id: i64,
        name: String,
        events: EventRecorder,
    }

    impl Entity for Account {
        type Id = i64;

        fn id(&self) -> i64 {
            self.id
        }
    }

    impl AggregateRoot for Account {
        fn events(&self) -> &EventRecorder {
            &self.events
        }
    }

    impl Account {
        fn rename(&mut self, name: &str) {
            self.name = name.to_string();
            self.record_event(UserRegistered::new(UserId::new(self.id), name));
        }

        fn close(&mut self) {
            self.record_event(UserDeleted::new(UserId::new(self.id)));
        }
    }

    #[test]
    fn pull_events_returns_recorded_order() {
        let mut account = Account {
            id: 1,
            ..Default::default()
        };
        account.rename("a");
        account.close();

        let events = account.pull_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type(), "UserRegistered");
        assert_eq!(events[1].event_type(), "UserDeleted");
    }

    #[test]
    fn pull_events_drains_exactly_once() {
        let mut account = Account::default();
        account.rename("a");

        assert_eq!(account.pull_events().len(), 1);
        assert!(account.pull_events().is_empty());
    }

    #[test]
    fn pull_events_on_empty_queue_is_empty() {
        let mut account = Account::default();
        assert!(account.pull_events().is_empty());
    }

    #[test]
    fn handles_share_the_queue() {
        let mut account = Account::default();
        let handle = account.events().handle();
        account.rename("a");

        assert_eq!(handle.drain().len(), 1);
        assert_eq!(account.events().pending(), 0);
        assert!(handle.same_queue(&account.events().handle()));
        assert!(!handle.same_queue(&EventRecorder::new().handle()));
    }
}
