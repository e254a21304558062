//! In-process event bus.
//!
//! Handlers are keyed by the exact [`EventKind`] they subscribed to and run
//! one after another in subscription order. Each handler is awaited to full
//! completion, including any unit of work it commits and the events that
//! commit publishes, before the next handler starts. Propagation is
//! therefore a depth-first cascade on the publishing task.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{DomainError, Result};
use crate::events::{DomainEvent, Event, EventKind};

/// Default nesting limit for publications triggered by handlers.
pub const DEFAULT_MAX_CASCADE_DEPTH: usize = 32;

tokio::task_local! {
    static CASCADE_DEPTH: usize;
}

/// Reacts to one event type on behalf of one context.
#[async_trait]
pub trait EventHandler<E: Event>: Send + Sync {
    /// Name used in logs, metrics and handler errors.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    async fn handle(&self, event: &E) -> Result<()>;
}

#[async_trait]
trait ErasedHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn dispatch(&self, event: &DomainEvent) -> Result<()>;
}

struct Typed<E, H> {
    handler: H,
    _event: PhantomData<fn(E)>,
}

#[async_trait]
impl<E, H> ErasedHandler for Typed<E, H>
where
    E: Event,
    H: EventHandler<E>,
{
    fn name(&self) -> &'static str {
        self.handler.name()
    }

    async fn dispatch(&self, event: &DomainEvent) -> Result<()> {
        match E::from_domain(event) {
            Some(event) => self.handler.handle(event).await,
            None => Ok(()),
        }
    }
}

type Subscriptions = HashMap<EventKind, Vec<Arc<dyn ErasedHandler>>>;

struct Inner {
    subscriptions: RwLock<Subscriptions>,
    max_depth: usize,
}

/// Registry of event handlers, shared by every unit of work of a process.
///
/// Cloning the bus shares its subscriptions.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_CASCADE_DEPTH)
    }

    /// Creates a bus that refuses to publish more than `max_depth` levels
    /// below the outermost publication.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                subscriptions: RwLock::new(HashMap::new()),
                max_depth,
            }),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.inner.max_depth
    }

    /// Appends `handler` to the dispatch list of `E`.
    pub async fn subscribe<E, H>(&self, handler: H)
    where
        E: Event,
        H: EventHandler<E> + 'static,
    {
        let name = handler.name();
        let handler: Arc<dyn ErasedHandler> = Arc::new(Typed {
            handler,
            _event: PhantomData,
        });

        let mut subscriptions = self.inner.subscriptions.write().await;
        let handlers = subscriptions.entry(E::KIND).or_default();
        handlers.push(handler);

        tracing::debug!(
            event_type = E::KIND.as_str(),
            handler = name,
            position = handlers.len(),
            "handler subscribed"
        );
    }

    /// Number of handlers subscribed to `kind`.
    pub async fn subscriber_count(&self, kind: EventKind) -> usize {
        let subscriptions = self.inner.subscriptions.read().await;
        subscriptions.get(&kind).map_or(0, Vec::len)
    }

    /// Names of the handlers subscribed to `kind`, in dispatch order.
    pub async fn subscribers(&self, kind: EventKind) -> Vec<&'static str> {
        let subscriptions = self.inner.subscriptions.read().await;
        subscriptions
            .get(&kind)
            .map(|handlers| handlers.iter().map(|h| h.name()).collect())
            .unwrap_or_default()
    }

    /// Current publication depth of the calling task. Zero outside of any
    /// handler.
    pub fn current_depth() -> usize {
        CASCADE_DEPTH.try_with(|depth| *depth).unwrap_or(0)
    }

    /// Delivers `event` to every handler subscribed to its exact type.
    ///
    /// The first handler error stops dispatch: later handlers for this event
    /// are not invoked and the error is returned wrapped in
    /// [`DomainError::Handler`]. Publishing a type nobody subscribed to is a
    /// no-op.
    #[tracing::instrument(skip(self, event), fields(event_type = event.event_type(), depth = tracing::field::Empty))]
    pub async fn publish(&self, event: &DomainEvent) -> Result<()> {
        let depth = Self::current_depth();
        tracing::Span::current().record("depth", depth);

        if depth >= self.inner.max_depth {
            tracing::error!(limit = self.inner.max_depth, "event cascade too deep");
            return Err(DomainError::CascadeDepthExceeded {
                limit: self.inner.max_depth,
            });
        }

        // Snapshot so handlers may subscribe without deadlocking
        let handlers = {
            let subscriptions = self.inner.subscriptions.read().await;
            subscriptions.get(&event.kind()).cloned().unwrap_or_default()
        };

        if handlers.is_empty() {
            tracing::debug!("no subscribers");
            return Ok(());
        }

        let event_type = event.event_type();
        metrics::counter!("events_published_total", "event_type" => event_type).increment(1);
        let start = Instant::now();

        let result = CASCADE_DEPTH
            .scope(depth + 1, async {
                for handler in &handlers {
                    if let Err(source) = handler.dispatch(event).await {
                        metrics::counter!(
                            "event_handler_failures_total",
                            "event_type" => event_type,
                            "handler" => handler.name()
                        )
                        .increment(1);
                        tracing::warn!(handler = handler.name(), error = %source, "event handler failed");
                        return Err(DomainError::Handler {
                            handler: handler.name(),
                            event_type,
                            source: Box::new(source),
                        });
                    }
                }
                Ok(())
            })
            .await;

        metrics::histogram!("event_publish_duration_seconds", "event_type" => event_type)
            .record(start.elapsed().as_secs_f64());

        result
    }
}
