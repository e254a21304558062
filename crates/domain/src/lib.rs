//! Shared kernel of the bounded contexts.
//!
//! This crate provides the runtime every context builds on:
//! - [`Entity`] and [`AggregateRoot`] with its pending-event queue
//! - [`DomainEvent`], the facts exchanged between contexts
//! - [`EventBus`] and [`EventHandler`] for in-process propagation
//! - [`UnitOfWork`], which commits storage and then publishes events

pub mod aggregate;
pub mod bus;
pub mod entity;
pub mod error;
pub mod events;
pub mod unit_of_work;

pub use aggregate::{AggregateRoot, EventRecorder};
pub use bus::{DEFAULT_MAX_CASCADE_DEPTH, EventBus, EventHandler};
pub use entity::Entity;
pub use error::{DomainError, Result};
pub use events::{DomainEvent, Event, EventKind};
pub use unit_of_work::{RepositoryProvider, Scope, UnitOfWork, UnitOfWorkFactory, UnitState};
