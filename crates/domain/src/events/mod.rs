//! Domain events exchanged between bounded contexts.
//!
//! Events carry only ids and plain values. They are the data contract
//! between contexts and never reference another context's models.

mod identity;
mod meetings;
mod tasks;
mod teams;

use serde::{Deserialize, Serialize};

pub use identity::{UserDeleted, UserRegistered, UserUpdated};
pub use meetings::{MeetingCancelled, MeetingCreated, MeetingUpdated};
pub use tasks::{TaskCreated, TaskUpdated};
pub use teams::{MemberAddedToTeam, MemberRemovedFromTeam, MemberRoleChanged, TeamCreated};

/// A concrete event payload that can be dispatched by type.
pub trait Event: Clone + std::fmt::Debug + Into<DomainEvent> + Send + Sync + 'static {
    /// Discriminant used as the dispatch key.
    const KIND: EventKind;

    /// Returns the payload when `event` is of this exact type.
    fn from_domain(event: &DomainEvent) -> Option<&Self>;
}

macro_rules! domain_events {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        /// Every fact that can cross a context boundary.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", content = "data")]
        pub enum DomainEvent {
            $($(#[$meta])* $name($name),)+
        }

        /// Exact type of a [`DomainEvent`], used to key subscriptions.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum EventKind {
            $($name,)+
        }

        impl EventKind {
            pub const ALL: &'static [EventKind] = &[$(EventKind::$name,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(EventKind::$name => stringify!($name),)+
                }
            }
        }

        impl DomainEvent {
            pub fn kind(&self) -> EventKind {
                match self {
                    $(DomainEvent::$name(_) => EventKind::$name,)+
                }
            }
        }

        $(
            impl Event for $name {
                const KIND: EventKind = EventKind::$name;

                fn from_domain(event: &DomainEvent) -> Option<&Self> {
                    match event {
                        DomainEvent::$name(inner) => Some(inner),
                        _ => None,
                    }
                }
            }

            impl From<$name> for DomainEvent {
                fn from(event: $name) -> Self {
                    DomainEvent::$name(event)
                }
            }
        )+
    };
}

domain_events! {
    /// A user account was created.
    UserRegistered,
    /// A user changed their username.
    UserUpdated,
    /// A user account was soft-deleted.
    UserDeleted,
    /// A team was created by a user who became its admin.
    TeamCreated,
    /// A user joined a team with a non-admin role.
    MemberAddedToTeam,
    /// A user left a team, or stopped holding a non-admin role in it.
    MemberRemovedFromTeam,
    /// A member switched between non-admin roles.
    MemberRoleChanged,
    /// A task was created.
    TaskCreated,
    /// A task was reassigned or edited.
    TaskUpdated,
    /// A meeting was scheduled.
    MeetingCreated,
    /// A meeting's participants or details changed.
    MeetingUpdated,
    /// A meeting was cancelled.
    MeetingCancelled,
}

impl DomainEvent {
    /// Name of the event type, as used in logs and metrics labels.
    pub fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
