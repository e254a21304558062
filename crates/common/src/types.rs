use serde::{Deserialize, Serialize};

/// Declares an integer identifier newtype.
///
/// Ids are assigned by the context that owns the entity and copied verbatim
/// into every other context's projection, so they are plain `i64` values
/// wrapped for type safety.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an id from its raw value.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw value.
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier of a user, assigned by the identity context.
    UserId
);

define_id!(
    /// Identifier of a team, assigned by the teams context.
    TeamId
);

define_id!(
    /// Identifier of a task, assigned by the tasks context.
    TaskId
);

define_id!(
    /// Identifier of a meeting, assigned by the scheduling context.
    MeetingId
);

define_id!(
    /// Identifier of a comment on a task, assigned by the tasks context.
    CommentId
);

define_id!(
    /// Identifier of an evaluation.
    EvaluationId
);

define_id!(
    /// Identifier of a calendar entry.
    CalendarEventId
);
