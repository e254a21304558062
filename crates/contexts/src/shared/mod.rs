//! Building blocks shared by the consuming contexts.

pub mod users;

pub use users::{
    UserDeletedHandler, UserProjection, UserProjectionContext, UserProjections,
    UserRegisteredHandler, UserUpdatedHandler,
};
