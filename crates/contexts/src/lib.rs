//! The six bounded contexts of the team workspace.
//!
//! `identity` owns users, `teams` owns teams and memberships, `tasks` owns
//! tasks and `scheduling` owns meetings. `evaluations` and `calendar` only
//! consume. Contexts never read each other's tables; each keeps the
//! projections it needs, fed by the handlers subscribed in [`wiring`].

pub mod calendar;
pub mod evaluations;
pub mod identity;
pub mod scheduling;
pub mod shared;
pub mod tasks;
pub mod teams;
pub mod wiring;

pub use wiring::{Contexts, Services, register_event_handlers};
