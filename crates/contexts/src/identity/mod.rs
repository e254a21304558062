//! Identity context: owns user accounts.

mod error;
mod model;
mod repository;
mod service;

pub use error::IdentityError;
pub use model::User;
pub use repository::{IdentityRepos, IdentityRepositories, USERS, UserRepository};
pub use service::{IdentityService, RegisterUser, UpdateUser, UserView};
