//! Evaluations context: grades completed tasks.

mod error;
mod handlers;
mod model;
mod repository;
mod service;

pub use error::EvaluationError;
pub use handlers::{TaskCreatedHandler, TaskUpdatedHandler};
pub use model::{Evaluation, Period, average};
pub use repository::{
    EVALUATIONS, EvaluationRepository, EvaluationsRepos, EvaluationsRepositories, TASKS,
    TaskProjection, TaskProjectionRepository, USERS,
};
pub use service::{CreateEvaluation, EvaluationService};
