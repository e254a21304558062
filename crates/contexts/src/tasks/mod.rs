//! Tasks context: owns tasks, projects users, teams and memberships.

mod error;
mod handlers;
mod model;
mod repository;
mod service;

pub use error::TaskError;
pub use handlers::{
    MemberAddedHandler, MemberRemovedHandler, MemberRoleChangedHandler, TeamCreatedHandler,
};
pub use model::{Comment, Task, TaskPatch};
pub use repository::{
    COMMENTS, CommentRepository, MEMBERS, MemberProjection, MemberRepository, TASKS, TEAMS,
    TaskRepository, TasksRepos, TasksRepositories, TeamProjection, TeamProjectionRepository, USERS,
};
pub use service::{CreateTask, TaskQuery, TaskService, TaskView};
