//! Storage boundary for the bounded contexts.
//!
//! Every context talks to storage through a [`Session`]: a scoped
//! transactional handle opened by a [`SessionFactory`]. Writes are buffered
//! inside the session and applied atomically on [`Session::commit`], each as
//! an insert-or-update on its [`RowKey`].

pub mod error;
pub mod memory;
pub mod session;
pub mod table;

pub use error::{Result, StorageError};
pub use memory::{InMemoryDatabase, InMemorySession};
pub use session::{Session, SessionFactory};
pub use table::{RowKey, Table};
