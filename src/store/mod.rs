//! Storage seams used by task completion.
//!
//! [`TaskLookup`] is the read-only capability the streak step needs.
//! [`UnitOfWork`] groups the task and owner writes of a completion into one
//! atomic commit: staged changes become visible only through
//! [`UnitOfWork::commit`], and dropping an uncommitted unit discards them.
//!
//! Two implementations exist: [`crate::db::SqliteUnitOfWork`] and the
//! in-memory [`memory::MemoryStore`].

pub mod memory;

use crate::error::StoreError;
use crate::types::{Task, TaskId, User, UserId};
use std::collections::HashMap;

/// Fetch a task by id.
pub trait TaskLookup {
    fn find_task(&self, id: TaskId) -> Result<Option<Task>, StoreError>;
}

impl TaskLookup for HashMap<TaskId, Task> {
    fn find_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.get(&id).cloned())
    }
}

/// An atomic batch of task and user writes.
pub trait UnitOfWork: TaskLookup {
    fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Stage the completed state of `task`.
    ///
    /// This is a compare-and-set on the stored completion flag: it returns
    /// `false`, staging nothing, when the stored task is already completed.
    fn stage_task_completion(&mut self, task: &Task) -> Result<bool, StoreError>;

    /// Stage the progression fields of `user`.
    fn stage_user(&mut self, user: &User) -> Result<(), StoreError>;

    /// Apply every staged change, or none of them.
    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;
}
