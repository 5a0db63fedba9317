//! In-memory store with a unit of work that can be told to fail on commit.

use super::{TaskLookup, UnitOfWork};
use crate::error::StoreError;
use crate::types::{Task, TaskId, User, UserId};
use std::collections::HashMap;

/// Tasks and users held in maps.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tasks: HashMap<TaskId, Task>,
    users: HashMap<UserId, User>,
    fail_next_commit: bool,
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn insert_task(&mut self, task: Task) {
        self.tasks.insert(task.id, task);
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Number of successful commits so far.
    pub fn commits(&self) -> usize {
        self.commits
    }

    /// Make the next commit fail without applying anything.
    pub fn fail_next_commit(&mut self) {
        self.fail_next_commit = true;
    }

    /// Start a unit of work. The store is borrowed until it commits or drops.
    pub fn begin(&mut self) -> MemoryUnitOfWork<'_> {
        MemoryUnitOfWork {
            store: self,
            staged_tasks: HashMap::new(),
            staged_users: HashMap::new(),
        }
    }
}

impl TaskLookup for MemoryStore {
    fn find_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.get(&id).cloned())
    }
}

/// Pending writes against a [`MemoryStore`]. Reads see staged values first.
#[derive(Debug)]
pub struct MemoryUnitOfWork<'a> {
    store: &'a mut MemoryStore,
    staged_tasks: HashMap<TaskId, Task>,
    staged_users: HashMap<UserId, User>,
}

impl TaskLookup for MemoryUnitOfWork<'_> {
    fn find_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self
            .staged_tasks
            .get(&id)
            .or_else(|| self.store.tasks.get(&id))
            .cloned())
    }
}

impl UnitOfWork for MemoryUnitOfWork<'_> {
    fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self
            .staged_users
            .get(&id)
            .or_else(|| self.store.users.get(&id))
            .cloned())
    }

    fn stage_task_completion(&mut self, task: &Task) -> Result<bool, StoreError> {
        match self.find_task(task.id)? {
            Some(current) if !current.is_completed => {
                self.staged_tasks.insert(task.id, task.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn stage_user(&mut self, user: &User) -> Result<(), StoreError> {
        self.staged_users.insert(user.id, user.clone());
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        if self.store.fail_next_commit {
            self.store.fail_next_commit = false;
            return Err(StoreError::Commit("injected commit failure".into()));
        }

        self.store.tasks.extend(self.staged_tasks);
        self.store.users.extend(self.staged_users);
        self.store.commits += 1;
        Ok(())
    }
}
