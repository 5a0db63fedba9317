//! SQLite-backed unit of work.

use super::tasks::{get_task_internal, mark_completed_internal};
use super::users::{get_user_internal, save_progression};
use crate::error::StoreError;
use crate::store::{TaskLookup, UnitOfWork};
use crate::types::{Task, TaskId, User, UserId};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// A unit of work over one `IMMEDIATE` SQLite transaction.
///
/// The write lock is taken when the unit begins, so a competing completion
/// waits (up to the busy timeout) and then sees the committed state.
/// Dropping the unit without committing rolls the transaction back.
pub struct SqliteUnitOfWork<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> SqliteUnitOfWork<'conn> {
    pub fn begin(conn: &'conn mut Connection) -> Result<Self, StoreError> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(Self { tx })
    }

    /// The connection inside the transaction, for writes that share it.
    pub fn connection(&self) -> &Connection {
        &self.tx
    }
}

impl TaskLookup for SqliteUnitOfWork<'_> {
    fn find_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(get_task_internal(&self.tx, id)?)
    }
}

impl UnitOfWork for SqliteUnitOfWork<'_> {
    fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(get_user_internal(&self.tx, id)?)
    }

    fn stage_task_completion(&mut self, task: &Task) -> Result<bool, StoreError> {
        Ok(mark_completed_internal(&self.tx, task)?)
    }

    fn stage_user(&mut self, user: &User) -> Result<(), StoreError> {
        save_progression(&self.tx, user)?;
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .map_err(|e| StoreError::Commit(e.to_string()))
    }
}
