//! Task CRUD, queries and completion.

use super::unit_of_work::SqliteUnitOfWork;
use super::{Database, now_ms, text_enum};
use crate::completion::{self, CompletedTask};
use crate::config::RewardsConfig;
use crate::error::GameError;
use crate::store::UnitOfWork;
use crate::types::{
    CategoryId, NewTask, Task, TaskDifficulty, TaskId, TaskPriority, TaskUpdate, UserId,
};
use anyhow::Result;
use chrono::{DateTime, Days, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

const MAX_TITLE_LEN: usize = 200;

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        priority: text_enum(row, "priority", TaskPriority::parse)?,
        difficulty: text_enum(row, "difficulty", TaskDifficulty::parse)?,
        due_date: row.get("due_date")?,
        category_id: row.get("category_id")?,
        parent_id: row.get("parent_id")?,
        is_completed: row.get("is_completed")?,
        completed_at: row.get("completed_at")?,
        streak_count: row.get("streak_count")?,
        experience_reward: row.get("experience_reward")?,
        gold_reward: row.get("gold_reward")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: TaskId) -> rusqlite::Result<Option<Task>> {
    conn.query_row(
        "SELECT * FROM tasks WHERE id = ?1",
        params![task_id],
        parse_task_row,
    )
    .optional()
}

/// Write the completion fields of `task`, but only if the stored row is still incomplete.
/// Returns whether the row was updated.
pub(crate) fn mark_completed_internal(conn: &Connection, task: &Task) -> rusqlite::Result<bool> {
    let updated = conn.execute(
        "UPDATE tasks SET is_completed = 1, completed_at = ?1, streak_count = ?2, updated_at = ?3
         WHERE id = ?4 AND is_completed = 0",
        params![task.completed_at, task.streak_count, task.updated_at, task.id],
    )?;
    Ok(updated == 1)
}

fn validate_title(title: &str) -> Result<(), GameError> {
    let len = title.trim().chars().count();
    if len == 0 || len > MAX_TITLE_LEN {
        return Err(GameError::invalid(
            "title",
            format!("must be 1-{} characters", MAX_TITLE_LEN),
        ));
    }
    Ok(())
}

fn ensure_owner(task: &Task, user_id: UserId) -> Result<(), GameError> {
    if task.owner_id != user_id {
        return Err(GameError::NotOwner {
            user_id,
            what: format!("task {}", task.id),
        });
    }
    Ok(())
}

fn query_tasks(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(sql)?;
    let tasks = stmt
        .query_map(params, parse_task_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

/// Start and end (exclusive) of the UTC day containing `now_ms`, in milliseconds.
fn utc_day_bounds(now_ms: i64) -> (i64, i64) {
    let date = DateTime::<Utc>::from_timestamp_millis(now_ms)
        .unwrap_or_default()
        .date_naive();
    let start = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let end = start
        .checked_add_days(Days::new(1))
        .unwrap_or(start);
    (start.timestamp_millis(), end.timestamp_millis())
}

impl Database {
    /// Create a task owned by `owner_id`.
    ///
    /// A parent must exist and belong to the same owner. Rewards not given in
    /// `input` come from `rewards`.
    pub fn create_task(&self, owner_id: UserId, input: NewTask, rewards: &RewardsConfig) -> Result<Task> {
        validate_title(&input.title)?;
        let now = now_ms();
        let title = input.title.trim().to_string();
        let experience_reward = input.experience_reward.unwrap_or(rewards.task_experience);
        let gold_reward = input.gold_reward.unwrap_or(rewards.task_gold);

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let owner_exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                params![owner_id],
                |row| row.get(0),
            )?;
            if !owner_exists {
                return Err(GameError::UserNotFound(owner_id).into());
            }

            if let Some(parent_id) = input.parent_id {
                let parent = get_task_internal(&tx, parent_id)?
                    .ok_or_else(|| GameError::invalid("parent_id", format!("task {} does not exist", parent_id)))?;
                if parent.owner_id != owner_id {
                    return Err(GameError::invalid("parent_id", "parent belongs to another user").into());
                }
            }

            if let Some(category_id) = input.category_id {
                let exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1)",
                    params![category_id],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Err(GameError::CategoryNotFound(category_id).into());
                }
            }

            tx.execute(
                "INSERT INTO tasks (
                    owner_id, parent_id, category_id, title, description, priority, difficulty,
                    due_date, experience_reward, gold_reward, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    owner_id,
                    input.parent_id,
                    input.category_id,
                    &title,
                    &input.description,
                    input.priority.as_str(),
                    input.difficulty.as_str(),
                    input.due_date,
                    experience_reward,
                    gold_reward,
                    now,
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();

            tx.commit()?;

            Ok(Task {
                id,
                owner_id,
                title,
                description: input.description,
                priority: input.priority,
                difficulty: input.difficulty,
                due_date: input.due_date,
                category_id: input.category_id,
                parent_id: input.parent_id,
                is_completed: false,
                completed_at: None,
                streak_count: 0,
                experience_reward,
                gold_reward,
                created_at: now,
                updated_at: now,
            })
        })
    }

    /// Get a task by ID.
    pub fn get_task(&self, task_id: TaskId) -> Result<Option<Task>> {
        self.with_conn(|conn| Ok(get_task_internal(conn, task_id)?))
    }

    /// List a user's tasks, oldest first. Completed tasks only when asked for.
    pub fn list_tasks(
        &self,
        owner_id: UserId,
        offset: u32,
        limit: u32,
        include_completed: bool,
    ) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            query_tasks(
                conn,
                "SELECT * FROM tasks
                 WHERE owner_id = ?1 AND (?2 OR is_completed = 0)
                 ORDER BY created_at, id
                 LIMIT ?3 OFFSET ?4",
                params![owner_id, include_completed, limit, offset],
            )
        })
    }

    pub fn tasks_by_category(
        &self,
        owner_id: UserId,
        category_id: CategoryId,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            query_tasks(
                conn,
                "SELECT * FROM tasks
                 WHERE owner_id = ?1 AND category_id = ?2
                 ORDER BY created_at, id
                 LIMIT ?3 OFFSET ?4",
                params![owner_id, category_id, limit, offset],
            )
        })
    }

    /// Incomplete tasks whose due date is before `now`.
    pub fn overdue_tasks(&self, owner_id: UserId, now: i64) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            query_tasks(
                conn,
                "SELECT * FROM tasks
                 WHERE owner_id = ?1 AND is_completed = 0
                 AND due_date IS NOT NULL AND due_date < ?2
                 ORDER BY due_date, id",
                params![owner_id, now],
            )
        })
    }

    /// Incomplete tasks due within the UTC day containing `now`.
    pub fn tasks_due_today(&self, owner_id: UserId, now: i64) -> Result<Vec<Task>> {
        let (start, end) = utc_day_bounds(now);
        self.with_conn(|conn| {
            query_tasks(
                conn,
                "SELECT * FROM tasks
                 WHERE owner_id = ?1 AND is_completed = 0
                 AND due_date >= ?2 AND due_date < ?3
                 ORDER BY due_date, id",
                params![owner_id, start, end],
            )
        })
    }

    /// Direct children of a task.
    pub fn subtasks(&self, parent_id: TaskId) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            query_tasks(
                conn,
                "SELECT * FROM tasks WHERE parent_id = ?1 ORDER BY created_at, id",
                params![parent_id],
            )
        })
    }

    /// Apply a partial update on behalf of `user_id`.
    ///
    /// Setting `is_completed` on a task that is not yet complete runs the
    /// completion chain in the same transaction as the field edits, and the
    /// returned [`CompletedTask`] describes the rewards. Completing an already
    /// completed task just applies the edits; un-completing is refused.
    pub fn update_task(
        &self,
        task_id: TaskId,
        user_id: UserId,
        update: TaskUpdate,
    ) -> Result<(Task, Option<CompletedTask>)> {
        if let Some(ref title) = update.title {
            validate_title(title)?;
        }
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let mut uow = SqliteUnitOfWork::begin(conn)?;

            let task = get_task_internal(uow.connection(), task_id)?
                .ok_or(GameError::TaskNotFound(task_id))?;
            ensure_owner(&task, user_id)?;

            if update.is_completed == Some(false) && task.is_completed {
                return Err(GameError::invalid("is_completed", "a completed task cannot be reopened").into());
            }

            let title = update
                .title
                .as_deref()
                .map(str::trim)
                .map(str::to_string)
                .unwrap_or(task.title.clone());
            let description = update.description.clone().unwrap_or(task.description.clone());
            let due_date = update.due_date.unwrap_or(task.due_date);
            let priority = update.priority.unwrap_or(task.priority);
            let difficulty = update.difficulty.unwrap_or(task.difficulty);

            uow.connection().execute(
                "UPDATE tasks SET
                    title = ?1, description = ?2, due_date = ?3, priority = ?4,
                    difficulty = ?5, updated_at = ?6
                WHERE id = ?7",
                params![
                    title,
                    description,
                    due_date,
                    priority.as_str(),
                    difficulty.as_str(),
                    now,
                    task_id,
                ],
            )?;

            let completion = if update.is_completed == Some(true) && !task.is_completed {
                Some(completion::complete_in(&mut uow, task_id, now)?)
            } else {
                None
            };

            uow.commit()?;

            if let Some(ref done) = completion {
                info!(
                    task_id,
                    owner_id = done.report.owner_id,
                    xp = done.report.experience_awarded,
                    gold = done.report.gold_awarded,
                    "task completed via update"
                );
            }

            let updated = get_task_internal(conn, task_id)?.ok_or(GameError::TaskNotFound(task_id))?;
            Ok((updated, completion))
        })
    }

    /// Complete a task on behalf of `user_id`, awarding its rewards to the owner.
    pub fn complete_task(&self, task_id: TaskId, user_id: UserId) -> Result<CompletedTask> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let uow = SqliteUnitOfWork::begin(conn)?;

            let task = get_task_internal(uow.connection(), task_id)?
                .ok_or(GameError::TaskNotFound(task_id))?;
            ensure_owner(&task, user_id)?;

            Ok(completion::complete_and_commit(uow, task_id, now)?)
        })
    }

    /// Delete a task on behalf of `user_id`. Subtasks are kept and lose their parent.
    pub fn delete_task(&self, task_id: TaskId, user_id: UserId) -> Result<Task> {
        self.with_conn(|conn| {
            let task = get_task_internal(conn, task_id)?.ok_or(GameError::TaskNotFound(task_id))?;
            ensure_owner(&task, user_id)?;

            conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            info!(task_id, "task deleted");

            Ok(task)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bounds_cover_the_utc_day() {
        // 2024-03-10T15:30:00Z
        let now = 1_710_084_600_000;

        let (start, end) = utc_day_bounds(now);

        assert_eq!(start, 1_710_028_800_000);
        assert_eq!(end - start, 86_400_000);
        assert!(start <= now && now < end);
    }

    #[test]
    fn title_length_is_checked() {
        assert!(validate_title("Slay the dragon").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(201)).is_err());
    }
}
