//! Task completion: the ordered side effects of marking a task done.
//!
//! 1. flip the task to completed and stamp `completed_at`
//! 2. extend the streak from a completed parent
//! 3. award the task's experience to its owner
//! 4. award the task's gold to its owner
//! 5. persist task and owner in one commit
//!
//! [`complete_task`] runs steps 1-4 in memory. [`complete_in`] adds the
//! compare-and-set staging of step 5 inside a caller-owned unit of work, and
//! [`complete_and_commit`] also commits it.

use crate::error::CompletionError;
use crate::progression::LevelChange;
use crate::store::{TaskLookup, UnitOfWork};
use crate::types::{Task, TaskId, User, UserId};
use serde::Serialize;
use tracing::{debug, info, warn};

/// What a completion changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    pub task_id: TaskId,
    pub owner_id: UserId,
    pub completed_at: i64,
    pub streak_count: u32,
    /// True when a completed parent extended the streak.
    pub streak_extended: bool,
    pub experience_awarded: u64,
    pub gold_awarded: u64,
    pub level_change: LevelChange,
}

/// Task and owner as they stand after a completion, plus the report.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedTask {
    pub task: Task,
    pub owner: User,
    pub report: CompletionReport,
}

/// Apply the completion chain to `task` and its `owner`.
///
/// Fails with [`CompletionError::AlreadyCompleted`] when the task is already
/// done, so rewards are never paid twice. A parent that cannot be found only
/// skips the streak step. On any error both arguments are left untouched.
///
/// The caller is expected to have checked that the acting user may complete
/// the task; `owner` must be the task's owner.
pub fn complete_task<L>(
    task: &mut Task,
    owner: &mut User,
    parents: &L,
    now: i64,
) -> Result<CompletionReport, CompletionError>
where
    L: TaskLookup + ?Sized,
{
    if task.is_completed {
        return Err(CompletionError::AlreadyCompleted(task.id));
    }
    if owner.id != task.owner_id {
        return Err(CompletionError::OwnerMismatch {
            task_id: task.id,
            owner_id: task.owner_id,
            user_id: owner.id,
        });
    }

    // Work on copies so a failed parent lookup leaves the inputs as they were.
    let mut next_task = task.clone();
    let mut next_owner = owner.clone();

    next_task.completed_at = Some(now);
    next_task.is_completed = true;
    next_task.updated_at = now;

    let mut streak_extended = false;
    if let Some(parent_id) = next_task.parent_id {
        match parents.find_task(parent_id)? {
            Some(parent) if parent.is_completed => {
                next_task.streak_count = parent.streak_count.saturating_add(1);
                streak_extended = true;
            }
            Some(_) => {
                debug!(task_id = next_task.id, parent_id, "parent not completed, streak unchanged");
            }
            None => {
                debug!(task_id = next_task.id, parent_id, "parent not found, streak unchanged");
            }
        }
    }

    let level_change = next_owner
        .progression
        .award_experience(next_task.experience_reward);
    next_owner.progression.award_gold(next_task.gold_reward);
    next_owner.updated_at = now;

    let report = CompletionReport {
        task_id: next_task.id,
        owner_id: next_owner.id,
        completed_at: now,
        streak_count: next_task.streak_count,
        streak_extended,
        experience_awarded: next_task.experience_reward,
        gold_awarded: next_task.gold_reward,
        level_change,
    };

    *task = next_task;
    *owner = next_owner;
    Ok(report)
}

/// Load, complete and stage a task inside `uow` without committing.
///
/// Used when the completion must share a transaction with other writes.
pub fn complete_in<U: UnitOfWork>(
    uow: &mut U,
    task_id: TaskId,
    now: i64,
) -> Result<CompletedTask, CompletionError> {
    let mut task = uow
        .find_task(task_id)?
        .ok_or(CompletionError::TaskNotFound(task_id))?;
    if task.is_completed {
        return Err(CompletionError::AlreadyCompleted(task_id));
    }
    let mut owner = uow
        .find_user(task.owner_id)?
        .ok_or(CompletionError::OwnerNotFound {
            task_id,
            owner_id: task.owner_id,
        })?;

    let report = complete_task(&mut task, &mut owner, &*uow, now)?;

    if !uow.stage_task_completion(&task)? {
        warn!(task_id, "task completed concurrently, rewards not applied");
        return Err(CompletionError::AlreadyCompleted(task_id));
    }
    uow.stage_user(&owner)?;

    Ok(CompletedTask {
        task,
        owner,
        report,
    })
}

/// Complete a task and commit task and owner together.
///
/// Nothing is written unless the commit succeeds, so a failed call can be
/// retried from the same stored state.
pub fn complete_and_commit<U: UnitOfWork>(
    mut uow: U,
    task_id: TaskId,
    now: i64,
) -> Result<CompletedTask, CompletionError> {
    let completed = complete_in(&mut uow, task_id, now)?;
    uow.commit()?;

    let report = &completed.report;
    info!(
        task_id,
        owner_id = report.owner_id,
        xp = report.experience_awarded,
        gold = report.gold_awarded,
        streak = report.streak_count,
        "task completed"
    );
    if report.level_change.leveled_up() {
        info!(
            owner_id = report.owner_id,
            from = report.level_change.from,
            to = report.level_change.to,
            "level up"
        );
    }

    Ok(completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::Progression;
    use crate::types::{TaskDifficulty, TaskPriority};
    use std::collections::HashMap;

    fn user(progression: Progression) -> User {
        User {
            id: 1,
            username: "hero".into(),
            email: "hero@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Quest".into(),
            is_active: true,
            progression,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn no_parents() -> HashMap<TaskId, Task> {
        HashMap::new()
    }

    fn task(id: TaskId, xp: u64, gold: u64) -> Task {
        Task {
            id,
            owner_id: 1,
            title: format!("task {}", id),
            description: None,
            priority: TaskPriority::Medium,
            difficulty: TaskDifficulty::Medium,
            due_date: None,
            category_id: None,
            parent_id: None,
            is_completed: false,
            completed_at: None,
            streak_count: 0,
            experience_reward: xp,
            gold_reward: gold,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn completion_rewards_owner_and_marks_task() {
        let mut t = task(1, 10, 5);
        let mut owner = user(Progression::new(1, 95, 0));

        let report = complete_task(&mut t, &mut owner, &no_parents(), 1_000).unwrap();

        assert!(t.is_completed);
        assert_eq!(t.completed_at, Some(1_000));
        assert_eq!(t.streak_count, 0);
        assert_eq!(owner.progression, Progression::new(2, 5, 5));
        assert_eq!(report.level_change, LevelChange { from: 1, to: 2 });
        assert!(!report.streak_extended);
    }

    #[test]
    fn completed_parent_extends_streak() {
        let mut parent = task(1, 0, 0);
        parent.is_completed = true;
        parent.streak_count = 3;
        let parents = HashMap::from([(1, parent)]);
        let mut child = task(2, 10, 5);
        child.parent_id = Some(1);
        let mut owner = user(Progression::default());

        let report = complete_task(&mut child, &mut owner, &parents, 0).unwrap();

        assert_eq!(child.streak_count, 4);
        assert!(report.streak_extended);
        assert_eq!(parents[&1].streak_count, 3);
    }

    #[test]
    fn incomplete_parent_leaves_streak() {
        let mut parent = task(1, 0, 0);
        parent.streak_count = 8;
        let parents = HashMap::from([(1, parent)]);
        let mut child = task(2, 10, 5);
        child.parent_id = Some(1);
        child.streak_count = 2;
        let mut owner = user(Progression::default());

        complete_task(&mut child, &mut owner, &parents, 0).unwrap();

        assert_eq!(child.streak_count, 2);
    }

    #[test]
    fn missing_parent_is_not_an_error() {
        let mut child = task(2, 10, 5);
        child.parent_id = Some(99);
        let mut owner = user(Progression::default());

        let report = complete_task(&mut child, &mut owner, &no_parents(), 0).unwrap();

        assert!(child.is_completed);
        assert_eq!(child.streak_count, 0);
        assert_eq!(report.experience_awarded, 10);
    }

    #[test]
    fn second_completion_is_rejected_without_reward() {
        let mut t = task(1, 10, 5);
        let mut owner = user(Progression::default());
        complete_task(&mut t, &mut owner, &no_parents(), 0).unwrap();
        let after_first = owner.progression;

        let err = complete_task(&mut t, &mut owner, &no_parents(), 5).unwrap_err();

        assert!(matches!(err, CompletionError::AlreadyCompleted(1)));
        assert_eq!(owner.progression, after_first);
        assert_eq!(t.completed_at, Some(0));
    }

    #[test]
    fn wrong_owner_is_refused_untouched() {
        let mut t = task(1, 10, 5);
        t.owner_id = 2;
        let mut owner = user(Progression::default());

        let err = complete_task(&mut t, &mut owner, &no_parents(), 0).unwrap_err();

        assert!(matches!(err, CompletionError::OwnerMismatch { .. }));
        assert!(!t.is_completed);
        assert_eq!(owner.progression, Progression::default());
    }
}
