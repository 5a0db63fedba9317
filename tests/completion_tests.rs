//! Integration tests for task completion against the in-memory store.

use rstest::{fixture, rstest};
use task_donegeon::completion::{complete_and_commit, complete_in};
use task_donegeon::error::{CompletionError, ErrorCode, StoreError};
use task_donegeon::progression::Progression;
use task_donegeon::store::memory::MemoryStore;
use task_donegeon::types::{Task, TaskDifficulty, TaskId, TaskPriority, User};

const NOW: i64 = 1_700_000_000_000;

fn user(id: i64, progression: Progression) -> User {
    User {
        id,
        username: format!("hero{}", id),
        email: format!("hero{}@example.com", id),
        first_name: "Ada".into(),
        last_name: "Quest".into(),
        is_active: true,
        progression,
        created_at: 0,
        updated_at: 0,
    }
}

fn task(id: TaskId, owner_id: i64, xp: u64, gold: u64) -> Task {
    Task {
        id,
        owner_id,
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

/// Owner 1 at level 1 with 95 xp, and task 10 worth 10 xp / 5 gold.
#[fixture]
fn store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert_user(user(1, Progression::new(1, 95, 0)));
    store.insert_task(task(10, 1, 10, 5));
    store
}

#[rstest]
fn completion_levels_up_owner_and_marks_task(mut store: MemoryStore) {
    let done = complete_and_commit(store.begin(), 10, NOW).unwrap();

    let owner = store.user(1).unwrap();
    assert_eq!(owner.progression, Progression::new(2, 5, 5));
    let stored = store.task(10).unwrap();
    assert!(stored.is_completed);
    assert_eq!(stored.completed_at, Some(NOW));
    assert_eq!(stored.streak_count, 0);
    assert_eq!(done.report.level_change.levels_gained(), 1);
    assert_eq!(store.commits(), 1);
}

#[rstest]
fn completed_parent_extends_child_streak(mut store: MemoryStore) {
    let mut parent = task(20, 1, 0, 0);
    parent.is_completed = true;
    parent.completed_at = Some(NOW - 1);
    parent.streak_count = 3;
    let mut child = task(21, 1, 10, 5);
    child.parent_id = Some(20);
    store.insert_task(parent);
    store.insert_task(child);

    let done = complete_and_commit(store.begin(), 21, NOW).unwrap();

    assert_eq!(store.task(21).unwrap().streak_count, 4);
    assert!(done.report.streak_extended);
    assert_eq!(store.task(20).unwrap().streak_count, 3);
}

#[rstest]
fn missing_parent_still_completes(mut store: MemoryStore) {
    let mut orphan = task(30, 1, 10, 5);
    orphan.parent_id = Some(404);
    orphan.streak_count = 2;
    store.insert_task(orphan);

    complete_and_commit(store.begin(), 30, NOW).unwrap();

    let stored = store.task(30).unwrap();
    assert!(stored.is_completed);
    assert_eq!(stored.streak_count, 2);
}

#[rstest]
fn second_completion_is_rejected_and_pays_nothing(mut store: MemoryStore) {
    complete_and_commit(store.begin(), 10, NOW).unwrap();
    let after_first = store.user(1).unwrap().progression;

    let err = complete_and_commit(store.begin(), 10, NOW + 1).unwrap_err();

    assert!(matches!(err, CompletionError::AlreadyCompleted(10)));
    assert_eq!(err.code(), ErrorCode::AlreadyCompleted);
    assert_eq!(store.user(1).unwrap().progression, after_first);
    assert_eq!(store.task(10).unwrap().completed_at, Some(NOW));
    assert_eq!(store.commits(), 1);
}

#[rstest]
fn same_task_twice_in_one_unit_is_rejected(mut store: MemoryStore) {
    let mut uow = store.begin();

    complete_in(&mut uow, 10, NOW).unwrap();
    let err = complete_in(&mut uow, 10, NOW).unwrap_err();

    assert!(matches!(err, CompletionError::AlreadyCompleted(10)));
}

#[rstest]
fn failed_commit_leaves_store_untouched_and_retry_succeeds(mut store: MemoryStore) {
    let before_user = store.user(1).cloned();
    let before_task = store.task(10).cloned();
    store.fail_next_commit();

    let err = complete_and_commit(store.begin(), 10, NOW).unwrap_err();

    assert!(matches!(
        err,
        CompletionError::Persistence(StoreError::Commit(_))
    ));
    assert_eq!(store.user(1).cloned(), before_user);
    assert_eq!(store.task(10).cloned(), before_task);
    assert_eq!(store.commits(), 0);

    complete_and_commit(store.begin(), 10, NOW).unwrap();

    assert_eq!(store.user(1).unwrap().progression, Progression::new(2, 5, 5));
    assert_eq!(store.commits(), 1);
}

#[rstest]
fn dropped_unit_of_work_discards_staged_changes(mut store: MemoryStore) {
    {
        let mut uow = store.begin();
        complete_in(&mut uow, 10, NOW).unwrap();
    }

    assert!(!store.task(10).unwrap().is_completed);
    assert_eq!(store.user(1).unwrap().progression, Progression::new(1, 95, 0));
}

#[rstest]
fn unknown_task_is_reported(mut store: MemoryStore) {
    let err = complete_and_commit(store.begin(), 999, NOW).unwrap_err();

    assert!(matches!(err, CompletionError::TaskNotFound(999)));
}

#[rstest]
fn missing_owner_is_reported(mut store: MemoryStore) {
    store.insert_task(task(40, 7, 10, 5));

    let err = complete_and_commit(store.begin(), 40, NOW).unwrap_err();

    assert!(matches!(
        err,
        CompletionError::OwnerNotFound {
            task_id: 40,
            owner_id: 7
        }
    ));
    assert!(!store.task(40).unwrap().is_completed);
}
