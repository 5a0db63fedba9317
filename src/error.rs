//! Error types for the progression core and the storage layer around it.

use crate::types::{TaskId, UserId};
use serde::Serialize;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    InvalidFieldValue,

    // Not found errors
    UserNotFound,
    TaskNotFound,
    CategoryNotFound,
    ItemNotFound,
    TagNotFound,

    // Conflict errors
    AlreadyExists,
    AlreadyCompleted,
    OwnerMismatch,
    NotOwner,
    LevelTooLow,
    RequirementsNotMet,

    // Internal errors
    DatabaseError,
    InternalError,
}

/// Failures of the storage behind a unit of work.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("commit failed: {0}")]
    Commit(String),
}

impl StoreError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::DatabaseError
    }
}

/// Reasons a task completion can be refused or fail.
///
/// A missing parent is deliberately absent: it only skips the streak step.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("task {0} is already completed")]
    AlreadyCompleted(TaskId),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("owner {owner_id} of task {task_id} not found")]
    OwnerNotFound { task_id: TaskId, owner_id: UserId },

    #[error("task {task_id} belongs to user {owner_id}, not user {user_id}")]
    OwnerMismatch {
        task_id: TaskId,
        owner_id: UserId,
        user_id: UserId,
    },

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl CompletionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CompletionError::AlreadyCompleted(_) => ErrorCode::AlreadyCompleted,
            CompletionError::TaskNotFound(_) => ErrorCode::TaskNotFound,
            CompletionError::OwnerNotFound { .. } => ErrorCode::UserNotFound,
            CompletionError::OwnerMismatch { .. } => ErrorCode::OwnerMismatch,
            CompletionError::Persistence(e) => e.code(),
        }
    }
}

/// Rule violations raised by the CRUD layer.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("category not found: {0}")]
    CategoryNotFound(i64),

    #[error("inventory item not found: {0}")]
    ItemNotFound(i64),

    #[error("tag not found: {0}")]
    TagNotFound(i64),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("user {user_id} does not own {what}")]
    NotOwner { user_id: UserId, what: String },

    #[error("user level {level} is too low for this item (requires level {required})")]
    LevelTooLow { level: u32, required: u32 },

    #[error("requirements not met: {}", .0.join(", "))]
    RequirementsNotMet(Vec<String>),
}

impl GameError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        GameError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            GameError::InvalidField { .. } => ErrorCode::InvalidFieldValue,
            GameError::UserNotFound(_) => ErrorCode::UserNotFound,
            GameError::TaskNotFound(_) => ErrorCode::TaskNotFound,
            GameError::CategoryNotFound(_) => ErrorCode::CategoryNotFound,
            GameError::ItemNotFound(_) => ErrorCode::ItemNotFound,
            GameError::TagNotFound(_) => ErrorCode::TagNotFound,
            GameError::AlreadyExists(_) => ErrorCode::AlreadyExists,
            GameError::NotOwner { .. } => ErrorCode::NotOwner,
            GameError::LevelTooLow { .. } => ErrorCode::LevelTooLow,
            GameError::RequirementsNotMet(_) => ErrorCode::RequirementsNotMet,
        }
    }
}

/// Structured error for CLI output.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

// Application code passes errors around as anyhow; recover the code by downcasting.
impl From<&anyhow::Error> for ErrorReport {
    fn from(err: &anyhow::Error) -> Self {
        let code = if let Some(e) = err.downcast_ref::<GameError>() {
            e.code()
        } else if let Some(e) = err.downcast_ref::<CompletionError>() {
            e.code()
        } else if let Some(e) = err.downcast_ref::<StoreError>() {
            e.code()
        } else if err.downcast_ref::<rusqlite::Error>().is_some() {
            ErrorCode::DatabaseError
        } else {
            ErrorCode::InternalError
        };

        Self {
            code,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_recovers_code_through_anyhow() {
        let err: anyhow::Error = CompletionError::AlreadyCompleted(7).into();

        let report = ErrorReport::from(&err);

        assert_eq!(report.code, ErrorCode::AlreadyCompleted);
        assert_eq!(report.message, "task 7 is already completed");
    }

    #[test]
    fn unknown_errors_are_internal() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(ErrorReport::from(&err).code, ErrorCode::InternalError);
    }

    #[test]
    fn codes_serialize_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::RequirementsNotMet).unwrap();
        assert_eq!(json, "\"REQUIREMENTS_NOT_MET\"");
    }

    #[test]
    fn requirements_message_lists_each_condition() {
        let err = GameError::RequirementsNotMet(vec!["level 3 (have 1)".into(), "5 gold (have 0)".into()]);
        assert_eq!(
            err.to_string(),
            "requirements not met: level 3 (have 1), 5 gold (have 0)"
        );
    }
}
