//! Task Donegeon library
//!
//! Progression arithmetic, the task completion orchestrator and the SQLite
//! store behind the `task-donegeon` binary.

pub mod cli;
pub mod completion;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod progression;
pub mod store;
pub mod types;
