//! CLI command definitions for task-donegeon
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod game;
pub mod task;

use crate::format::OutputFormat;
use chrono::{DateTime, NaiveDate};
use clap::{Args, Parser, Subcommand};
use game::{AchievementCommand, CategoryCommand, InventoryCommand};
use std::path::PathBuf;
use task::TaskCommand;

/// Task Donegeon: a to-do list that pays out experience and gold
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database and seed the default categories
    Init,

    /// Manage players
    #[command(subcommand)]
    User(UserCommand),

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Manage task categories
    #[command(subcommand)]
    Category(CategoryCommand),

    /// Grant and list achievements
    #[command(subcommand)]
    Achievement(AchievementCommand),

    /// Manage a player's items
    #[command(subcommand)]
    Inventory(InventoryCommand),
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a new player at level 1
    Create(CreateUserArgs),

    /// Show a player's sheet, by id or username
    Show {
        user: String,
    },

    /// List players
    List(PageArgs),

    /// Delete a player and everything they own
    Delete {
        user_id: i64,
    },

    /// Award experience and gold directly
    Award {
        user_id: i64,

        #[arg(long, default_value_t = 0)]
        xp: u64,

        #[arg(long, default_value_t = 0)]
        gold: u64,
    },
}

#[derive(Args, Debug)]
pub struct CreateUserArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,
}

/// Pagination shared by list commands.
#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    #[arg(long, default_value_t = 50)]
    pub limit: u32,
}

/// Parse a due date given as RFC 3339 or as `YYYY-MM-DD` (midnight UTC).
/// Returns milliseconds since the epoch.
pub fn parse_due_date(s: &str) -> Result<i64, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .ok_or_else(|| format!("'{}' is not a date (use YYYY-MM-DD or RFC 3339)", s))
}

/// Parse a JSON argument such as item stats.
pub fn parse_json(s: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_dates_accept_plain_days_and_rfc3339() {
        assert_eq!(parse_due_date("1970-01-02"), Ok(86_400_000));
        assert_eq!(parse_due_date("1970-01-01T00:00:01Z"), Ok(1_000));
        assert_eq!(parse_due_date("1970-01-01T01:00:00+01:00"), Ok(0));
        assert!(parse_due_date("tomorrow").is_err());
    }

    #[test]
    fn parses_a_completion_command() {
        let cli = Cli::try_parse_from([
            "task-donegeon",
            "--format",
            "json",
            "task",
            "complete",
            "4",
            "--user",
            "1",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Command::Task(TaskCommand::Complete { task_id: 4, user: 1 })
        ));
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
