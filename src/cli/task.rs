//! Task subcommands.

use super::{PageArgs, parse_due_date};
use crate::types::{NewTask, TaskDifficulty, TaskPriority, TaskUpdate};
use clap::{ArgAction, Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task to a player's list
    Create(CreateTaskArgs),

    /// Show one task
    Show {
        task_id: i64,
    },

    /// List a player's tasks
    List {
        #[arg(long)]
        owner: i64,

        /// Include completed tasks
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Incomplete tasks past their due date
    Overdue {
        #[arg(long)]
        owner: i64,
    },

    /// Incomplete tasks due today (UTC)
    Today {
        #[arg(long)]
        owner: i64,
    },

    /// Direct subtasks of a task
    Subtasks {
        task_id: i64,
    },

    /// A player's tasks in one category
    ByCategory {
        #[arg(long)]
        owner: i64,

        #[arg(long)]
        category: i64,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Edit a task; `--completed true` completes it and pays out
    Update(UpdateTaskArgs),

    /// Complete a task and collect its rewards
    Complete {
        task_id: i64,

        /// Acting user; must own the task
        #[arg(long)]
        user: i64,
    },

    /// Delete a task; subtasks lose their parent
    Delete {
        task_id: i64,

        #[arg(long)]
        user: i64,
    },

    /// Manage tags on a task
    #[command(subcommand)]
    Tag(TagCommand),
}

#[derive(Args, Debug)]
pub struct CreateTaskArgs {
    #[arg(long)]
    pub owner: i64,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub description: Option<String>,

    /// YYYY-MM-DD or RFC 3339
    #[arg(long, value_parser = parse_due_date)]
    pub due: Option<i64>,

    #[arg(long, value_enum, default_value_t = TaskPriority::Medium)]
    pub priority: TaskPriority,

    #[arg(long, value_enum, default_value_t = TaskDifficulty::Medium)]
    pub difficulty: TaskDifficulty,

    /// Experience reward (default from config)
    #[arg(long)]
    pub xp: Option<u64>,

    /// Gold reward (default from config)
    #[arg(long)]
    pub gold: Option<u64>,

    #[arg(long)]
    pub parent: Option<i64>,

    #[arg(long)]
    pub category: Option<i64>,
}

impl From<CreateTaskArgs> for NewTask {
    fn from(args: CreateTaskArgs) -> Self {
        NewTask {
            title: args.title,
            description: args.description,
            due_date: args.due,
            priority: args.priority,
            difficulty: args.difficulty,
            experience_reward: args.xp,
            gold_reward: args.gold,
            parent_id: args.parent,
            category_id: args.category,
        }
    }
}

#[derive(Args, Debug)]
pub struct UpdateTaskArgs {
    pub task_id: i64,

    /// Acting user; must own the task
    #[arg(long)]
    pub user: i64,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,

    #[arg(long)]
    pub clear_description: bool,

    #[arg(long, value_parser = parse_due_date, conflicts_with = "clear_due")]
    pub due: Option<i64>,

    #[arg(long)]
    pub clear_due: bool,

    #[arg(long, value_enum)]
    pub priority: Option<TaskPriority>,

    #[arg(long, value_enum)]
    pub difficulty: Option<TaskDifficulty>,

    #[arg(long, action = ArgAction::Set)]
    pub completed: Option<bool>,
}

impl UpdateTaskArgs {
    pub fn to_update(&self) -> TaskUpdate {
        let description = if self.clear_description {
            Some(None)
        } else {
            self.description.clone().map(Some)
        };
        let due_date = if self.clear_due {
            Some(None)
        } else {
            self.due.map(Some)
        };

        TaskUpdate {
            title: self.title.clone(),
            description,
            due_date,
            priority: self.priority,
            difficulty: self.difficulty,
            is_completed: self.completed,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// Tag a task
    Add {
        task_id: i64,

        name: String,

        #[arg(long)]
        user: i64,
    },

    /// List a task's tags
    List {
        task_id: i64,
    },

    /// Remove a tag
    Delete {
        tag_id: i64,

        #[arg(long)]
        user: i64,
    },
}
