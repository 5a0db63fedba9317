//! Core types for Task Donegeon.

use crate::progression::{AchievementRequirements, Progression};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type TaskId = i64;
pub type CategoryId = i64;

/// A player. Owns its tasks, achievements and inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    #[serde(flatten)]
    pub progression: Progression,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            "critical" => Some(TaskPriority::Critical),
            _ => None,
        }
    }
}

/// How hard a task is. Informational; rewards are set explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TaskDifficulty {
    Trivial,
    Easy,
    #[default]
    Medium,
    Hard,
    Epic,
}

impl TaskDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskDifficulty::Trivial => "trivial",
            TaskDifficulty::Easy => "easy",
            TaskDifficulty::Medium => "medium",
            TaskDifficulty::Hard => "hard",
            TaskDifficulty::Epic => "epic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "trivial" => Some(TaskDifficulty::Trivial),
            "easy" => Some(TaskDifficulty::Easy),
            "medium" => Some(TaskDifficulty::Medium),
            "hard" => Some(TaskDifficulty::Hard),
            "epic" => Some(TaskDifficulty::Epic),
            _ => None,
        }
    }
}

/// A task on a player's list.
///
/// `parent_id` is a plain reference used for streak lookups; parents do not
/// own their subtasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub difficulty: TaskDifficulty,
    pub due_date: Option<i64>,
    pub category_id: Option<CategoryId>,
    pub parent_id: Option<TaskId>,

    // Completion is one-way; completed_at is set on the same transition.
    pub is_completed: bool,
    pub completed_at: Option<i64>,
    pub streak_count: u32,

    // Payout, fixed at creation
    pub experience_reward: u64,
    pub gold_reward: u64,

    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a task. Unset rewards fall back to configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<i64>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub difficulty: TaskDifficulty,
    pub experience_reward: Option<u64>,
    pub gold_reward: Option<u64>,
    pub parent_id: Option<TaskId>,
    pub category_id: Option<CategoryId>,
}

/// Partial update of a task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<i64>>,
    pub priority: Option<TaskPriority>,
    pub difficulty: Option<TaskDifficulty>,
    /// `Some(true)` on an incomplete task triggers completion and its rewards.
    pub is_completed: Option<bool>,
}

/// A task category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    /// Hex color, e.g. `#FF5733`.
    pub color: Option<String>,
    pub icon_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon_name: Option<String>,
}

/// A free-form tag on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTag {
    pub id: i64,
    pub task_id: TaskId,
    pub name: String,
}

/// An unlocked achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: i64,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub experience_reward: u64,
    pub gold_reward: u64,
    pub requirements: AchievementRequirements,
    pub unlocked_at: i64,
}

/// Input for granting an achievement. Unset rewards fall back to configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAchievement {
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub experience_reward: Option<u64>,
    pub gold_reward: Option<u64>,
    #[serde(default)]
    pub requirements: AchievementRequirements,
}

/// Kind of inventory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Weapon,
    Armor,
    Potion,
    Scroll,
    QuestItem,
    Cosmetic,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Weapon => "weapon",
            ItemType::Armor => "armor",
            ItemType::Potion => "potion",
            ItemType::Scroll => "scroll",
            ItemType::QuestItem => "quest_item",
            ItemType::Cosmetic => "cosmetic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "weapon" => Some(ItemType::Weapon),
            "armor" => Some(ItemType::Armor),
            "potion" => Some(ItemType::Potion),
            "scroll" => Some(ItemType::Scroll),
            "quest_item" => Some(ItemType::QuestItem),
            "cosmetic" => Some(ItemType::Cosmetic),
            _ => None,
        }
    }
}

/// An item in a player's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub item_type: ItemType,
    /// 1 (common) to 5 (legendary).
    pub rarity: u8,
    pub level_requirement: u32,
    pub stats: serde_json::Value,
    pub effects: serde_json::Value,
    pub quantity: u32,
    pub is_equipped: bool,
    pub acquired_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub item_type: ItemType,
    pub rarity: u8,
    pub level_requirement: u32,
    #[serde(default)]
    pub stats: serde_json::Value,
    #[serde(default)]
    pub effects: serde_json::Value,
    pub quantity: u32,
}
