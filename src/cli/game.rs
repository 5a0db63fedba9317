//! Category, achievement and inventory subcommands.

use super::parse_json;
use crate::progression::AchievementRequirements;
use crate::types::{ItemType, NewAchievement, NewInventoryItem};
use clap::{ArgAction, Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    /// Create a category
    Create {
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// Hex color such as #FF5733
        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        icon: Option<String>,
    },

    /// List categories
    List,

    /// Add any missing default categories
    Seed,
}

#[derive(Subcommand, Debug)]
pub enum AchievementCommand {
    /// Unlock an achievement, paying out its rewards
    Grant(GrantAchievementArgs),

    /// List a player's achievements
    List {
        #[arg(long)]
        user: i64,
    },
}

#[derive(Args, Debug)]
pub struct GrantAchievementArgs {
    #[arg(long)]
    pub user: i64,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub icon_url: Option<String>,

    /// Experience reward (default from config)
    #[arg(long)]
    pub xp: Option<u64>,

    /// Gold reward (default from config)
    #[arg(long)]
    pub gold: Option<u64>,

    #[arg(long)]
    pub min_level: Option<u32>,

    #[arg(long)]
    pub min_completed_tasks: Option<u64>,

    #[arg(long)]
    pub min_gold: Option<u64>,
}

impl From<GrantAchievementArgs> for NewAchievement {
    fn from(args: GrantAchievementArgs) -> Self {
        NewAchievement {
            name: args.name,
            description: args.description,
            icon_url: args.icon_url,
            experience_reward: args.xp,
            gold_reward: args.gold,
            requirements: AchievementRequirements {
                min_level: args.min_level,
                min_completed_tasks: args.min_completed_tasks,
                min_gold: args.min_gold,
            },
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum InventoryCommand {
    /// Give a player an item
    Add(AddItemArgs),

    /// Change an item's quantity or equipped state
    Update {
        item_id: i64,

        /// Acting user; must own the item
        #[arg(long)]
        user: i64,

        #[arg(long)]
        quantity: Option<u32>,

        #[arg(long, action = ArgAction::Set)]
        equipped: Option<bool>,
    },

    /// List a player's items
    List {
        #[arg(long)]
        user: i64,
    },
}

#[derive(Args, Debug)]
pub struct AddItemArgs {
    #[arg(long)]
    pub user: i64,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub icon_url: Option<String>,

    #[arg(long = "type", value_enum)]
    pub item_type: ItemType,

    /// 1 (common) to 5 (legendary)
    #[arg(long, default_value_t = 1)]
    pub rarity: u8,

    #[arg(long, default_value_t = 1)]
    pub level_requirement: u32,

    /// JSON object, e.g. '{"attack": 3}'
    #[arg(long, value_parser = parse_json)]
    pub stats: Option<serde_json::Value>,

    #[arg(long, value_parser = parse_json)]
    pub effects: Option<serde_json::Value>,

    #[arg(long, default_value_t = 1)]
    pub quantity: u32,
}

impl From<AddItemArgs> for NewInventoryItem {
    fn from(args: AddItemArgs) -> Self {
        NewInventoryItem {
            name: args.name,
            description: args.description,
            icon_url: args.icon_url,
            item_type: args.item_type,
            rarity: args.rarity,
            level_requirement: args.level_requirement,
            stats: args.stats.unwrap_or_default(),
            effects: args.effects.unwrap_or_default(),
            quantity: args.quantity,
        }
    }
}
