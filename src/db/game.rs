//! Categories, tags, achievements and inventory.

use super::tasks::get_task_internal;
use super::users::{completed_task_count_internal, get_user_internal, save_progression};
use super::{Database, json_column, now_ms, text_enum};
use crate::config::RewardsConfig;
use crate::error::GameError;
use crate::progression::LevelChange;
use crate::types::{
    Achievement, Category, InventoryItem, ItemType, NewAchievement, NewCategory,
    NewInventoryItem, TaskId, TaskTag, User, UserId,
};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use serde_json::Value;
use tracing::info;

/// Categories every fresh database starts with: (name, color, icon).
pub const DEFAULT_CATEGORIES: [(&str, &str, &str); 4] = [
    ("Daily Quests", "#FF5733", "sun"),
    ("Weekly Missions", "#33FF57", "calendar"),
    ("Epic Quests", "#3357FF", "star"),
    ("Side Quests", "#FF33F5", "bookmark"),
];

fn parse_category_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        color: row.get("color")?,
        icon_name: row.get("icon_name")?,
    })
}

fn parse_tag_row(row: &Row) -> rusqlite::Result<TaskTag> {
    Ok(TaskTag {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        name: row.get("name")?,
    })
}

fn parse_achievement_row(row: &Row) -> rusqlite::Result<Achievement> {
    Ok(Achievement {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        icon_url: row.get("icon_url")?,
        experience_reward: row.get("experience_reward")?,
        gold_reward: row.get("gold_reward")?,
        requirements: json_column(row, "requirements")?,
        unlocked_at: row.get("unlocked_at")?,
    })
}

fn parse_item_row(row: &Row) -> rusqlite::Result<InventoryItem> {
    Ok(InventoryItem {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        icon_url: row.get("icon_url")?,
        item_type: text_enum(row, "item_type", ItemType::parse)?,
        rarity: row.get("rarity")?,
        level_requirement: row.get("level_requirement")?,
        stats: json_column(row, "stats")?,
        effects: json_column(row, "effects")?,
        quantity: row.get("quantity")?,
        is_equipped: row.get("is_equipped")?,
        acquired_at: row.get("acquired_at")?,
    })
}

fn get_item_internal(conn: &Connection, item_id: i64) -> rusqlite::Result<Option<InventoryItem>> {
    conn.query_row(
        "SELECT * FROM inventory_items WHERE id = ?1",
        params![item_id],
        parse_item_row,
    )
    .optional()
}

fn check_name(field: &'static str, name: &str, max: usize) -> Result<(), GameError> {
    let len = name.trim().chars().count();
    if len == 0 || len > max {
        return Err(GameError::invalid(field, format!("must be 1-{} characters", max)));
    }
    Ok(())
}

fn check_color(color: &str) -> Result<(), GameError> {
    let hex = color.strip_prefix('#').unwrap_or("");
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GameError::invalid("color", "must look like #RRGGBB"));
    }
    Ok(())
}

/// JSON null is stored as an empty object.
fn json_object_text(value: &Value) -> Result<String> {
    if value.is_null() {
        return Ok("{}".to_string());
    }
    Ok(serde_json::to_string(value)?)
}

impl Database {
    // =========================================================================
    // Categories
    // =========================================================================

    pub fn create_category(&self, input: NewCategory) -> Result<Category> {
        check_name("name", &input.name, 50)?;
        if let Some(ref color) = input.color {
            check_color(color)?;
        }
        let name = input.name.trim().to_string();

        self.with_conn(|conn| {
            // The UNIQUE constraint decides, so racing creators both get a clean answer.
            let inserted = conn.execute(
                "INSERT INTO categories (name, description, color, icon_name) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(name) DO NOTHING",
                params![&name, &input.description, &input.color, &input.icon_name],
            )?;
            if inserted == 0 {
                return Err(GameError::AlreadyExists(format!("category '{}'", name)).into());
            }

            Ok(Category {
                id: conn.last_insert_rowid(),
                name,
                description: input.description,
                color: input.color,
                icon_name: input.icon_name,
            })
        })
    }

    pub fn list_categories(&self) -> Result<Vec<Category>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM categories ORDER BY id")?;
            let categories = stmt
                .query_map([], parse_category_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(categories)
        })
    }

    /// Insert any missing default categories. Returns how many were added.
    pub fn seed_default_categories(&self) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut added = 0;
            for (name, color, icon) in DEFAULT_CATEGORIES {
                added += tx.execute(
                    "INSERT OR IGNORE INTO categories (name, color, icon_name) VALUES (?1, ?2, ?3)",
                    params![name, color, icon],
                )?;
            }
            tx.commit()?;

            if added > 0 {
                info!(added, "seeded default categories");
            }
            Ok(added)
        })
    }

    // =========================================================================
    // Task tags
    // =========================================================================

    pub fn add_tag(&self, task_id: TaskId, user_id: UserId, name: &str) -> Result<TaskTag> {
        check_name("name", name, 30)?;
        let name = name.trim().to_string();

        self.with_conn(|conn| {
            let task = get_task_internal(conn, task_id)?.ok_or(GameError::TaskNotFound(task_id))?;
            if task.owner_id != user_id {
                return Err(GameError::NotOwner {
                    user_id,
                    what: format!("task {}", task_id),
                }
                .into());
            }

            conn.execute(
                "INSERT INTO task_tags (task_id, name) VALUES (?1, ?2)",
                params![task_id, &name],
            )?;

            Ok(TaskTag {
                id: conn.last_insert_rowid(),
                task_id,
                name,
            })
        })
    }

    pub fn task_tags(&self, task_id: TaskId) -> Result<Vec<TaskTag>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM task_tags WHERE task_id = ?1 ORDER BY id")?;
            let tags = stmt
                .query_map(params![task_id], parse_tag_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tags)
        })
    }

    /// Delete a tag from one of `user_id`'s tasks. Returns the deleted tag.
    pub fn delete_tag(&self, tag_id: i64, user_id: UserId) -> Result<TaskTag> {
        self.with_conn(|conn| {
            let (tag, owner_id): (TaskTag, UserId) = conn
                .query_row(
                    "SELECT g.*, t.owner_id FROM task_tags g
                     INNER JOIN tasks t ON t.id = g.task_id
                     WHERE g.id = ?1",
                    params![tag_id],
                    |row| Ok((parse_tag_row(row)?, row.get("owner_id")?)),
                )
                .optional()?
                .ok_or(GameError::TagNotFound(tag_id))?;
            if owner_id != user_id {
                return Err(GameError::NotOwner {
                    user_id,
                    what: format!("tag {}", tag_id),
                }
                .into());
            }

            conn.execute("DELETE FROM task_tags WHERE id = ?1", params![tag_id])?;
            Ok(tag)
        })
    }

    // =========================================================================
    // Achievements
    // =========================================================================

    /// Unlock an achievement for `user_id` and pay out its rewards.
    ///
    /// Requirements are checked against the stored user; the insert and the
    /// reward share one transaction.
    pub fn grant_achievement(
        &self,
        user_id: UserId,
        input: NewAchievement,
        rewards: &RewardsConfig,
    ) -> Result<(Achievement, User, LevelChange)> {
        check_name("name", &input.name, 100)?;
        let now = now_ms();
        let experience_reward = input
            .experience_reward
            .unwrap_or(rewards.achievement_experience);
        let gold_reward = input.gold_reward.unwrap_or(rewards.achievement_gold);

        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let mut user = get_user_internal(&tx, user_id)?.ok_or(GameError::UserNotFound(user_id))?;
            if !input.requirements.is_empty() {
                let completed = completed_task_count_internal(&tx, user_id)?;
                let missing = input.requirements.unmet(&user.progression, completed);
                if !missing.is_empty() {
                    return Err(GameError::RequirementsNotMet(missing).into());
                }
            }

            let name = input.name.trim().to_string();
            tx.execute(
                "INSERT INTO achievements (
                    user_id, name, description, icon_url, experience_reward, gold_reward,
                    requirements, unlocked_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user_id,
                    &name,
                    &input.description,
                    &input.icon_url,
                    experience_reward,
                    gold_reward,
                    serde_json::to_string(&input.requirements)?,
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();

            let change = user.progression.award_experience(experience_reward);
            user.progression.award_gold(gold_reward);
            user.updated_at = now;
            save_progression(&tx, &user)?;

            tx.commit()?;

            info!(user_id, achievement = %name, xp = experience_reward, gold = gold_reward, "achievement unlocked");

            let achievement = Achievement {
                id,
                user_id,
                name,
                description: input.description,
                icon_url: input.icon_url,
                experience_reward,
                gold_reward,
                requirements: input.requirements,
                unlocked_at: now,
            };
            Ok((achievement, user, change))
        })
    }

    pub fn list_achievements(&self, user_id: UserId) -> Result<Vec<Achievement>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM achievements WHERE user_id = ?1 ORDER BY unlocked_at, id")?;
            let achievements = stmt
                .query_map(params![user_id], parse_achievement_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(achievements)
        })
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    /// Give `user_id` an item. Refused while the user is below the item's level requirement.
    pub fn add_inventory_item(&self, user_id: UserId, input: NewInventoryItem) -> Result<InventoryItem> {
        check_name("name", &input.name, 100)?;
        if !(1..=5).contains(&input.rarity) {
            return Err(GameError::invalid("rarity", "must be between 1 and 5").into());
        }
        let now = now_ms();
        let stats_json = json_object_text(&input.stats)?;
        let effects_json = json_object_text(&input.effects)?;

        self.with_conn(|conn| {
            let user = get_user_internal(conn, user_id)?.ok_or(GameError::UserNotFound(user_id))?;
            if user.progression.level < input.level_requirement {
                return Err(GameError::LevelTooLow {
                    level: user.progression.level,
                    required: input.level_requirement,
                }
                .into());
            }

            let name = input.name.trim().to_string();
            conn.execute(
                "INSERT INTO inventory_items (
                    owner_id, name, description, icon_url, item_type, rarity, level_requirement,
                    stats, effects, quantity, is_equipped, acquired_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, ?11)",
                params![
                    user_id,
                    &name,
                    &input.description,
                    &input.icon_url,
                    input.item_type.as_str(),
                    input.rarity,
                    input.level_requirement,
                    &stats_json,
                    &effects_json,
                    input.quantity,
                    now,
                ],
            )?;

            Ok(InventoryItem {
                id: conn.last_insert_rowid(),
                owner_id: user_id,
                name,
                description: input.description,
                icon_url: input.icon_url,
                item_type: input.item_type,
                rarity: input.rarity,
                level_requirement: input.level_requirement,
                stats: serde_json::from_str(&stats_json)?,
                effects: serde_json::from_str(&effects_json)?,
                quantity: input.quantity,
                is_equipped: false,
                acquired_at: now,
            })
        })
    }

    /// Change quantity or equipped state of one of `user_id`'s items.
    pub fn update_inventory_item(
        &self,
        item_id: i64,
        user_id: UserId,
        quantity: Option<u32>,
        is_equipped: Option<bool>,
    ) -> Result<InventoryItem> {
        self.with_conn(|conn| {
            let item = get_item_internal(conn, item_id)?.ok_or(GameError::ItemNotFound(item_id))?;
            if item.owner_id != user_id {
                return Err(GameError::NotOwner {
                    user_id,
                    what: format!("item {}", item_id),
                }
                .into());
            }

            let quantity = quantity.unwrap_or(item.quantity);
            let is_equipped = is_equipped.unwrap_or(item.is_equipped);
            conn.execute(
                "UPDATE inventory_items SET quantity = ?1, is_equipped = ?2 WHERE id = ?3",
                params![quantity, is_equipped, item_id],
            )?;

            Ok(InventoryItem {
                quantity,
                is_equipped,
                ..item
            })
        })
    }

    pub fn list_inventory(&self, user_id: UserId) -> Result<Vec<InventoryItem>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM inventory_items WHERE owner_id = ?1 ORDER BY id")?;
            let items = stmt
                .query_map(params![user_id], parse_item_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(items)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_must_be_hex() {
        assert!(check_color("#FF5733").is_ok());
        assert!(check_color("FF5733").is_err());
        assert!(check_color("#GG5733").is_err());
        assert!(check_color("#FFF").is_err());
    }

    #[test]
    fn null_json_becomes_empty_object() {
        assert_eq!(json_object_text(&Value::Null).unwrap(), "{}");
        assert_eq!(
            json_object_text(&serde_json::json!({"atk": 3})).unwrap(),
            "{\"atk\":3}"
        );
    }
}
