//! Output formatting utilities for markdown and JSON.

use crate::completion::CompletedTask;
use crate::types::{Achievement, Category, InventoryItem, Task, User};
use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

/// Pretty JSON for any serializable value.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Render a millisecond timestamp as RFC 3339, or the raw number if out of range.
pub fn format_timestamp(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| ms.to_string())
}

/// Character sheet: identity and progression.
pub fn format_user_markdown(user: &User) -> String {
    let p = &user.progression;
    let mut md = String::new();

    md.push_str(&format!("## {} (`{}`)\n", user.username, user.id));
    md.push_str(&format!("- **name**: {} {}\n", user.first_name, user.last_name));
    md.push_str(&format!("- **level**: {}\n", p.level));
    md.push_str(&format!(
        "- **experience**: {} / {} ({} to next level)\n",
        p.experience_points,
        p.threshold(),
        p.experience_to_next_level()
    ));
    md.push_str(&format!("- **lifetime experience**: {}\n", p.total_experience()));
    md.push_str(&format!("- **gold**: {}\n", p.gold));

    if !user.is_active {
        md.push_str("- **inactive**\n");
    }

    md
}

/// Format a single task as markdown.
pub fn format_task_markdown(task: &Task) -> String {
    let mut md = String::new();

    let check = if task.is_completed { "x" } else { " " };
    md.push_str(&format!("## [{}] {}\n", check, task.title));
    md.push_str(&format!("- **id**: `{}`\n", task.id));
    md.push_str(&format!("- **priority**: {}\n", task.priority.as_str()));
    md.push_str(&format!("- **difficulty**: {}\n", task.difficulty.as_str()));
    md.push_str(&format!(
        "- **reward**: {} xp, {} gold\n",
        task.experience_reward, task.gold_reward
    ));

    if let Some(due) = task.due_date {
        md.push_str(&format!("- **due**: {}\n", format_timestamp(due)));
    }

    if let Some(parent_id) = task.parent_id {
        md.push_str(&format!("- **parent_id**: `{}`\n", parent_id));
    }

    if let Some(category_id) = task.category_id {
        md.push_str(&format!("- **category_id**: `{}`\n", category_id));
    }

    if let Some(done) = task.completed_at {
        md.push_str(&format!("- **completed**: {}\n", format_timestamp(done)));
    }

    if task.streak_count > 0 {
        md.push_str(&format!("- **streak**: {}\n", task.streak_count));
    }

    if let Some(ref desc) = task.description {
        md.push_str("\n### Description\n");
        md.push_str(desc);
        md.push('\n');
    }

    md
}

/// Format a list of tasks as a compact markdown checklist.
pub fn format_tasks_markdown(title: &str, tasks: &[Task]) -> String {
    let mut md = format!("# {} ({})\n\n", title, tasks.len());

    if tasks.is_empty() {
        md.push_str("_Nothing here._\n");
        return md;
    }

    for task in tasks {
        let check = if task.is_completed { "x" } else { " " };
        md.push_str(&format!("- [{}] `{}` {}", check, task.id, task.title));
        if let Some(due) = task.due_date {
            md.push_str(&format!(" (due {})", format_timestamp(due)));
        }
        md.push_str(&format!(
            " [{}xp/{}g]\n",
            task.experience_reward, task.gold_reward
        ));
    }

    md
}

/// Summary of a completion and what it paid out.
pub fn format_completion_markdown(done: &CompletedTask) -> String {
    let r = &done.report;
    let mut md = format!("# Quest complete: {}\n\n", done.task.title);

    md.push_str(&format!("- **experience**: +{}\n", r.experience_awarded));
    md.push_str(&format!("- **gold**: +{}\n", r.gold_awarded));
    if r.streak_extended {
        md.push_str(&format!("- **streak**: {}\n", r.streak_count));
    }
    if r.level_change.leveled_up() {
        md.push_str(&format!(
            "- **level up**: {} -> {}\n",
            r.level_change.from, r.level_change.to
        ));
    }

    md.push('\n');
    md.push_str(&format_user_markdown(&done.owner));
    md
}

pub fn format_categories_markdown(categories: &[Category]) -> String {
    let mut md = format!("# Categories ({})\n\n", categories.len());
    for c in categories {
        md.push_str(&format!("- `{}` **{}**", c.id, c.name));
        if let Some(ref color) = c.color {
            md.push_str(&format!(" {}", color));
        }
        if let Some(ref icon) = c.icon_name {
            md.push_str(&format!(" :{}:", icon));
        }
        md.push('\n');
    }
    md
}

pub fn format_achievements_markdown(achievements: &[Achievement]) -> String {
    let mut md = format!("# Achievements ({})\n\n", achievements.len());
    for a in achievements {
        md.push_str(&format!(
            "- **{}** +{}xp +{}g, unlocked {}\n",
            a.name,
            a.experience_reward,
            a.gold_reward,
            format_timestamp(a.unlocked_at)
        ));
    }
    md
}

pub fn format_inventory_markdown(items: &[InventoryItem]) -> String {
    let mut md = format!("# Inventory ({})\n\n", items.len());
    for item in items {
        let equipped = if item.is_equipped { " (equipped)" } else { "" };
        md.push_str(&format!(
            "- `{}` {} x{} [{}, rarity {}]{}\n",
            item.id,
            item.name,
            item.quantity,
            item.item_type.as_str(),
            item.rarity,
            equipped
        ));
    }
    md
}
