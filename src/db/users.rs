//! User CRUD and standalone rewards.

use super::{Database, now_ms};
use crate::error::GameError;
use crate::progression::{LevelChange, Progression};
use crate::types::{NewUser, User, UserId};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use tracing::info;

pub fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        is_active: row.get("is_active")?,
        progression: Progression {
            level: row.get("level")?,
            experience_points: row.get("experience_points")?,
            gold: row.get("gold")?,
        },
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a user using an existing connection (avoids deadlock).
pub(crate) fn get_user_internal(conn: &Connection, user_id: UserId) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT * FROM users WHERE id = ?1",
        params![user_id],
        parse_user_row,
    )
    .optional()
}

/// Write the progression fields of `user` back.
pub(crate) fn save_progression(conn: &Connection, user: &User) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE users SET level = ?1, experience_points = ?2, gold = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            user.progression.level,
            user.progression.experience_points,
            user.progression.gold,
            user.updated_at,
            user.id,
        ],
    )
}

pub(crate) fn completed_task_count_internal(conn: &Connection, user_id: UserId) -> rusqlite::Result<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE owner_id = ?1 AND is_completed = 1",
        params![user_id],
        |row| row.get(0),
    )
}

fn validate_new_user(input: &NewUser) -> Result<(), GameError> {
    let len = input.username.chars().count();
    if !(3..=50).contains(&len) {
        return Err(GameError::invalid("username", "must be 3-50 characters"));
    }
    if input.username.chars().any(char::is_whitespace) {
        return Err(GameError::invalid("username", "must not contain whitespace"));
    }

    // Deliberately loose: something@something.something
    let valid_email = input
        .email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'));
    if !valid_email {
        return Err(GameError::invalid("email", "not a valid address"));
    }

    for (field, value) in [("first_name", &input.first_name), ("last_name", &input.last_name)] {
        let len = value.trim().chars().count();
        if len == 0 || len > 50 {
            return Err(GameError::invalid(field, "must be 1-50 characters"));
        }
    }

    Ok(())
}

impl Database {
    /// Create a user at level 1 with no experience or gold.
    pub fn create_user(&self, input: NewUser) -> Result<User> {
        validate_new_user(&input)?;
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let taken: Option<String> = tx
                .query_row(
                    "SELECT CASE WHEN username = ?1 THEN 'username' ELSE 'email' END
                     FROM users WHERE username = ?1 OR email = ?2 LIMIT 1",
                    params![&input.username, &input.email],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(field) = taken {
                return Err(GameError::AlreadyExists(field).into());
            }

            let progression = Progression::default();
            tx.execute(
                "INSERT INTO users (
                    username, email, first_name, last_name, is_active,
                    experience_points, level, gold, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, ?7, ?8, ?9)",
                params![
                    &input.username,
                    &input.email,
                    input.first_name.trim(),
                    input.last_name.trim(),
                    progression.experience_points,
                    progression.level,
                    progression.gold,
                    now,
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();

            tx.commit()?;

            info!(user_id = id, username = %input.username, "user created");

            Ok(User {
                id,
                username: input.username,
                email: input.email,
                first_name: input.first_name.trim().to_string(),
                last_name: input.last_name.trim().to_string(),
                is_active: true,
                progression,
                created_at: now,
                updated_at: now,
            })
        })
    }

    /// Get a user by ID.
    pub fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        self.with_conn(|conn| Ok(get_user_internal(conn, user_id)?))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT * FROM users WHERE username = ?1",
                    params![username],
                    parse_user_row,
                )
                .optional()?;
            Ok(user)
        })
    }

    pub fn list_users(&self, offset: u32, limit: u32) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM users ORDER BY id LIMIT ?1 OFFSET ?2")?;
            let users = stmt
                .query_map(params![limit, offset], parse_user_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users)
        })
    }

    /// Delete a user together with everything it owns. Returns the deleted user.
    pub fn delete_user(&self, user_id: UserId) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = get_user_internal(conn, user_id)?;
            if user.is_some() {
                conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
                info!(user_id, "user deleted");
            }
            Ok(user)
        })
    }

    pub fn completed_task_count(&self, user_id: UserId) -> Result<u64> {
        self.with_conn(|conn| Ok(completed_task_count_internal(conn, user_id)?))
    }

    /// Award experience and gold outside of task completion, in one transaction.
    pub fn award(&self, user_id: UserId, experience: u64, gold: u64) -> Result<(User, LevelChange)> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let mut user =
                get_user_internal(&tx, user_id)?.ok_or(GameError::UserNotFound(user_id))?;
            let change = user.progression.award_experience(experience);
            user.progression.award_gold(gold);
            user.updated_at = now;
            save_progression(&tx, &user)?;

            tx.commit()?;

            if change.leveled_up() {
                info!(user_id, from = change.from, to = change.to, "level up");
            }
            Ok((user, change))
        })
    }
}
