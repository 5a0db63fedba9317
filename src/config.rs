//! Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project-level config file, relative to the working directory.
pub const PROJECT_CONFIG: &str = "task-donegeon/config.yaml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub rewards: RewardsConfig,
}

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("task-donegeon/donegeon.db")
}

/// Rewards used when a task or achievement does not name its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardsConfig {
    #[serde(default = "default_task_experience")]
    pub task_experience: u64,

    #[serde(default = "default_task_gold")]
    pub task_gold: u64,

    #[serde(default = "default_achievement_experience")]
    pub achievement_experience: u64,

    #[serde(default = "default_achievement_gold")]
    pub achievement_gold: u64,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            task_experience: default_task_experience(),
            task_gold: default_task_gold(),
            achievement_experience: default_achievement_experience(),
            achievement_gold: default_achievement_gold(),
        }
    }
}

fn default_task_experience() -> u64 {
    10
}

fn default_task_gold() -> u64 {
    5
}

fn default_achievement_experience() -> u64 {
    50
}

fn default_achievement_gold() -> u64 {
    25
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Resolve configuration for the CLI.
    ///
    /// An explicit path must load. Otherwise the project file, then the user
    /// file, then defaults. Environment variables apply on top in every case.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::load(path)?,
            None => Self::load_or_default(),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Load configuration from default locations or return defaults.
    pub fn load_or_default() -> Self {
        let candidates = std::iter::once(PathBuf::from(PROJECT_CONFIG))
            .chain(user_config_path());

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load(&path) {
                Ok(config) => {
                    debug!(path = %path.display(), "loaded config");
                    return config;
                }
                Err(e) => debug!(path = %path.display(), error = %e, "skipping unreadable config"),
            }
        }

        Self::default()
    }

    /// Apply `TASK_DONEGEON_*` overrides. Values that do not parse are ignored.
    pub fn with_env_overrides<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = var("TASK_DONEGEON_DB_PATH") {
            self.database.path = PathBuf::from(db_path);
        }

        if let Some(xp) = var("TASK_DONEGEON_TASK_XP").and_then(|v| v.parse().ok()) {
            self.rewards.task_experience = xp;
        }

        if let Some(gold) = var("TASK_DONEGEON_TASK_GOLD").and_then(|v| v.parse().ok()) {
            self.rewards.task_gold = gold;
        }

        self
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.database.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// `~/.task-donegeon/config.yaml`, if there is a home directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".task-donegeon").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_rewards() {
        let config = Config::default();

        assert_eq!(config.rewards.task_experience, 10);
        assert_eq!(config.rewards.task_gold, 5);
        assert_eq!(config.rewards.achievement_experience, 50);
        assert_eq!(config.rewards.achievement_gold, 25);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "rewards:\n  task_experience: 40\n").unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.rewards.task_experience, 40);
        assert_eq!(config.rewards.task_gold, 5);
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn env_overrides_apply_and_bad_numbers_are_ignored() {
        let env: HashMap<&str, &str> = [
            ("TASK_DONEGEON_DB_PATH", "/tmp/hero.db"),
            ("TASK_DONEGEON_TASK_XP", "25"),
            ("TASK_DONEGEON_TASK_GOLD", "lots"),
        ]
        .into_iter()
        .collect();

        let config = Config::default().with_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/tmp/hero.db"));
        assert_eq!(config.rewards.task_experience, 25);
        assert_eq!(config.rewards.task_gold, 5);
    }

    #[test]
    fn ensure_db_dir_creates_parent() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.database.path = dir.path().join("nested").join("game.db");

        config.ensure_db_dir().unwrap();

        assert!(dir.path().join("nested").is_dir());
    }
}
