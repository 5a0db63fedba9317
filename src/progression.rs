//! Experience, level and gold arithmetic.
//!
//! Everything here is pure: a [`Progression`] is mutated in place and the
//! caller decides when (and whether) to persist it. Task completion and
//! achievement grants both funnel their rewards through these functions.

use serde::{Deserialize, Serialize};

/// Experience required per level step. Level `n` needs `n * XP_PER_LEVEL`.
pub const XP_PER_LEVEL: u64 = 100;

/// Experience needed to advance from `level` to `level + 1`.
pub fn level_threshold(level: u32) -> u64 {
    u64::from(level) * XP_PER_LEVEL
}

/// A player's progression state.
///
/// After every award `experience_points < level_threshold(level)` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub level: u32,
    /// Experience accumulated within the current level.
    pub experience_points: u64,
    pub gold: u64,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level: 1,
            experience_points: 0,
            gold: 0,
        }
    }
}

/// Level before and after an experience award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
    pub from: u32,
    pub to: u32,
}

impl LevelChange {
    pub fn levels_gained(&self) -> u32 {
        self.to - self.from
    }

    pub fn leveled_up(&self) -> bool {
        self.to > self.from
    }
}

impl Progression {
    pub fn new(level: u32, experience_points: u64, gold: u64) -> Self {
        Self {
            level,
            experience_points,
            gold,
        }
    }

    /// Threshold for the current level.
    pub fn threshold(&self) -> u64 {
        level_threshold(self.level)
    }

    /// Add experience, carrying any excess across as many level-ups as it covers.
    ///
    /// An award that lands exactly on the threshold levels up once and leaves
    /// zero experience behind. Thresholds grow with the level, so the loop
    /// always terminates.
    pub fn award_experience(&mut self, amount: u64) -> LevelChange {
        let from = self.level;
        self.experience_points = self.experience_points.saturating_add(amount);

        let mut threshold = self.threshold();
        while self.experience_points >= threshold {
            self.level += 1;
            self.experience_points -= threshold;
            threshold = self.threshold();
        }

        LevelChange {
            from,
            to: self.level,
        }
    }

    /// Add gold. No thresholds apply.
    pub fn award_gold(&mut self, amount: u64) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Experience still missing before the next level-up.
    pub fn experience_to_next_level(&self) -> u64 {
        self.threshold().saturating_sub(self.experience_points)
    }

    /// Lifetime experience: every threshold already crossed plus the current remainder.
    ///
    /// Saturates at `u64::MAX` for levels no real player reaches.
    pub fn total_experience(&self) -> u64 {
        let crossed = u128::from(self.level.saturating_sub(1));
        let total = u128::from(XP_PER_LEVEL) * crossed * (crossed + 1) / 2
            + u128::from(self.experience_points);
        u64::try_from(total).unwrap_or(u64::MAX)
    }
}

/// Conditions an achievement places on the player who unlocks it.
///
/// Absent fields are not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_completed_tasks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_gold: Option<u64>,
}

impl AchievementRequirements {
    /// Human-readable list of the requirements `progression` does not meet.
    pub fn unmet(&self, progression: &Progression, completed_tasks: u64) -> Vec<String> {
        let mut missing = Vec::new();

        if let Some(level) = self.min_level {
            if progression.level < level {
                missing.push(format!("level {} (have {})", level, progression.level));
            }
        }
        if let Some(tasks) = self.min_completed_tasks {
            if completed_tasks < tasks {
                missing.push(format!("{} completed tasks (have {})", tasks, completed_tasks));
            }
        }
        if let Some(gold) = self.min_gold {
            if progression.gold < gold {
                missing.push(format!("{} gold (have {})", gold, progression.gold));
            }
        }

        missing
    }

    pub fn is_empty(&self) -> bool {
        self.min_level.is_none() && self.min_completed_tasks.is_none() && self.min_gold.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_scales_with_level() {
        assert_eq!(level_threshold(1), 100);
        assert_eq!(level_threshold(2), 200);
        assert_eq!(level_threshold(7), 700);
    }

    #[test]
    fn crossing_one_threshold_carries_remainder() {
        let mut p = Progression::new(1, 90, 0);

        let change = p.award_experience(20);

        assert_eq!(p.level, 2);
        assert_eq!(p.experience_points, 10);
        assert_eq!(change, LevelChange { from: 1, to: 2 });
    }

    #[test]
    fn large_award_crosses_several_thresholds() {
        let mut p = Progression::default();

        // 350 - 100 = 250, 250 - 200 = 50, 50 < 300
        let change = p.award_experience(350);

        assert_eq!(p.level, 3);
        assert_eq!(p.experience_points, 50);
        assert_eq!(change.levels_gained(), 2);
    }

    #[test]
    fn award_stops_below_the_next_threshold() {
        let mut p = Progression::default();

        p.award_experience(250);

        assert_eq!(p.level, 2);
        assert_eq!(p.experience_points, 150);
    }

    #[test]
    fn zero_award_changes_nothing() {
        let mut p = Progression::new(4, 123, 9);

        let change = p.award_experience(0);

        assert_eq!(p, Progression::new(4, 123, 9));
        assert!(!change.leveled_up());
    }

    #[test]
    fn exact_threshold_levels_up_once_with_zero_remainder() {
        let mut p = Progression::new(2, 150, 0);

        p.award_experience(50);

        assert_eq!(p.level, 3);
        assert_eq!(p.experience_points, 0);
    }

    #[test]
    fn gold_just_accumulates() {
        let mut p = Progression::new(5, 10, 40);

        p.award_gold(2);
        p.award_gold(0);

        assert_eq!(p.gold, 42);
        assert_eq!(p.level, 5);
        assert_eq!(p.experience_points, 10);
    }

    #[test]
    fn total_experience_counts_crossed_thresholds() {
        assert_eq!(Progression::default().total_experience(), 0);
        // 100 + 200 crossed, 50 carried.
        assert_eq!(Progression::new(3, 50, 0).total_experience(), 350);
    }

    #[test]
    fn total_experience_saturates_at_extreme_levels() {
        let p = Progression::new(u32::MAX, u64::MAX, 0);
        assert_eq!(p.total_experience(), u64::MAX);
        assert_eq!(Progression::new(u32::MAX, 0, 0).total_experience(), u64::MAX);
        assert_eq!(
            Progression::new(1_000_000, 7, 0).total_experience(),
            49_999_950_000_007
        );
    }

    #[test]
    fn experience_to_next_level() {
        assert_eq!(Progression::new(3, 50, 0).experience_to_next_level(), 250);
    }

    #[test]
    fn requirements_report_each_unmet_condition() {
        let req = AchievementRequirements {
            min_level: Some(3),
            min_completed_tasks: Some(10),
            min_gold: Some(5),
        };
        let p = Progression::new(2, 0, 5);

        let missing = req.unmet(&p, 4);

        assert_eq!(missing.len(), 2);
        assert!(missing[0].starts_with("level 3"));
        assert!(missing[1].starts_with("10 completed tasks"));
    }

    #[test]
    fn empty_requirements_are_always_met() {
        let req = AchievementRequirements::default();
        assert!(req.is_empty());
        assert!(req.unmet(&Progression::default(), 0).is_empty());
    }
}
