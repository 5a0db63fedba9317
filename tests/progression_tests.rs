//! Integration tests for experience and gold arithmetic.

use rstest::rstest;
use task_donegeon::progression::{LevelChange, Progression, level_threshold};

#[rstest]
#[case::single_crossing(1, 90, 20, 2, 10)]
#[case::stops_under_next_threshold(1, 0, 250, 2, 150)]
#[case::two_crossings(1, 0, 350, 3, 50)]
#[case::exact_threshold(1, 0, 100, 2, 0)]
#[case::zero_award(3, 42, 0, 3, 42)]
#[case::just_short(2, 0, 199, 2, 199)]
#[case::high_level(10, 999, 1, 11, 0)]
fn award_experience_scenarios(
    #[case] level: u32,
    #[case] xp: u64,
    #[case] award: u64,
    #[case] expected_level: u32,
    #[case] expected_xp: u64,
) {
    let mut p = Progression::new(level, xp, 0);

    let change = p.award_experience(award);

    assert_eq!(p.level, expected_level, "level after awarding {}", award);
    assert_eq!(p.experience_points, expected_xp, "xp after awarding {}", award);
    assert_eq!(
        change,
        LevelChange {
            from: level,
            to: expected_level
        }
    );
}

/// Every valid starting state stays below its threshold after any award.
#[test]
fn experience_stays_below_threshold_after_every_award() {
    for level in 1..=6u32 {
        for xp in (0..level_threshold(level)).step_by(7) {
            for award in [0, 1, 9, 99, 100, 101, 250, 777, 5_000] {
                let mut p = Progression::new(level, xp, 0);

                p.award_experience(award);

                assert!(
                    p.experience_points < level_threshold(p.level),
                    "level {} xp {} + {} left {:?}",
                    level,
                    xp,
                    award,
                    p
                );
                assert!(p.level >= level);
            }
        }
    }
}

/// Awarding in one call or split across two lands in the same place.
#[rstest]
#[case(1, 0, 250)]
#[case(1, 95, 10)]
#[case(2, 150, 1_000)]
#[case(4, 0, 399)]
fn split_awards_match_single_award(#[case] level: u32, #[case] xp: u64, #[case] total: u64) {
    let mut whole = Progression::new(level, xp, 0);
    whole.award_experience(total);

    for first in 0..=total {
        let mut split = Progression::new(level, xp, 0);
        split.award_experience(first);
        split.award_experience(total - first);

        assert_eq!(
            (split.level, split.experience_points),
            (whole.level, whole.experience_points),
            "split {} + {}",
            first,
            total - first
        );
    }
}

#[test]
fn lifetime_experience_is_preserved_across_awards() {
    let mut p = Progression::new(2, 30, 0);
    let before = p.total_experience();

    p.award_experience(612);

    assert_eq!(p.total_experience(), before + 612);
}

#[test]
fn gold_never_touches_level() {
    let mut p = Progression::new(1, 99, 0);

    p.award_gold(10_000);

    assert_eq!(p, Progression::new(1, 99, 10_000));
}
