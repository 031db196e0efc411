use chrono::{DateTime, NaiveDate, Utc};

use study_utils::Achievement;

use crate::ledger::LearningStats;

/// How far back the streak walk looks. A personal streak beyond a year is
/// capped rather than walked further.
const STREAK_WINDOW_DAYS: i64 = 365;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreakSummary {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_days: u32,
}

/// Walks backward from `today` counting consecutive completed days.
///
/// An incomplete `today` does not break the run: the walk only stops at a
/// gap strictly before today, so a streak that ended yesterday still
/// counts while today is in progress.
pub fn recompute_streak(stats: &LearningStats, today: NaiveDate) -> StreakSummary {
    let mut current_streak = 0;
    for offset in 0..STREAK_WINDOW_DAYS {
        let date = today - chrono::Duration::days(offset);
        let completed = stats
            .daily_history
            .get(&date)
            .is_some_and(|record| record.completed);

        if completed {
            current_streak += 1;
        } else if offset > 0 {
            break;
        }
    }

    let total_days = stats
        .daily_history
        .values()
        .filter(|record| record.completed)
        .count() as u32;

    StreakSummary {
        current_streak,
        // Longest streak only ever ratchets up.
        longest_streak: stats.longest_streak.max(current_streak),
        total_days,
    }
}

/// Unlocks every still-locked achievement whose streak requirement is met,
/// stamping `unlocked_at` exactly once. Returns the ids unlocked by this
/// call.
pub fn check_achievements(
    current_streak: u32,
    achievements: &mut [Achievement],
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut unlocked = Vec::new();
    for achievement in achievements.iter_mut() {
        if achievement.unlocked_at.is_none() && current_streak >= achievement.requirement {
            achievement.unlocked_at = Some(now);
            unlocked.push(achievement.id.clone());
        }
    }
    unlocked
}
