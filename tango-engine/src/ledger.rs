use std::collections::BTreeMap;

use chrono::NaiveDate;

use study_utils::TodayProgress;

/// One calendar day of learning activity. `completed` is derived by
/// [`record_progress`], never set directly.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    pub words_learned: u32,
    pub diary_written: bool,
    pub completed: bool,
    pub study_duration: u32,
}

/// The persisted aggregate: streak counters plus the full per-day history.
/// `daily_history` keys serialize as `YYYY-MM-DD`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_date: Option<NaiveDate>,
    #[serde(default)]
    pub daily_history: BTreeMap<NaiveDate, DailyRecord>,
}

/// Writes today's progress into the ledger and recomputes the day's
/// `completed` flag. Returns that flag so the caller can cascade the
/// streak recompute. Re-invocation with the same progress converges.
pub fn record_progress(
    stats: &mut LearningStats,
    progress: &TodayProgress,
    today: NaiveDate,
) -> bool {
    let record = stats.daily_history.entry(today).or_default();
    record.words_learned = progress.done_word_count;
    record.diary_written = progress.diary_done;
    record.completed =
        progress.done_word_count >= progress.today_word_count && progress.diary_done;

    stats.last_active_date = Some(today);
    record.completed
}

/// Adds a study session's minutes to today's record. Minutes accumulate
/// across sessions; a zero delta is the caller's mistake and is ignored.
pub fn record_study_time(stats: &mut LearningStats, minutes: u32, today: NaiveDate) {
    if minutes == 0 {
        return;
    }
    let record = stats.daily_history.entry(today).or_default();
    record.study_duration += minutes;
}
