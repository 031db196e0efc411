use chrono::{Datelike, NaiveDate};

use study_utils::{Familiarity, Word};

use crate::ledger::LearningStats;

/// One day of a study-trend series.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// Minutes studied that day.
    pub duration: u32,
    pub words: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FamiliarityBucket {
    pub level: Familiarity,
    pub count: u32,
}

fn trend_point(stats: &LearningStats, date: NaiveDate) -> TrendPoint {
    let record = stats.daily_history.get(&date);
    TrendPoint {
        date,
        duration: record.map(|r| r.study_duration).unwrap_or(0),
        words: record.map(|r| r.words_learned).unwrap_or(0),
    }
}

/// The Monday-to-Sunday week containing `today`, zero-filled.
pub fn weekly_study_trend(stats: &LearningStats, today: NaiveDate) -> Vec<TrendPoint> {
    let monday = today - chrono::Duration::days(today.weekday().num_days_from_monday() as i64);
    (0..7)
        .map(|offset| trend_point(stats, monday + chrono::Duration::days(offset)))
        .collect()
}

/// Every day of `today`'s month, zero-filled.
pub fn monthly_study_trend(stats: &LearningStats, today: NaiveDate) -> Vec<TrendPoint> {
    let first = today.with_day(1).unwrap_or(today);
    let days_in_month = (first + chrono::Months::new(1) - chrono::Duration::days(1)).day();
    (0..days_in_month as i64)
        .map(|offset| trend_point(stats, first + chrono::Duration::days(offset)))
        .collect()
}

/// Word counts per familiarity level, in level order.
pub fn familiarity_distribution(words: &[Word]) -> Vec<FamiliarityBucket> {
    let mut counts = [0u32; 4];
    for word in words {
        counts[word.familiarity as usize] += 1;
    }

    Familiarity::ALL
        .into_iter()
        .zip(counts)
        .map(|(level, count)| FamiliarityBucket { level, count })
        .collect()
}
