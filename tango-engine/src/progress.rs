use chrono::NaiveDate;
use rustc_hash::FxHashSet;

use study_utils::{Familiarity, TodayProgress, Word};

/// Computes today's progress from the pinned deck and the diary state.
///
/// A word only counts as done once it was reviewed today AND left above
/// familiarity 0 — answering "don't know" keeps it pending.
pub fn compute_today_progress(
    words: &[Word],
    today_deck: &[String],
    diary_done: bool,
    today: NaiveDate,
) -> TodayProgress {
    let deck_ids: FxHashSet<&str> = today_deck.iter().map(String::as_str).collect();

    let done_word_count = words
        .iter()
        .filter(|word| deck_ids.contains(word.id.as_str()))
        .filter(|word| word.familiarity >= Familiarity::Learning)
        .filter(|word| {
            word.last_reviewed_at
                .is_some_and(|at| at.date_naive() == today)
        })
        .count() as u32;

    TodayProgress {
        today_word_count: today_deck.len() as u32,
        done_word_count,
        diary_done,
    }
}
