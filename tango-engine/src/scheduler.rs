use chrono::NaiveDate;

use study_utils::{Familiarity, Word};

/// Days to wait before showing a word again, by familiarity.
pub fn review_interval(familiarity: Familiarity) -> i64 {
    match familiarity {
        Familiarity::Unknown => 0,
        Familiarity::Learning => 1,
        Familiarity::Known => 3,
        Familiarity::Mastered => 7,
    }
}

/// Whether a word should be offered for review on `today`.
///
/// A word reviewed earlier the same calendar day is never due again that
/// day, so a "don't know" answer (interval 0) can't cycle the word back
/// into the deck mid-session.
pub fn is_due(word: &Word, today: NaiveDate) -> bool {
    let Some(last_reviewed) = word.last_reviewed_at else {
        return true;
    };

    let last_date = last_reviewed.date_naive();
    if last_date == today {
        return false;
    }

    (today - last_date).num_days() >= review_interval(word.familiarity)
}

/// Selects today's deck: due words, least-known first, longest-idle first
/// within a familiarity tier, capped at `quota`. Ties keep library order.
pub fn compute_today_deck(words: &[Word], quota: u32, today: NaiveDate) -> Vec<String> {
    if quota == 0 {
        return Vec::new();
    }

    let mut due: Vec<&Word> = words.iter().filter(|word| is_due(word, today)).collect();

    // Stable sort, so the library order is the final tiebreak.
    due.sort_by_key(|word| {
        (
            word.familiarity,
            word.last_reviewed_at
                .map(|at| at.timestamp_millis())
                .unwrap_or(0),
        )
    });

    due.into_iter()
        .take(quota as usize)
        .map(|word| word.id.clone())
        .collect()
}
