use std::sync::Arc;

use chrono::{NaiveDate, SecondsFormat};

use study_utils::{
    Achievement, DiaryEntry, Familiarity, TodayProgress, UserSettings, Word, default_achievements,
};

pub mod clock;
pub mod diary;
pub mod ledger;
pub mod persistence;
pub mod progress;
pub mod scheduler;
pub mod streak;
pub mod trends;

pub use clock::{Clock, FixedClock, SystemClock};
pub use diary::DiaryDraft;
pub use ledger::{DailyRecord, LearningStats};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, StorageError, keys};
pub use trends::{FamiliarityBucket, TrendPoint};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("word not found: {0}")]
    WordNotFound(String),

    #[error("diary entry not found: {0}")]
    DiaryNotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// The whole app state plus the recompute pipeline that keeps its derived
/// parts consistent.
///
/// Every mutating action runs the same cascade before returning: the word
/// library changes, then today's progress is re-aggregated, then the daily
/// ledger is rewritten, and a completed day triggers the streak and
/// achievement recompute. Persistence is a separate async flush the caller
/// awaits afterwards; in-memory state stays authoritative even when the
/// flush fails.
pub struct AppState {
    words: Vec<Word>,
    /// Full snapshots of the words answered "don't know", kept in sync
    /// with `words` on every mutation (the persisted shape duplicates the
    /// word, it doesn't reference it).
    wrong_words: Vec<Word>,
    diary_entries: Vec<DiaryEntry>,
    settings: UserSettings,
    stats: LearningStats,
    achievements: Vec<Achievement>,

    // Transient, recomputed per calendar day; never persisted.
    today_deck: Vec<String>,
    deck_date: Option<NaiveDate>,
    today_progress: TodayProgress,
    today_diary_done: bool,

    clock: Arc<dyn Clock>,
}

impl AppState {
    /// A fresh state seeded with the bundled word list.
    pub fn new(clock: Arc<dyn Clock>, seed_words: Vec<Word>) -> Self {
        let mut state = Self {
            words: seed_words,
            wrong_words: Vec::new(),
            diary_entries: Vec::new(),
            settings: UserSettings::default(),
            stats: LearningStats::default(),
            achievements: default_achievements(),
            today_deck: Vec::new(),
            deck_date: None,
            today_progress: TodayProgress::default(),
            today_diary_done: false,
            clock,
        };
        state.ensure_today();
        state
    }

    /// Loads every persisted key, falling back to defaults (and to
    /// `seed_words` for the library) when a key is absent or unreadable,
    /// then recomputes the whole derived layer.
    pub async fn load(
        store: &dyn KeyValueStore,
        clock: Arc<dyn Clock>,
        seed_words: Vec<Word>,
    ) -> Self {
        let words = load_key(store, keys::WORDS).await.unwrap_or(seed_words);
        let wrong_words = load_key(store, keys::WRONG_WORDS).await.unwrap_or_default();
        let diary_entries = load_key(store, keys::DIARY_ENTRIES)
            .await
            .unwrap_or_default();
        let settings = load_key(store, keys::SETTINGS).await.unwrap_or_default();
        let stats = load_key(store, keys::STATS).await.unwrap_or_default();
        let achievements = load_key(store, keys::ACHIEVEMENTS)
            .await
            .unwrap_or_else(default_achievements);

        let mut state = Self {
            words,
            wrong_words,
            diary_entries,
            settings,
            stats,
            achievements,
            today_deck: Vec::new(),
            deck_date: None,
            today_progress: TodayProgress::default(),
            today_diary_done: false,
            clock,
        };
        state.ensure_today();
        state.apply_streak_summary();
        state.update_daily_stats();
        state
    }

    /// Flushes all six keys, each saved independently. Failures are
    /// logged and the first is returned; callers may ignore it, since the
    /// next mutation's flush retries a full save anyway.
    pub async fn save_data(&self, store: &dyn KeyValueStore) -> Result<(), EngineError> {
        let results = [
            (keys::WORDS, save_key(store, keys::WORDS, &self.words).await),
            (
                keys::WRONG_WORDS,
                save_key(store, keys::WRONG_WORDS, &self.wrong_words).await,
            ),
            (
                keys::DIARY_ENTRIES,
                save_key(store, keys::DIARY_ENTRIES, &self.diary_entries).await,
            ),
            (
                keys::SETTINGS,
                save_key(store, keys::SETTINGS, &self.settings).await,
            ),
            (keys::STATS, save_key(store, keys::STATS, &self.stats).await),
            (
                keys::ACHIEVEMENTS,
                save_key(store, keys::ACHIEVEMENTS, &self.achievements).await,
            ),
        ];

        let mut first_error = None;
        for (key, result) in results {
            if let Err(e) = result {
                log::warn!("failed to save {key}: {e}");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Records a review answer and runs the recompute cascade.
    pub fn apply_review(
        &mut self,
        word_id: &str,
        familiarity: Familiarity,
    ) -> Result<(), EngineError> {
        self.ensure_today();
        let now = self.clock.now();

        let Some(word) = self.words.iter_mut().find(|word| word.id == word_id) else {
            return Err(EngineError::WordNotFound(word_id.to_string()));
        };
        word.familiarity = familiarity;
        // Review timestamps never move backwards.
        word.last_reviewed_at = Some(word.last_reviewed_at.map_or(now, |prev| prev.max(now)));
        let snapshot = word.clone();

        match familiarity {
            Familiarity::Unknown => self.upsert_wrong_word(snapshot),
            Familiarity::Learning => self.sync_wrong_word(&snapshot),
            Familiarity::Known | Familiarity::Mastered => {
                self.wrong_words.retain(|word| word.id != word_id);
            }
        }

        self.recalculate_progress();
        self.update_daily_stats();
        Ok(())
    }

    /// Stars or unstars a word.
    pub fn flag_word(&mut self, word_id: &str, flagged: bool) -> Result<(), EngineError> {
        let Some(word) = self.words.iter_mut().find(|word| word.id == word_id) else {
            return Err(EngineError::WordNotFound(word_id.to_string()));
        };
        word.flagged = flagged;
        let snapshot = word.clone();
        self.sync_wrong_word(&snapshot);
        Ok(())
    }

    /// Appends a new diary entry for today and marks the diary done.
    pub fn add_diary_entry(&mut self, draft: DiaryDraft) -> String {
        self.ensure_today();
        let now = self.clock.now();
        let entry = DiaryEntry {
            id: format!("diary-{}", now.timestamp_millis()),
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            original: draft.original,
            corrected: draft.corrected,
            explanations: draft.explanations,
            vocab_ids: Vec::new(),
            grammar_points: draft.grammar_points,
        };
        let id = entry.id.clone();
        self.diary_entries.insert(0, entry);
        self.today_diary_done = true;

        self.recalculate_progress();
        self.update_daily_stats();
        id
    }

    /// Records which words were pulled out of a diary entry and adds them
    /// to the library.
    pub fn extract_words_from_diary(
        &mut self,
        diary_id: &str,
        words: Vec<Word>,
    ) -> Result<usize, EngineError> {
        let Some(entry) = self
            .diary_entries
            .iter_mut()
            .find(|entry| entry.id == diary_id)
        else {
            return Err(EngineError::DiaryNotFound(diary_id.to_string()));
        };
        entry.vocab_ids = words.iter().map(|word| word.id.clone()).collect();
        Ok(self.add_words_to_library(words))
    }

    /// Adds new words (deduped by kanji + kana) and refreshes the deck so
    /// they can be scheduled. Returns how many were actually added.
    pub fn add_words_to_library(&mut self, words: Vec<Word>) -> usize {
        self.ensure_today();
        let added = study_utils::merge_new_words(&mut self.words, words);
        if added > 0 {
            self.refresh_today_deck();
            self.recalculate_progress();
            self.update_daily_stats();
        }
        added
    }

    /// Replaces the settings; a words-per-day change re-plans today.
    pub fn update_settings(&mut self, settings: UserSettings) {
        self.ensure_today();
        let quota_changed = settings.words_per_day != self.settings.words_per_day;
        self.settings = settings;
        if quota_changed {
            self.refresh_today_deck();
            self.recalculate_progress();
            self.update_daily_stats();
        }
    }

    /// Adds a study session's minutes to today's ledger record.
    pub fn record_study_time(&mut self, minutes: u32) -> Result<(), EngineError> {
        if minutes == 0 {
            return Err(EngineError::InvalidInput(
                "study duration must be positive".to_string(),
            ));
        }
        self.ensure_today();
        ledger::record_study_time(&mut self.stats, minutes, self.clock.today());
        Ok(())
    }

    /// Wipes everything back to a fresh install with `seed_words`. The
    /// caller clears the backing store.
    pub fn reset_all_data(&mut self, seed_words: Vec<Word>) {
        self.words = seed_words;
        self.wrong_words.clear();
        self.diary_entries.clear();
        self.settings = UserSettings::default();
        self.stats = LearningStats::default();
        self.achievements = default_achievements();
        self.today_diary_done = false;
        self.deck_date = None;
        self.today_progress = TodayProgress::default();
        self.ensure_today();
    }

    /// Re-checks the calendar; call on app foregrounding. A day change
    /// re-derives the diary flag, the deck, and today's progress.
    pub fn refresh(&mut self) {
        self.ensure_today();
    }

    /// Signed days until the configured exam date, if one is set.
    pub fn days_until_exam(&self) -> Option<i64> {
        let exam_date = self.settings.exam_date?;
        Some((exam_date - self.clock.today()).num_days())
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn wrong_words(&self) -> &[Word] {
        &self.wrong_words
    }

    pub fn diary_entries(&self) -> &[DiaryEntry] {
        &self.diary_entries
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    pub fn stats(&self) -> &LearningStats {
        &self.stats
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn today_progress(&self) -> &TodayProgress {
        &self.today_progress
    }

    pub fn today_diary_done(&self) -> bool {
        self.today_diary_done
    }

    pub fn today_diary(&self) -> Option<&DiaryEntry> {
        diary::today_diary(&self.diary_entries, self.clock.today())
    }

    pub fn today_deck_ids(&self) -> &[String] {
        &self.today_deck
    }

    /// Today's deck resolved to words, in scheduled order.
    pub fn today_words(&self) -> Vec<&Word> {
        self.today_deck
            .iter()
            .filter_map(|id| self.words.iter().find(|word| &word.id == id))
            .collect()
    }

    pub fn weekly_study_trend(&self) -> Vec<TrendPoint> {
        trends::weekly_study_trend(&self.stats, self.clock.today())
    }

    pub fn monthly_study_trend(&self) -> Vec<TrendPoint> {
        trends::monthly_study_trend(&self.stats, self.clock.today())
    }

    pub fn familiarity_distribution(&self) -> Vec<FamiliarityBucket> {
        trends::familiarity_distribution(&self.words)
    }

    /// Rolls the transient per-day state over when the calendar day has
    /// changed since the deck was last computed.
    fn ensure_today(&mut self) {
        let today = self.clock.today();
        if self.deck_date != Some(today) {
            self.today_diary_done = diary::today_diary(&self.diary_entries, today).is_some();
            self.refresh_today_deck();
            self.recalculate_progress();
        }
    }

    fn refresh_today_deck(&mut self) {
        let today = self.clock.today();
        self.today_deck =
            scheduler::compute_today_deck(&self.words, self.settings.words_per_day, today);
        self.deck_date = Some(today);
    }

    fn recalculate_progress(&mut self) {
        self.today_progress = progress::compute_today_progress(
            &self.words,
            &self.today_deck,
            self.today_diary_done,
            self.clock.today(),
        );
    }

    /// Rewrites today's ledger record; a completed day cascades into the
    /// streak and achievement recompute.
    fn update_daily_stats(&mut self) {
        let completed =
            ledger::record_progress(&mut self.stats, &self.today_progress, self.clock.today());
        if completed {
            self.apply_streak_summary();
            let unlocked = streak::check_achievements(
                self.stats.current_streak,
                &mut self.achievements,
                self.clock.now(),
            );
            for id in &unlocked {
                log::info!("achievement unlocked: {id}");
            }
        }
    }

    fn apply_streak_summary(&mut self) {
        let summary = streak::recompute_streak(&self.stats, self.clock.today());
        self.stats.current_streak = summary.current_streak;
        self.stats.longest_streak = summary.longest_streak;
        self.stats.total_days = summary.total_days;
    }

    fn upsert_wrong_word(&mut self, word: Word) {
        match self.wrong_words.iter_mut().find(|w| w.id == word.id) {
            Some(existing) => *existing = word,
            None => self.wrong_words.push(word),
        }
    }

    fn sync_wrong_word(&mut self, word: &Word) {
        if let Some(existing) = self.wrong_words.iter_mut().find(|w| w.id == word.id) {
            *existing = word.clone();
        }
    }
}

async fn load_key<T: serde::de::DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Option<T> {
    match store.load(key).await {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                log::error!("failed to decode {key}: {e}");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            log::error!("failed to load {key}: {e}");
            None
        }
    }
}

async fn save_key<T: serde::Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), EngineError> {
    let json = serde_json::to_value(value).map_err(StorageError::from)?;
    store.save(key, json).await?;
    Ok(())
}
