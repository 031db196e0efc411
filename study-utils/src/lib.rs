use chrono::{DateTime, NaiveDate, Utc};
use rustc_hash::FxHashSet;

/// JLPT proficiency levels, ordered easiest (N5) to hardest (N1).
#[derive(
    Clone,
    Copy,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    parse_display::Display,
    parse_display::FromStr,
    schemars::JsonSchema,
)]
pub enum JlptLevel {
    N5,
    N4,
    N3,
    N2,
    N1,
}

/// How well the user knows a word. Serialized as the bare integer 0-3
/// so persisted data stays compatible with the mobile app's store.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Familiarity {
    Unknown = 0,
    Learning = 1,
    Known = 2,
    Mastered = 3,
}

impl Familiarity {
    pub const ALL: [Familiarity; 4] = [
        Familiarity::Unknown,
        Familiarity::Learning,
        Familiarity::Known,
        Familiarity::Mastered,
    ];
}

impl From<Familiarity> for u8 {
    fn from(familiarity: Familiarity) -> Self {
        familiarity as u8
    }
}

impl TryFrom<u8> for Familiarity {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Familiarity::Unknown),
            1 => Ok(Familiarity::Learning),
            2 => Ok(Familiarity::Known),
            3 => Ok(Familiarity::Mastered),
            other => Err(format!("familiarity out of range: {other}")),
        }
    }
}

/// A vocabulary item together with its review state.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: String,
    pub level: JlptLevel,
    pub kanji: String,
    pub kana: String,
    pub meaning_zh: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_ja: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_zh: Option<String>,
    pub familiarity: Familiarity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub flagged: bool,
}

impl Word {
    /// A fresh, never-reviewed word.
    pub fn new(
        id: impl Into<String>,
        level: JlptLevel,
        kanji: impl Into<String>,
        kana: impl Into<String>,
        meaning_zh: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            level,
            kanji: kanji.into(),
            kana: kana.into(),
            meaning_zh: meaning_zh.into(),
            example_ja: None,
            example_zh: None,
            familiarity: Familiarity::Unknown,
            last_reviewed_at: None,
            flagged: false,
        }
    }
}

/// One diary entry. `created_at` is kept as the ISO-8601 string the app
/// writes, so "written today" checks are a date-prefix match.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    pub id: String,
    pub created_at: String,
    pub original: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub explanations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vocab_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grammar_points: Vec<String>,
}

/// The shape the correction service is asked to produce. Parsed strictly;
/// anything that doesn't fit fails closed to `Default`.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionResult {
    pub corrected: String,
    #[serde(default)]
    pub explanations: Vec<String>,
    #[serde(default)]
    pub grammar_points: Vec<String>,
}

/// A word the correction service pulled out of a diary entry.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedWord {
    pub kanji: String,
    pub kana: String,
    pub meaning_zh: String,
    #[serde(default)]
    pub level: Option<JlptLevel>,
}

impl ExtractedWord {
    pub fn into_word(self, id: impl Into<String>, fallback_level: JlptLevel) -> Word {
        Word::new(
            id,
            self.level.unwrap_or(fallback_level),
            self.kanji,
            self.kana,
            self.meaning_zh,
        )
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub main_level: JlptLevel,
    pub words_per_day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    pub notifications_enabled: bool,
    #[serde(default = "default_ui_language")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<NaiveDate>,
}

fn default_ui_language() -> String {
    "zh".to_string()
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            main_level: JlptLevel::N3,
            words_per_day: 10,
            reminder_time: Some("21:30".to_string()),
            notifications_enabled: false,
            language: default_ui_language(),
            exam_date: None,
        }
    }
}

/// A streak milestone. `unlocked_at` is stamped once and never cleared
/// short of a full data reset.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub requirement: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl Achievement {
    fn locked(id: &str, title: &str, description: &str, icon: &str, requirement: u32) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            requirement,
            unlocked_at: None,
        }
    }
}

/// The built-in streak milestones.
pub fn default_achievements() -> Vec<Achievement> {
    vec![
        Achievement::locked("streak-3", "Sprout", "Study 3 days in a row", "🌱", 3),
        Achievement::locked("streak-7", "On Fire", "Study 7 days in a row", "🔥", 7),
        Achievement::locked("streak-14", "Resolute", "Study 14 days in a row", "⭐", 14),
        Achievement::locked("streak-30", "Master", "Study 30 days in a row", "👑", 30),
    ]
}

/// Today's study progress: deck size, words done, diary state.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayProgress {
    pub today_word_count: u32,
    pub done_word_count: u32,
    pub diary_done: bool,
}

/// Appends the incoming words that aren't already in the library, keyed by
/// (kanji, kana). Returns how many were added.
pub fn merge_new_words(library: &mut Vec<Word>, incoming: Vec<Word>) -> usize {
    let mut seen: FxHashSet<(String, String)> = library
        .iter()
        .map(|word| (word.kanji.clone(), word.kana.clone()))
        .collect();

    let mut added = 0;
    for word in incoming {
        if seen.insert((word.kanji.clone(), word.kana.clone())) {
            library.push(word);
            added += 1;
        }
    }
    added
}
