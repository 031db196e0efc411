use chrono::NaiveDate;

use study_utils::{CorrectionResult, DiaryEntry, ExtractedWord};

/// The entry written on `today`, if any. Entries store their creation
/// time as an ISO-8601 string, so this is a date-prefix match.
pub fn today_diary(entries: &[DiaryEntry], today: NaiveDate) -> Option<&DiaryEntry> {
    let prefix = today.to_string();
    entries.iter().find(|entry| entry.created_at.starts_with(&prefix))
}

/// Content for a new diary entry; the engine assigns id and timestamp.
#[derive(Clone, Debug, Default)]
pub struct DiaryDraft {
    pub original: String,
    pub corrected: Option<String>,
    pub explanations: Vec<String>,
    pub grammar_points: Vec<String>,
}

impl DiaryDraft {
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            ..Default::default()
        }
    }

    pub fn with_correction(mut self, correction: CorrectionResult) -> Self {
        self.corrected = Some(correction.corrected);
        self.explanations = correction.explanations;
        self.grammar_points = correction.grammar_points;
        self
    }
}

/// Decodes the correction service's reply. The payload is model output,
/// so a shape mismatch fails closed to an empty default instead of
/// propagating whatever came over the wire.
pub fn parse_correction(value: serde_json::Value) -> CorrectionResult {
    match serde_json::from_value(value) {
        Ok(correction) => correction,
        Err(e) => {
            log::warn!("discarding malformed correction payload: {e}");
            CorrectionResult::default()
        }
    }
}

/// Decodes the word-extraction reply; same fail-closed rule.
pub fn parse_extracted_words(value: serde_json::Value) -> Vec<ExtractedWord> {
    match serde_json::from_value(value) {
        Ok(words) => words,
        Err(e) => {
            log::warn!("discarding malformed word-extraction payload: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, created_at: &str) -> DiaryEntry {
        DiaryEntry {
            id: id.to_string(),
            created_at: created_at.to_string(),
            original: "今日は勉強しました".to_string(),
            corrected: None,
            explanations: vec![],
            vocab_ids: vec![],
            grammar_points: vec![],
        }
    }

    #[test]
    fn test_today_diary_matches_on_date_prefix() {
        let entries = vec![
            entry("d2", "2025-06-15T21:04:00.000Z"),
            entry("d1", "2025-06-14T22:30:00.000Z"),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();

        assert_eq!(today_diary(&entries, today).unwrap().id, "d2");
        let tomorrow = today + chrono::Duration::days(1);
        assert!(today_diary(&entries, tomorrow).is_none());
    }

    #[test]
    fn test_parse_correction_fails_closed() {
        let good = serde_json::json!({
            "corrected": "今日は勉強しました。",
            "explanations": ["added punctuation"],
        });
        assert_eq!(parse_correction(good).corrected, "今日は勉強しました。");

        let bad = serde_json::json!({"corrected": 42});
        let fallback = parse_correction(bad);
        assert_eq!(fallback.corrected, "");
        assert!(fallback.explanations.is_empty());
    }

    #[test]
    fn test_parse_extracted_words_fails_closed() {
        let good = serde_json::json!([
            {"kanji": "勉強", "kana": "べんきょう", "meaningZh": "學習"}
        ]);
        assert_eq!(parse_extracted_words(good).len(), 1);

        assert!(parse_extracted_words(serde_json::json!("nonsense")).is_empty());
    }
}
