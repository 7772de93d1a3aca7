//! Input language detection.
//!
//! A character-ratio heuristic, not a classifier: text counts as Hebrew when
//! more than 30% of its non-whitespace characters fall in the Hebrew block.

use serde::Serialize;

const HEBREW_START: char = '\u{0590}';
const HEBREW_END: char = '\u{05FF}';

/// Threshold expressed as a fraction (3/10) so the comparison stays in integers.
const HEBREW_RATIO_NUM: usize = 3;
const HEBREW_RATIO_DEN: usize = 10;

/// Language of the user's raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputLanguage {
    #[serde(rename = "he")]
    Hebrew,
    #[serde(rename = "en")]
    English,
}

impl InputLanguage {
    pub fn code(self) -> &'static str {
        match self {
            InputLanguage::Hebrew => "he",
            InputLanguage::English => "en",
        }
    }
}

fn is_hebrew(c: char) -> bool {
    (HEBREW_START..=HEBREW_END).contains(&c)
}

/// Classify `text` as Hebrew or English.
///
/// Returns `Hebrew` iff the Hebrew share of non-whitespace characters is
/// strictly greater than 30%. Empty or whitespace-only text is English.
pub fn detect_input_language(text: &str) -> InputLanguage {
    let mut total = 0usize;
    let mut hebrew = 0usize;

    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if is_hebrew(c) {
            hebrew += 1;
        }
    }

    if total > 0 && hebrew * HEBREW_RATIO_DEN > total * HEBREW_RATIO_NUM {
        InputLanguage::Hebrew
    } else {
        InputLanguage::English
    }
}

/// True when at least one Hebrew character is present, regardless of ratio.
pub fn contains_hebrew(text: &str) -> bool {
    text.chars().any(is_hebrew)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_hebrew_is_hebrew() {
        assert_eq!(
            detect_input_language("הכפתור לא עובד בדף הבית"),
            InputLanguage::Hebrew
        );
    }

    #[test]
    fn pure_english_is_english() {
        assert_eq!(
            detect_input_language("The button on the home page does nothing"),
            InputLanguage::English
        );
    }

    #[test]
    fn empty_and_whitespace_are_english() {
        assert_eq!(detect_input_language(""), InputLanguage::English);
        assert_eq!(detect_input_language("   \n\t "), InputLanguage::English);
    }

    #[test]
    fn exactly_thirty_percent_is_english() {
        // 3 Hebrew + 7 Latin = 30%
        assert_eq!(detect_input_language("אבג abcdefg"), InputLanguage::English);
    }

    #[test]
    fn just_above_thirty_percent_is_hebrew() {
        // 4 Hebrew + 9 Latin ≈ 30.8%
        assert_eq!(
            detect_input_language("אבגד abcdefghi"),
            InputLanguage::Hebrew
        );
    }

    #[test]
    fn just_below_thirty_percent_is_english() {
        // 2 Hebrew + 5 Latin ≈ 28.6%
        assert_eq!(detect_input_language("אב abcde"), InputLanguage::English);
    }

    #[test]
    fn whitespace_is_ignored_in_ratio() {
        // Without whitespace this is 3 Hebrew vs 6 Latin (33%)
        assert_eq!(
            detect_input_language("א ב ג          abc def"),
            InputLanguage::Hebrew
        );
    }

    #[test]
    fn detection_is_idempotent() {
        let text = "fix the כפתור please";
        assert_eq!(detect_input_language(text), detect_input_language(text));
    }

    #[test]
    fn contains_hebrew_ignores_threshold() {
        assert!(contains_hebrew("a long english sentence with one ש letter"));
        assert!(!contains_hebrew("no hebrew at all"));
        assert!(!contains_hebrew(""));
    }

    #[test]
    fn codes_match_wire_values() {
        assert_eq!(InputLanguage::Hebrew.code(), "he");
        assert_eq!(InputLanguage::English.code(), "en");
    }
}
