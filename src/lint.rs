//! Heuristic hints about the raw task description, shown before generation.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LintSeverity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinterSuggestion {
    pub rule: &'static str,
    pub severity: LintSeverity,
    pub message: &'static str,
}

/// Inputs shorter than this (in words) are checked for vague references.
const VAGUE_WORD_LIMIT: usize = 12;

struct Patterns {
    vague: Regex,
    expectation: Regex,
    location: Regex,
    error_mention: Regex,
    error_detail: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        vague: Regex::new(r"(?i)\b(?:it|this|that|stuff|thing|something)\b|זה|משהו")
            .expect("valid literal regex"),
        expectation: Regex::new(
            r"(?i)\b(?:should|expected?|want|needs? to|instead|supposed to)\b|צריך|רוצה|אמור",
        )
        .expect("valid literal regex"),
        location: Regex::new(
            r"(?i)\b(?:page|screen|button|form|modal|component|file|api|endpoint|function|route|menu|header|footer)s?\b|דף|עמוד|מסך|כפתור|טופס|קובץ",
        )
        .expect("valid literal regex"),
        error_mention: Regex::new(r"(?i)\b(?:error|exception|crash(?:es|ed)?|fails?|failed)\b|שגיאה|קורס")
            .expect("valid literal regex"),
        error_detail: Regex::new(r#""[^"]+"|`[^`]+`|'[^'\s][^']*'|\b\d{3}\b|\w+Error\b"#).expect("valid literal regex"),
    })
}

/// Check a raw task description for common gaps.
pub fn lint_input(input: &str) -> Vec<LinterSuggestion> {
    let p = patterns();
    let mut out = Vec::new();

    if input.trim().is_empty() {
        return out;
    }

    let words = input.split_whitespace().count();
    if words < VAGUE_WORD_LIMIT && p.vague.is_match(input) && !p.location.is_match(input) {
        out.push(LinterSuggestion {
            rule: "vague-reference",
            severity: LintSeverity::Warning,
            message: "Say what \"it\" refers to: name the page, component or feature.",
        });
    }

    if !p.expectation.is_match(input) {
        out.push(LinterSuggestion {
            rule: "missing-expected-behavior",
            severity: LintSeverity::Info,
            message: "Describe what should happen instead of the current behavior.",
        });
    }

    if !p.location.is_match(input) {
        out.push(LinterSuggestion {
            rule: "missing-location",
            severity: LintSeverity::Info,
            message: "Mention where the problem happens (page, screen, component or file).",
        });
    }

    if p.error_mention.is_match(input) && !p.error_detail.is_match(input) {
        out.push(LinterSuggestion {
            rule: "missing-error-details",
            severity: LintSeverity::Info,
            message: "Paste the exact error message or status code.",
        });
    }

    out
}
