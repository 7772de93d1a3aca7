//! Parse a completion back into a structured prompt record.
//!
//! Parsing is line-oriented and forgiving: a header line opens a section,
//! following lines are buffered until the next header, and each buffer is
//! flushed into the record when its section closes. The raw text is always
//! kept in `full_prompt`, which stays authoritative when extraction is sparse.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Structured view of a generated prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPrompt {
    pub goal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_behavior: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_behavior: Option<String>,
    pub acceptance_criteria: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarifying_questions: Option<Vec<String>>,
    /// Verbatim completion text.
    pub full_prompt: String,
}

impl GeneratedPrompt {
    /// True when at least one section beyond the raw text was recovered.
    pub fn has_structure(&self) -> bool {
        !self.goal.is_empty()
            || has_text(&self.context)
            || has_text(&self.current_behavior)
            || has_text(&self.expected_behavior)
            || !self.acceptance_criteria.is_empty()
            || self.constraints.as_ref().is_some_and(|c| !c.is_empty())
    }
}

fn has_text(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Goal,
    Context,
    CurrentBehavior,
    CurrentIssues,
    ExpectedBehavior,
    AcceptanceCriteria,
    Constraints,
    ClarifyingQuestions,
}

/// Header words in match priority order.
const HEADERS: [(Section, &str); 8] = [
    (Section::Goal, r"goal|objective"),
    (Section::Context, r"context|background"),
    (Section::CurrentBehavior, r"current\s+behaviou?r"),
    (Section::CurrentIssues, r"(?:current\s+)?(?:issues|problems)"),
    (Section::ExpectedBehavior, r"expected\s+behaviou?r"),
    (Section::AcceptanceCriteria, r"acceptance\s+criteria"),
    (Section::Constraints, r"constraints"),
    (Section::ClarifyingQuestions, r"(?:clarifying\s+)?questions"),
];

static HEADER_RES: OnceLock<Vec<(Section, Regex)>> = OnceLock::new();
static NUMBERED_RE: OnceLock<Regex> = OnceLock::new();

fn header_res() -> &'static [(Section, Regex)] {
    HEADER_RES.get_or_init(|| {
        HEADERS
            .iter()
            .map(|(section, words)| {
                // Optional `#` heading marker, `*` emphasis on either side of the
                // header word, a parenthetical such as `(BROKEN)`, and inline
                // content after the colon.
                let pattern = format!(
                    r"(?i)^\s*(?:#{{1,6}}\s*)?\**\s*(?:{words})(?:\s*\([^)]*\))?\s*\**\s*(?::\**\s*(.*))?$"
                );
                (
                    *section,
                    Regex::new(&pattern).expect("valid header regex"),
                )
            })
            .collect()
    })
}

fn numbered_re() -> &'static Regex {
    NUMBERED_RE.get_or_init(|| Regex::new(r"^\d+\.").expect("valid literal regex"))
}

/// Match `line` against the header patterns, returning the section and any
/// inline content after the colon.
fn match_header(line: &str) -> Option<(Section, &str)> {
    header_res().iter().find_map(|(section, re)| {
        re.captures(line).map(|caps| {
            let inline = caps.get(1).map_or("", |m| m.as_str().trim());
            (*section, inline)
        })
    })
}

/// Parse raw completion text. Never fails; unmatched sections stay empty.
pub fn parse_generated_prompt(raw: &str) -> GeneratedPrompt {
    let mut result = GeneratedPrompt {
        full_prompt: raw.to_owned(),
        ..Default::default()
    };

    let mut current: Option<Section> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in raw.lines() {
        if let Some((section, inline)) = match_header(line) {
            if let Some(open) = current {
                save_section(&mut result, open, &buffer);
            }
            current = Some(section);
            buffer.clear();
            if !inline.is_empty() {
                buffer.push(inline);
            }
        } else if current.is_some() {
            buffer.push(line);
        }
    }

    if let Some(open) = current {
        save_section(&mut result, open, &buffer);
    }

    result
}

fn save_section(result: &mut GeneratedPrompt, section: Section, lines: &[&str]) {
    match section {
        Section::Goal => result.goal = join_text(lines),
        Section::Context => result.context = Some(join_text(lines)),
        Section::ExpectedBehavior => result.expected_behavior = Some(join_text(lines)),
        Section::CurrentBehavior | Section::CurrentIssues => {
            let text = join_text(lines);
            result.current_behavior = Some(match result.current_behavior.take() {
                Some(existing) if !existing.is_empty() && !text.is_empty() => {
                    format!("{existing}\n{text}")
                }
                Some(existing) if text.is_empty() => existing,
                _ => text,
            });
        }
        Section::AcceptanceCriteria => result.acceptance_criteria.extend(extract_bullets(lines)),
        Section::Constraints => result
            .constraints
            .get_or_insert_with(Vec::new)
            .extend(extract_bullets(lines)),
        Section::ClarifyingQuestions => result
            .clarifying_questions
            .get_or_insert_with(Vec::new)
            .extend(extract_bullets(lines)),
    }
}

fn join_text(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|l| l.trim_start_matches('*'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

/// Pull list items out of buffered lines. Non-bullet lines are dropped.
fn extract_bullets(lines: &[&str]) -> Vec<String> {
    let mut items = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.chars().all(|c| c == '*') {
            continue;
        }

        let rest = if let Some(r) = trimmed.strip_prefix(['-', '*', '•']) {
            r
        } else if let Some(m) = numbered_re().find(trimmed) {
            &trimmed[m.end()..]
        } else {
            continue;
        };

        let item = rest.trim_start().trim_start_matches('*').trim();
        if item.is_empty() || item == "*" {
            continue;
        }
        items.push(item.to_owned());
    }
    items
}

/// Render the record as copyable markdown.
///
/// Empty sections are omitted. Clarifying questions are never included;
/// they are answered interactively rather than copied into the prompt.
pub fn format_prompt_for_copy(prompt: &GeneratedPrompt) -> String {
    let mut sections: Vec<String> = Vec::new();

    let mut text = |label: &str, value: Option<&str>| {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            sections.push(format!("**{label}:**\n{v}"));
        }
    };
    text("Goal", Some(prompt.goal.as_str()));
    text("Context", prompt.context.as_deref());
    text("Current behavior", prompt.current_behavior.as_deref());
    text("Expected behavior", prompt.expected_behavior.as_deref());

    let mut list = |label: &str, items: &[String]| {
        if !items.is_empty() {
            let body: Vec<String> = items.iter().map(|i| format!("- {i}")).collect();
            sections.push(format!("**{label}:**\n{}", body.join("\n")));
        }
    };
    list("Acceptance criteria", &prompt.acceptance_criteria);
    list("Constraints", prompt.constraints.as_deref().unwrap_or_default());

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_goal_and_acceptance_criteria() {
        let raw = "**Goal:** Fix login bug\n**Acceptance criteria:**\n- Login succeeds\n- No console errors";
        let p = parse_generated_prompt(raw);

        assert_eq!(p.goal, "Fix login bug");
        assert_eq!(p.acceptance_criteria, vec!["Login succeeds", "No console errors"]);
        assert_eq!(p.context, None);
        assert_eq!(p.constraints, None);
        assert_eq!(p.full_prompt, raw);
    }

    #[test]
    fn full_prompt_is_verbatim_for_any_input() {
        for raw in ["", "no headers at all\n", "**Goal:**", "\r\n**Goal:** x\r\n", "* * *"] {
            assert_eq!(parse_generated_prompt(raw).full_prompt, raw);
        }
    }

    #[test]
    fn text_without_headers_yields_empty_fields() {
        let p = parse_generated_prompt("Sure! Here is your prompt.\nIt has no structure.");
        assert_eq!(p.goal, "");
        assert!(p.acceptance_criteria.is_empty());
        assert!(!p.has_structure());
    }

    #[test]
    fn lines_before_first_header_are_dropped() {
        let p = parse_generated_prompt("Here you go:\n\n**Goal:**\nShip it");
        assert_eq!(p.goal, "Ship it");
    }

    #[test]
    fn header_variants_are_recognized() {
        let raw = "\
## Goal
Make search fast
**Context**: Search page
*Expected Behaviour:* Results in under 200ms
CONSTRAINTS:
- Keep the API
**Clarifying questions:**
1. Which browsers?";
        let p = parse_generated_prompt(raw);
        assert_eq!(p.goal, "Make search fast");
        assert_eq!(p.context.as_deref(), Some("Search page"));
        assert_eq!(p.expected_behavior.as_deref(), Some("Results in under 200ms"));
        assert_eq!(p.constraints, Some(vec!["Keep the API".to_owned()]));
        assert_eq!(p.clarifying_questions, Some(vec!["Which browsers?".to_owned()]));
    }

    #[test]
    fn body_line_starting_with_header_word_is_not_a_header() {
        let p = parse_generated_prompt("**Goal:**\nGoal setting page must load\nContext matters");
        assert_eq!(p.goal, "Goal setting page must load\nContext matters");
        assert_eq!(p.context, None);
    }

    #[test]
    fn current_behavior_and_issues_merge() {
        let raw = "\
**Current behavior (BROKEN):**
1. Button does nothing
**Current issues:**
2. Spinner never stops";
        let p = parse_generated_prompt(raw);
        assert_eq!(
            p.current_behavior.as_deref(),
            Some("1. Button does nothing\n2. Spinner never stops")
        );
    }

    #[test]
    fn opened_but_empty_sections_are_present_and_empty() {
        let p = parse_generated_prompt("**Context:**\n**Constraints:**\n\n**Goal:**");
        assert_eq!(p.context.as_deref(), Some(""));
        assert_eq!(p.constraints, Some(Vec::new()));
        assert_eq!(p.goal, "");
    }

    #[test]
    fn text_sections_strip_leading_asterisks() {
        let p = parse_generated_prompt("**Goal:**\n**Fix** the header\n***\n");
        assert_eq!(p.goal, "Fix** the header");
    }

    #[test]
    fn bullet_markers_are_stripped() {
        let raw = "\
**Acceptance criteria:**
- dash item
* star item
• dot item
12. numbered item
- **bold** item
plain line is ignored
**
-
- *";
        let p = parse_generated_prompt(raw);
        assert_eq!(
            p.acceptance_criteria,
            vec!["dash item", "star item", "dot item", "numbered item", "bold** item"]
        );
    }

    #[test]
    fn parenthetical_is_allowed_on_every_header() {
        let p = parse_generated_prompt(
            "**Goal:** x\n**Acceptance Criteria (testable):**\n- a\n- b\n## Constraints (hard)\n- c",
        );
        assert_eq!(p.goal, "x", "goal must not absorb the next header");
        assert_eq!(p.acceptance_criteria, vec!["a", "b"]);
        assert_eq!(p.constraints, Some(vec!["c".to_owned()]));
    }

    #[test]
    fn horizontal_rule_in_list_section_is_kept_as_dash_item() {
        let p = parse_generated_prompt("**Constraints:**\n- Keep the API\n---");
        assert_eq!(
            p.constraints,
            Some(vec!["Keep the API".to_owned(), "--".to_owned()]),
            "a `---` line is a `-` bullet whose text is `--`"
        );
    }

    #[test]
    fn inline_content_seeds_list_sections() {
        let p = parse_generated_prompt("**Constraints:** - Keep the API\n- No new deps");
        assert_eq!(
            p.constraints,
            Some(vec!["Keep the API".to_owned(), "No new deps".to_owned()])
        );
    }

    #[test]
    fn numbered_issues_survive_one_to_one() {
        let n = 5;
        let mut raw = String::from("**Goal:** Fix the dashboard\n\n**Current behavior (BROKEN):**\n");
        for i in 1..=n {
            raw.push_str(&format!("{i}. Widget {i} shows stale data\n"));
        }
        raw.push_str("\n**Expected behavior:**\n");
        for i in 1..=n {
            raw.push_str(&format!("{i}. Widget {i} refreshes every minute\n"));
        }
        raw.push_str("\n**Acceptance criteria:**\n");
        for i in 1..=n {
            raw.push_str(&format!("- Widget {i} shows data newer than 60s\n"));
        }

        let p = parse_generated_prompt(&raw);
        assert_eq!(p.acceptance_criteria.len(), n);
        assert_eq!(p.current_behavior.as_deref().map(|s| s.lines().count()), Some(n));
        assert_eq!(p.expected_behavior.as_deref().map(|s| s.lines().count()), Some(n));
        assert_eq!(p.acceptance_criteria[4], "Widget 5 shows data newer than 60s");
    }

    #[test]
    fn format_for_copy_renders_populated_sections_in_order() {
        let p = GeneratedPrompt {
            goal: "Fix login".to_owned(),
            context: None,
            current_behavior: Some("1. Error 500".to_owned()),
            expected_behavior: Some("1. Redirect to dashboard".to_owned()),
            acceptance_criteria: vec!["Login works".to_owned()],
            constraints: Some(vec!["Keep OAuth".to_owned()]),
            clarifying_questions: None,
            full_prompt: String::new(),
        };
        assert_eq!(
            format_prompt_for_copy(&p),
            "**Goal:**\nFix login\n\n\
             **Current behavior:**\n1. Error 500\n\n\
             **Expected behavior:**\n1. Redirect to dashboard\n\n\
             **Acceptance criteria:**\n- Login works\n\n\
             **Constraints:**\n- Keep OAuth"
        );
    }

    #[test]
    fn format_for_copy_never_includes_questions() {
        let p = parse_generated_prompt(
            "**Goal:** Fix login\n**Questions:**\n1. Which provider do you use?\n2. Is SSO required?",
        );
        assert_eq!(p.clarifying_questions.as_ref().map(Vec::len), Some(2));

        let copy = format_prompt_for_copy(&p);
        assert!(!copy.contains("Questions:"), "got: {copy}");
        assert!(!copy.contains("Which provider"), "got: {copy}");
        assert!(!copy.contains("SSO"), "got: {copy}");
    }

    #[test]
    fn format_for_copy_of_empty_record_is_empty() {
        assert_eq!(format_prompt_for_copy(&GeneratedPrompt::default()), "");
    }

    #[test]
    fn serializes_camel_case_and_skips_absent_fields() {
        let p = parse_generated_prompt("**Goal:** Ship");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["goal"], "Ship");
        assert_eq!(json["fullPrompt"], "**Goal:** Ship");
        assert!(json.get("acceptanceCriteria").is_some());
        assert!(json.get("context").is_none());
    }
}
