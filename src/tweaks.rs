//! Tweak catalog, suggestion engine and conflict handling.
//!
//! Tweaks are prompt modifiers in three categories: multi-select skills and
//! behaviors, and a closed set of mutually exclusive thinking levels.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::BuiltInAgent;

/// Suggestions below this score are not returned.
pub const MIN_CONFIDENCE: f64 = 0.3;
/// The engine never reports full confidence.
pub const MAX_CONFIDENCE: f64 = 0.9;
pub const DEFAULT_MAX_SUGGESTIONS: usize = 3;

const KEYWORD_SCORE: f64 = 0.3;
const AGENT_RELEVANCE_SCORE: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TweakCategory {
    Skill,
    Thinking,
    Behavior,
}

impl fmt::Display for TweakCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TweakCategory::Skill => "skill",
            TweakCategory::Thinking => "thinking",
            TweakCategory::Behavior => "behavior",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenCostLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl TokenCostLevel {
    /// Percentage range added by a skill or behavior of this class.
    fn modifier_range(self) -> (u32, u32) {
        match self {
            TokenCostLevel::Low => (5, 10),
            TokenCostLevel::Medium => (15, 25),
            TokenCostLevel::High => (50, 75),
            TokenCostLevel::VeryHigh => (100, 150),
        }
    }

    /// Percentage range added by a thinking level of this class.
    fn thinking_range(self) -> (u32, u32) {
        match self {
            TokenCostLevel::Low => (0, 0),
            TokenCostLevel::Medium => (30, 50),
            TokenCostLevel::High => (100, 150),
            TokenCostLevel::VeryHigh => (200, 300),
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweakDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub category: TweakCategory,
    pub instruction: &'static str,
    pub token_cost: TokenCostLevel,
    pub triggers: &'static [&'static str],
    pub relevant_agents: &'static [BuiltInAgent],
    pub conflicts_with: &'static [&'static str],
    pub icon: Option<&'static str>,
}

pub static SKILLS: &[TweakDefinition] = &[
    TweakDefinition {
        id: "testing",
        label: "Write tests",
        description: "Ask the agent to add or update automated tests",
        category: TweakCategory::Skill,
        instruction: "SKILL - TESTING: Add or update automated tests that cover every acceptance criterion. Run the test suite and report the result.",
        token_cost: TokenCostLevel::Medium,
        triggers: &["test", "coverage", "regression", "בדיקה", "טסט"],
        relevant_agents: &[BuiltInAgent::Codex, BuiltInAgent::ClaudeCode],
        conflicts_with: &[],
        icon: Some("flask"),
    },
    TweakDefinition {
        id: "security",
        label: "Security review",
        description: "Check the change for common vulnerabilities",
        category: TweakCategory::Skill,
        instruction: "SKILL - SECURITY: Review the change for injection, XSS, broken authentication and data exposure. Validate all untrusted input.",
        token_cost: TokenCostLevel::Medium,
        triggers: &["security", "auth", "password", "token", "permission", "אבטחה", "הרשאות"],
        relevant_agents: &[],
        conflicts_with: &[],
        icon: Some("shield"),
    },
    TweakDefinition {
        id: "performance",
        label: "Performance",
        description: "Focus on speed and resource usage",
        category: TweakCategory::Skill,
        instruction: "SKILL - PERFORMANCE: Identify the bottleneck before changing code. Avoid unnecessary re-renders, queries and allocations.",
        token_cost: TokenCostLevel::Medium,
        triggers: &["slow", "performance", "optimize", "lag", "memory", "איטי", "ביצועים"],
        relevant_agents: &[],
        conflicts_with: &[],
        icon: Some("gauge"),
    },
    TweakDefinition {
        id: "accessibility",
        label: "Accessibility",
        description: "Keep the UI usable with assistive technology",
        category: TweakCategory::Skill,
        instruction: "SKILL - ACCESSIBILITY: Use semantic elements, labels and ARIA attributes. Keep everything reachable by keyboard.",
        token_cost: TokenCostLevel::Low,
        triggers: &["accessibility", "a11y", "screen reader", "aria", "keyboard", "נגישות"],
        relevant_agents: &[BuiltInAgent::V0, BuiltInAgent::Lovable],
        conflicts_with: &[],
        icon: Some("accessibility"),
    },
    TweakDefinition {
        id: "documentation",
        label: "Documentation",
        description: "Update docs and comments alongside the change",
        category: TweakCategory::Skill,
        instruction: "SKILL - DOCUMENTATION: Update README sections and code comments affected by the change.",
        token_cost: TokenCostLevel::Low,
        triggers: &["docs", "documentation", "readme", "comment", "תיעוד"],
        relevant_agents: &[],
        conflicts_with: &[],
        icon: Some("book"),
    },
    TweakDefinition {
        id: "ui-polish",
        label: "UI polish",
        description: "Pay attention to layout, spacing and responsiveness",
        category: TweakCategory::Skill,
        instruction: "SKILL - UI POLISH: Keep spacing, typography and colors consistent with the existing design. Check mobile and desktop layouts.",
        token_cost: TokenCostLevel::Low,
        triggers: &["design", "layout", "css", "responsive", "mobile", "עיצוב", "מובייל"],
        relevant_agents: &[BuiltInAgent::Lovable, BuiltInAgent::V0, BuiltInAgent::Bolt],
        conflicts_with: &[],
        icon: Some("palette"),
    },
    TweakDefinition {
        id: "database",
        label: "Database",
        description: "Handle schema, queries and migrations carefully",
        category: TweakCategory::Skill,
        instruction: "SKILL - DATABASE: Write migrations for schema changes, keep queries indexed and never drop data without an explicit request.",
        token_cost: TokenCostLevel::Medium,
        triggers: &["database", "sql", "query", "schema", "supabase", "table", "מסד נתונים"],
        relevant_agents: &[BuiltInAgent::Lovable],
        conflicts_with: &[],
        icon: Some("database"),
    },
];

pub static THINKING_LEVELS: &[TweakDefinition] = &[
    TweakDefinition {
        id: "think",
        label: "Think",
        description: "Reason briefly before acting",
        category: TweakCategory::Thinking,
        instruction: "THINKING: Think through the problem before writing code. Outline the approach first.",
        token_cost: TokenCostLevel::Medium,
        triggers: &[],
        relevant_agents: &[BuiltInAgent::ClaudeCode],
        conflicts_with: &["think-hard", "ultrathink"],
        icon: Some("lightbulb"),
    },
    TweakDefinition {
        id: "think-hard",
        label: "Think hard",
        description: "Consider alternatives and edge cases",
        category: TweakCategory::Thinking,
        instruction: "THINKING (DEEP): Think hard. Consider at least two approaches, list edge cases and pick the safest option before coding.",
        token_cost: TokenCostLevel::High,
        triggers: &["edge case", "race condition", "intermittent"],
        relevant_agents: &[],
        conflicts_with: &["think", "ultrathink"],
        icon: Some("brain"),
    },
    TweakDefinition {
        id: "ultrathink",
        label: "Ultrathink",
        description: "Maximum reasoning depth for critical work",
        category: TweakCategory::Thinking,
        instruction: "THINKING (MAXIMUM): Ultrathink. Analyze the full impact of the change, verify every assumption and plan rollback before touching code.",
        token_cost: TokenCostLevel::VeryHigh,
        triggers: &[],
        relevant_agents: &[],
        conflicts_with: &["think", "think-hard"],
        icon: Some("sparkles"),
    },
];

pub static BEHAVIORS: &[TweakDefinition] = &[
    TweakDefinition {
        id: "minimal-changes",
        label: "Minimal changes",
        description: "Touch as little code as possible",
        category: TweakCategory::Behavior,
        instruction: "BEHAVIOR: Make the smallest change that satisfies the requirements. Do not refactor unrelated code.",
        token_cost: TokenCostLevel::Low,
        triggers: &["small fix", "minimal", "quick fix", "only change", "שינוי קטן"],
        relevant_agents: &[BuiltInAgent::Cursor],
        conflicts_with: &["full-rewrite"],
        icon: Some("scissors"),
    },
    TweakDefinition {
        id: "full-rewrite",
        label: "Full rewrite",
        description: "Allow rewriting the affected module from scratch",
        category: TweakCategory::Behavior,
        instruction: "BEHAVIOR: You may rewrite the affected module from scratch if that produces a cleaner result. Keep public interfaces stable.",
        token_cost: TokenCostLevel::High,
        triggers: &["rewrite", "from scratch", "start over", "לכתוב מחדש"],
        relevant_agents: &[],
        conflicts_with: &["preserve-style"],
        icon: Some("refresh"),
    },
    TweakDefinition {
        id: "preserve-style",
        label: "Preserve style",
        description: "Follow existing conventions exactly",
        category: TweakCategory::Behavior,
        instruction: "BEHAVIOR: Follow the existing code style, naming and folder structure exactly.",
        token_cost: TokenCostLevel::Low,
        triggers: &["consistent", "convention", "existing style"],
        relevant_agents: &[],
        conflicts_with: &[],
        icon: Some("brush"),
    },
    TweakDefinition {
        id: "step-by-step",
        label: "Step by step",
        description: "Explain each step while working",
        category: TweakCategory::Behavior,
        instruction: "BEHAVIOR: Work step by step and briefly explain each change as you make it.",
        token_cost: TokenCostLevel::Medium,
        triggers: &["step by step", "explain", "walk me through", "שלב אחר שלב"],
        relevant_agents: &[BuiltInAgent::Replit],
        conflicts_with: &["concise-output"],
        icon: Some("list"),
    },
    TweakDefinition {
        id: "concise-output",
        label: "Concise output",
        description: "Keep explanations to a minimum",
        category: TweakCategory::Behavior,
        instruction: "BEHAVIOR: Keep explanations to a minimum. Output the changes and a one-line summary.",
        token_cost: TokenCostLevel::Low,
        triggers: &["concise", "brief", "no explanation"],
        relevant_agents: &[BuiltInAgent::Copilot],
        conflicts_with: &[],
        icon: Some("minimize"),
    },
    TweakDefinition {
        id: "ask-before-acting",
        label: "Ask before acting",
        description: "Confirm the plan before editing files",
        category: TweakCategory::Behavior,
        instruction: "BEHAVIOR: Present your plan and wait for confirmation before editing any file.",
        token_cost: TokenCostLevel::Low,
        triggers: &["not sure", "unsure", "confirm", "לא בטוח"],
        relevant_agents: &[],
        conflicts_with: &["autonomous"],
        icon: Some("hand"),
    },
    TweakDefinition {
        id: "autonomous",
        label: "Autonomous",
        description: "Proceed without asking for confirmation",
        category: TweakCategory::Behavior,
        instruction: "BEHAVIOR: Proceed autonomously. Make reasonable assumptions, note them, and do not stop to ask for confirmation.",
        token_cost: TokenCostLevel::Medium,
        triggers: &["just do it", "autonomous", "don't ask"],
        relevant_agents: &[BuiltInAgent::Codex],
        conflicts_with: &[],
        icon: Some("rocket"),
    },
    TweakDefinition {
        id: "add-logging",
        label: "Add logging",
        description: "Instrument the change with logs",
        category: TweakCategory::Behavior,
        instruction: "BEHAVIOR: Add logging around the changed code paths so failures can be diagnosed.",
        token_cost: TokenCostLevel::Low,
        triggers: &["log", "debug", "trace", "לוג"],
        relevant_agents: &[],
        conflicts_with: &[],
        icon: Some("scroll"),
    },
];

/// Every catalog entry: skills, then thinking levels, then behaviors.
pub fn all_tweaks() -> impl Iterator<Item = &'static TweakDefinition> {
    SKILLS.iter().chain(THINKING_LEVELS).chain(BEHAVIORS)
}

static INDEX: OnceLock<HashMap<&'static str, &'static TweakDefinition>> = OnceLock::new();

/// Look up any catalog entry by id.
pub fn tweak_by_id(id: &str) -> Option<&'static TweakDefinition> {
    INDEX
        .get_or_init(|| all_tweaks().map(|t| (t.id, t)).collect())
        .get(id)
        .copied()
}

/// True iff `id` names one of the thinking levels.
pub fn is_thinking_level(id: &str) -> bool {
    THINKING_LEVELS.iter().any(|t| t.id == id)
}

/// A ranked suggestion for the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweakSuggestion {
    pub tweak_id: &'static str,
    pub label: &'static str,
    pub category: TweakCategory,
    pub confidence: f64,
    pub reason: String,
}

struct ComplexityIndicator {
    regex: Regex,
    thinking_id: &'static str,
    boost: f64,
}

static COMPLEXITY: OnceLock<Vec<ComplexityIndicator>> = OnceLock::new();

fn complexity_indicators() -> &'static [ComplexityIndicator] {
    COMPLEXITY.get_or_init(|| {
        let table: [(&str, &'static str, f64); 4] = [
            // general complexity
            (
                r"(?i)\b(?:complex|complicated|tricky|multi-step|several (?:files|components|pages))\b|מורכב",
                "think",
                0.20,
            ),
            // high difficulty
            (
                r"(?i)\b(?:difficult|hard to|challenging|edge cases?|race conditions?|intermittent(?:ly)?)\b|קשה",
                "think-hard",
                0.25,
            ),
            // mission-critical / production
            (
                r"(?i)\b(?:production|mission[- ]critical|critical|payments?|data loss)\b|קריטי|פרודקשן",
                "ultrathink",
                0.30,
            ),
            // architecture-level change
            (
                r"(?i)\b(?:architecture|redesign|restructure|migrate|migration)\b|ארכיטקטורה",
                "think-hard",
                0.20,
            ),
        ];
        table
            .into_iter()
            .map(|(pattern, thinking_id, boost)| ComplexityIndicator {
                regex: Regex::new(pattern).expect("valid literal regex"),
                thinking_id,
                boost,
            })
            .collect()
    })
}

struct Candidate {
    tweak: &'static TweakDefinition,
    score: f64,
    reason: Option<String>,
}

/// Score `input` against the catalog and return up to `max_suggestions`
/// entries, highest confidence first. Equal scores keep catalog order.
pub fn suggest_tweaks(
    input: &str,
    current_agent: Option<BuiltInAgent>,
    max_suggestions: usize,
) -> Vec<TweakSuggestion> {
    let lowered = input.to_lowercase();

    let mut candidates: Vec<Candidate> = all_tweaks()
        .map(|tweak| {
            let mut score: f64 = 0.0;
            let mut reason = None;
            let mut seen: HashSet<String> = HashSet::new();

            for keyword in tweak.triggers {
                let keyword = keyword.to_lowercase();
                if lowered.contains(&keyword) && seen.insert(keyword.clone()) {
                    score += KEYWORD_SCORE;
                    reason.get_or_insert_with(|| format!("Mentions \"{keyword}\""));
                }
            }

            if let Some(agent) = current_agent {
                if tweak.relevant_agents.contains(&agent) {
                    score += AGENT_RELEVANCE_SCORE;
                    reason.get_or_insert_with(|| {
                        format!("Optimized for {}", agent.display_name())
                    });
                }
            }

            Candidate {
                tweak,
                score: score.min(MAX_CONFIDENCE),
                reason,
            }
        })
        .collect();

    for indicator in complexity_indicators() {
        if !indicator.regex.is_match(input) {
            continue;
        }
        if let Some(c) = candidates
            .iter_mut()
            .find(|c| c.tweak.id == indicator.thinking_id)
        {
            c.score = (c.score + indicator.boost).min(MAX_CONFIDENCE);
            c.reason
                .get_or_insert_with(|| "Complex task detected".to_owned());
        }
    }

    candidates.retain(|c| c.score >= MIN_CONFIDENCE);
    // Vec::sort_by is stable, so ties keep catalog order.
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(max_suggestions);

    candidates
        .into_iter()
        .map(|c| TweakSuggestion {
            tweak_id: c.tweak.id,
            label: c.tweak.label,
            category: c.tweak.category,
            confidence: c.score,
            reason: c
                .reason
                .unwrap_or_else(|| "Complex task detected".to_owned()),
        })
        .collect()
}

/// True iff either tweak lists the other as a conflict. Unknown ids never conflict.
pub fn tweaks_conflict(a: &str, b: &str) -> bool {
    match (tweak_by_id(a), tweak_by_id(b)) {
        (Some(ta), Some(tb)) => {
            ta.conflicts_with.iter().any(|c| *c == b) || tb.conflicts_with.iter().any(|c| *c == a)
        }
        _ => false,
    }
}

/// Declared conflicts of `id` (empty for unknown ids).
pub fn conflicting_tweaks(id: &str) -> &'static [&'static str] {
    tweak_by_id(id).map(|t| t.conflicts_with).unwrap_or(&[])
}

/// Drop duplicates and any id that conflicts with an earlier kept id.
///
/// Not commutative: the first selected member of a conflicting pair wins.
pub fn resolve_conflicts<S: AsRef<str>>(ids: &[S]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for id in ids.iter().map(AsRef::as_ref) {
        if kept.iter().any(|k| k == id || tweaks_conflict(k, id)) {
            continue;
        }
        kept.push(id.to_owned());
    }
    kept
}

/// Rough token overhead of the selected skills/behaviors plus an optional
/// thinking level, e.g. `"+20-35% tokens"`.
pub fn estimate_token_impact<S: AsRef<str>>(tweak_ids: &[S], thinking_level: Option<&str>) -> String {
    let (mut min, mut max) = (0u32, 0u32);

    for tweak in tweak_ids.iter().filter_map(|id| tweak_by_id(id.as_ref())) {
        let (lo, hi) = tweak.token_cost.modifier_range();
        min += lo;
        max += hi;
    }

    if let Some(thinking) = thinking_level.and_then(tweak_by_id) {
        let (lo, hi) = thinking.token_cost.thinking_range();
        min += lo;
        max += hi;
    }

    if min == 0 && max == 0 {
        "No additional cost".to_owned()
    } else {
        format!("+{min}-{max}% tokens")
    }
}

/// Per-request tweak selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedTweaks {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub thinking: Option<String>,
    #[serde(default)]
    pub behaviors: Vec<String>,
    #[serde(default)]
    pub custom: Vec<Uuid>,
}

impl SelectedTweaks {
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
            && self.thinking.is_none()
            && self.behaviors.is_empty()
            && self.custom.is_empty()
    }

    pub fn toggle_skill(&mut self, id: &str) {
        toggle(&mut self.skills, id.to_owned());
    }

    /// Replaces any previously selected thinking level.
    pub fn set_thinking(&mut self, id: Option<&str>) {
        self.thinking = id.map(str::to_owned);
    }

    /// Add or remove a behavior. Adding removes selected behaviors that
    /// conflict with it, so the newly toggled one wins.
    pub fn toggle_behavior(&mut self, id: &str) {
        if let Some(pos) = self.behaviors.iter().position(|b| b == id) {
            self.behaviors.remove(pos);
            return;
        }
        self.behaviors.retain(|b| !tweaks_conflict(b, id));
        self.behaviors.push(id.to_owned());
    }

    pub fn toggle_custom(&mut self, id: Uuid) {
        toggle(&mut self.custom, id);
    }

    /// Skill and behavior ids, in that order, for cost estimation.
    pub fn modifier_ids(&self) -> Vec<&str> {
        self.skills
            .iter()
            .chain(&self.behaviors)
            .map(String::as_str)
            .collect()
    }

    pub fn estimate_token_impact(&self) -> String {
        estimate_token_impact(&self.modifier_ids(), self.thinking.as_deref())
    }
}

fn toggle<T: PartialEq>(list: &mut Vec<T>, item: T) {
    match list.iter().position(|x| *x == item) {
        Some(pos) => {
            list.remove(pos);
        }
        None => list.push(item),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomTweakCategory {
    Skill,
    Behavior,
    Custom,
}

/// Maximum length of a custom tweak's compact UI label.
pub const SHORT_NAME_MAX_CHARS: usize = 15;

/// A user-authored modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTweak {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub short_name: String,
    pub instruction: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_custom_category")]
    pub category: CustomTweakCategory,
    #[serde(default = "default_tweak_icon")]
    pub icon: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_custom_category() -> CustomTweakCategory {
    CustomTweakCategory::Custom
}

fn default_tweak_icon() -> String {
    "wand".to_owned()
}

fn default_true() -> bool {
    true
}

/// Partial update for a [`CustomTweak`]. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomTweakUpdate {
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub instruction: Option<String>,
    pub description: Option<String>,
    pub category: Option<CustomTweakCategory>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

impl CustomTweak {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        short_name: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            name: name.into(),
            short_name: short_name.into(),
            instruction: instruction.into(),
            description: None,
            category: default_custom_category(),
            icon: default_tweak_icon(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, update: CustomTweakUpdate, now: DateTime<Utc>) {
        if let Some(v) = update.name {
            self.name = v;
        }
        if let Some(v) = update.short_name {
            self.short_name = v;
        }
        if let Some(v) = update.instruction {
            self.instruction = v;
        }
        if let Some(v) = update.description {
            self.description = Some(v);
        }
        if let Some(v) = update.category {
            self.category = v;
        }
        if let Some(v) = update.icon {
            self.icon = v;
        }
        if let Some(v) = update.is_active {
            self.is_active = v;
        }
        self.updated_at = now;
    }
}
