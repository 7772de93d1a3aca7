//! Input and cross-field validation, run before prompt assembly.
//!
//! Every check accumulates into a [`ValidationReport`] instead of stopping
//! at the first failure; callers usually surface only the first error.

use serde::Serialize;

use crate::agent::{AgentId, BuiltInAgent, CustomAgent, is_custom_agent_id};
use crate::prompt::{GenerationRequest, PromptLength, PromptStrategy};
use crate::tweaks::{
    CustomTweak, SHORT_NAME_MAX_CHARS, SelectedTweaks, TweakCategory, is_thinking_level,
    tweak_by_id, tweaks_conflict,
};

pub const MIN_INPUT_CHARS: usize = 10;
pub const MAX_INPUT_CHARS: usize = 5000;
pub const MAX_PROJECT_CONTEXT_CHARS: usize = 20_000;
pub const MAX_NAME_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn first_message(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }
}

/// Presence and length bounds for the raw task description.
pub fn validate_prompt_input(text: &str) -> ValidationReport {
    ValidationReport::from_errors(input_errors(text))
}

fn input_errors(text: &str) -> Vec<ValidationError> {
    let trimmed = text.trim();
    let len = trimmed.chars().count();

    let message = if trimmed.is_empty() {
        "Input is required".to_owned()
    } else if len < MIN_INPUT_CHARS {
        format!("Input is too short (minimum {MIN_INPUT_CHARS} characters)")
    } else if len > MAX_INPUT_CHARS {
        format!("Input is too long (maximum {MAX_INPUT_CHARS} characters)")
    } else {
        return Vec::new();
    };
    vec![ValidationError::new("input", message)]
}

/// Validate a whole generation request.
pub fn validate_prompt_generation_options(request: &GenerationRequest) -> ValidationReport {
    let mut errors = input_errors(&request.input);

    let agent = request.agent.trim();
    if agent.is_empty() {
        errors.push(ValidationError::new("agent", "Agent is required"));
    } else if BuiltInAgent::from_id(agent).is_none() && !is_custom_agent_id(agent) {
        errors.push(ValidationError::new(
            "agent",
            format!("Unknown agent '{agent}'"),
        ));
    }

    let length = request.length.trim();
    if length.is_empty() {
        errors.push(ValidationError::new("length", "Length is required"));
    } else if length.parse::<PromptLength>().is_err() {
        errors.push(ValidationError::new(
            "length",
            format!("Invalid length '{length}'"),
        ));
    }

    let strategy = request.strategy.trim();
    if strategy.is_empty() {
        errors.push(ValidationError::new("strategy", "Strategy is required"));
    } else if strategy.parse::<PromptStrategy>().is_err() {
        errors.push(ValidationError::new(
            "strategy",
            format!("Invalid strategy '{strategy}'"),
        ));
    }

    if let Some(ctx) = &request.project_context {
        if ctx.chars().count() > MAX_PROJECT_CONTEXT_CHARS {
            errors.push(ValidationError::new(
                "projectContext",
                format!("Project context is too long (maximum {MAX_PROJECT_CONTEXT_CHARS} characters)"),
            ));
        }
    }

    if let Some(tweaks) = &request.tweaks {
        errors.extend(validate_selected_tweaks(tweaks).errors);
    }

    ValidationReport::from_errors(errors)
}

/// Catalog membership, category correctness and behavior conflicts.
pub fn validate_selected_tweaks(tweaks: &SelectedTweaks) -> ValidationReport {
    let mut errors = Vec::new();

    for id in &tweaks.skills {
        match tweak_by_id(id) {
            Some(t) if t.category == TweakCategory::Skill => {}
            Some(t) => errors.push(ValidationError::new(
                "tweaks.skills",
                format!("'{id}' is a {} tweak, not a skill", t.category),
            )),
            None => errors.push(ValidationError::new(
                "tweaks.skills",
                format!("Unknown skill '{id}'"),
            )),
        }
    }

    if let Some(id) = &tweaks.thinking {
        if !is_thinking_level(id) {
            errors.push(ValidationError::new(
                "tweaks.thinking",
                format!("Unknown thinking level '{id}'"),
            ));
        }
    }

    let mut known_behaviors = Vec::new();
    for id in &tweaks.behaviors {
        match tweak_by_id(id) {
            Some(t) if t.category == TweakCategory::Behavior => known_behaviors.push(t),
            Some(t) => errors.push(ValidationError::new(
                "tweaks.behaviors",
                format!("'{id}' is a {} tweak, not a behavior", t.category),
            )),
            None => errors.push(ValidationError::new(
                "tweaks.behaviors",
                format!("Unknown behavior '{id}'"),
            )),
        }
    }

    for (i, a) in known_behaviors.iter().enumerate() {
        for b in &known_behaviors[i + 1..] {
            if tweaks_conflict(a.id, b.id) {
                errors.push(ValidationError::new(
                    "tweaks.behaviors",
                    format!("\"{}\" conflicts with \"{}\"", a.label, b.label),
                ));
            }
        }
    }

    ValidationReport::from_errors(errors)
}

fn name_errors(field: &str, name: &str, errors: &mut Vec<ValidationError>) {
    let len = name.trim().chars().count();
    if len == 0 {
        errors.push(ValidationError::new(field, "Name is required"));
    } else if len > MAX_NAME_CHARS {
        errors.push(ValidationError::new(
            field,
            format!("Name is too long (maximum {MAX_NAME_CHARS} characters)"),
        ));
    }
}

/// Field checks for a user-authored agent record.
pub fn validate_custom_agent(agent: &CustomAgent) -> ValidationReport {
    let mut errors = Vec::new();
    name_errors("name", &agent.name, &mut errors);
    if let Some(url) = agent.documentation_url.as_deref().map(str::trim) {
        if !url.is_empty() && !(url.starts_with("https://") || url.starts_with("http://")) {
            errors.push(ValidationError::new(
                "documentationUrl",
                "Documentation URL must start with http:// or https://",
            ));
        }
    }
    ValidationReport::from_errors(errors)
}

/// Field checks for a user-authored tweak record.
pub fn validate_custom_tweak(tweak: &CustomTweak) -> ValidationReport {
    let mut errors = Vec::new();
    name_errors("name", &tweak.name, &mut errors);

    let short = tweak.short_name.trim().chars().count();
    if short == 0 {
        errors.push(ValidationError::new("shortName", "Short name is required"));
    } else if short > SHORT_NAME_MAX_CHARS {
        errors.push(ValidationError::new(
            "shortName",
            format!("Short name is too long (maximum {SHORT_NAME_MAX_CHARS} characters)"),
        ));
    }

    if tweak.instruction.trim().is_empty() {
        errors.push(ValidationError::new("instruction", "Instruction is required"));
    }
    ValidationReport::from_errors(errors)
}

/// Resolve a custom agent id against the caller's records: exactly one
/// active match or the reference is invalid.
pub fn resolve_custom_agent<'a>(id: AgentId, agents: &'a [CustomAgent]) -> Option<&'a CustomAgent> {
    let AgentId::Custom(uuid) = id else {
        return None;
    };
    let mut matches = agents.iter().filter(|a| a.id == uuid);
    match (matches.next(), matches.next()) {
        (Some(agent), None) if agent.is_active => Some(agent),
        _ => None,
    }
}
