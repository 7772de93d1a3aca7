//! Centralized system-prompt construction.
//!
//! Every instruction sent to the completion API is assembled here, so there
//! is one place to review the text that reaches the model. Blocks are
//! emitted in a fixed order and separated by a `---` delimiter line:
//!
//! 1. core system prompt
//! 2. provider + agent guidelines (built-in agents only)
//! 3. agent dialect
//! 4. length instructions
//! 5. strategy instructions
//! 6. clarifying-questions instructions (optional)
//! 7. tweak instructions (optional)
//! 8. project context, verbatim (optional)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::agent::{AgentId, CustomAgent, agent_dialect_prompt, custom_agent_dialect_prompt};
use crate::completion::{AiMessage, Role};
use crate::error::ForgeError;
use crate::guidelines::{ProviderType, lookup_guidelines};
use crate::language::{InputLanguage, detect_input_language};
use crate::tweaks::{CustomTweak, SelectedTweaks, tweak_by_id};
use crate::validation::{ValidationError, validate_prompt_generation_options};

/// Separator placed before every block except the first.
pub const BLOCK_DELIMITER: &str = "\n\n---\n\n";

/// Prepended to the user message when the input is detected as Hebrew.
pub const HEBREW_INPUT_NOTE: &str = "[Input is in Hebrew - translate to English]";

const CORE_SYSTEM_PROMPT: &str = "You are an expert prompt engineer for AI coding assistants. \
Rewrite the user's rough description of a coding task into a clear, structured, agent-ready prompt.

Rules:
- Always answer in English, regardless of the language of the input.
- Preserve every discrete issue the user lists. Give each issue its own numbered entry in both \
the current behavior section and the expected behavior section, in the same order.
- Never merge, drop or invent issues.
- Use clean markdown: bold section labels followed by a colon, dash or numbered lists, and no \
stray asterisks.
- Output only the prompt itself, with no preamble or closing remarks.";

const LENGTH_SHORT: &str = "LENGTH: SHORT
Produce a compact prompt with exactly these sections:
**Goal:** one sentence.
**Current behavior (BROKEN):** numbered list, one line per issue.
**Expected behavior:** numbered list, one line per issue, matching the list above 1:1.
**Acceptance criteria:** 2-4 dash bullets.
Every issue named in the current behavior section must reappear, 1:1, in every later section.";

const LENGTH_STANDARD: &str = "LENGTH: STANDARD
Produce a prompt with these sections, in order:
**Goal:** one or two sentences describing the outcome.
**Context:** where in the app this happens and anything the agent needs to know.
**Current behavior (BROKEN):** numbered list, one entry per issue, with observable symptoms.
**Expected behavior:** numbered list matching the list above 1:1.
**Acceptance criteria:** dash bullets, at least one per issue, each independently testable.
**Constraints:** dash bullets for what must not change.
Every issue named in the current behavior section must reappear, 1:1, in every later section.";

const LENGTH_DETAILED: &str = "LENGTH: DETAILED
Produce a thorough prompt with these sections, in order:
**Goal:** the outcome and why it matters to users.
**Context:** affected screens, components, data and user flows; relevant technical background.
**Current behavior (BROKEN):** numbered list, one entry per issue, with reproduction steps and \
observable symptoms for each.
**Expected behavior:** numbered list matching the list above 1:1, describing the exact correct \
behavior including edge cases.
**Acceptance criteria:** dash bullets, at least two per issue, covering the happy path and edge \
cases, each independently testable.
**Constraints:** dash bullets for scope limits, things that must not break, and conventions to \
follow.
Every issue named in the current behavior section must reappear, 1:1, in every later section.";

const STRATEGY_IMPLEMENT: &str = "STRATEGY: IMPLEMENT
The agent should implement the change directly. Make minimal, reasonable assumptions and state \
them briefly in the context section. Do not add clarifying questions unless explicitly requested.";

const STRATEGY_DIAGNOSE: &str = "STRATEGY: DIAGNOSE
The agent should find the root cause before changing code. Ask it to investigate, explain the \
cause, and only then propose a fix. If the description is ambiguous, end with a **Questions:** \
section containing 2-4 clarifying questions.";

const CLARIFYING_QUESTIONS: &str = "CLARIFYING QUESTIONS
End the prompt with a **Questions:** section containing 2-4 numbered clarifying questions that \
would most improve the result. Include this section even if the description seems complete.";

/// Requested level of detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptLength {
    Short,
    Standard,
    Detailed,
}

impl PromptLength {
    pub fn as_str(self) -> &'static str {
        match self {
            PromptLength::Short => "short",
            PromptLength::Standard => "standard",
            PromptLength::Detailed => "detailed",
        }
    }

    fn instructions(self) -> &'static str {
        match self {
            PromptLength::Short => LENGTH_SHORT,
            PromptLength::Standard => LENGTH_STANDARD,
            PromptLength::Detailed => LENGTH_DETAILED,
        }
    }

    /// Completion budget for this length.
    pub fn max_tokens(self) -> u32 {
        match self {
            PromptLength::Short => 1024,
            PromptLength::Standard => 2048,
            PromptLength::Detailed => 4096,
        }
    }
}

impl fmt::Display for PromptLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptLength {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(PromptLength::Short),
            "standard" => Ok(PromptLength::Standard),
            "detailed" => Ok(PromptLength::Detailed),
            other => Err(ForgeError::InvalidLength {
                value: other.to_owned(),
            }),
        }
    }
}

/// How the target agent should approach the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStrategy {
    Implement,
    Diagnose,
}

impl PromptStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            PromptStrategy::Implement => "implement",
            PromptStrategy::Diagnose => "diagnose",
        }
    }

    fn instructions(self) -> &'static str {
        match self {
            PromptStrategy::Implement => STRATEGY_IMPLEMENT,
            PromptStrategy::Diagnose => STRATEGY_DIAGNOSE,
        }
    }
}

impl fmt::Display for PromptStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptStrategy {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "implement" => Ok(PromptStrategy::Implement),
            "diagnose" => Ok(PromptStrategy::Diagnose),
            other => Err(ForgeError::InvalidStrategy {
                value: other.to_owned(),
            }),
        }
    }
}

/// A generation request as received from a caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub input: String,
    pub agent: String,
    pub length: String,
    pub strategy: String,
    #[serde(default)]
    pub ask_clarifying_questions: bool,
    #[serde(default)]
    pub project_context: Option<String>,
    #[serde(default)]
    pub tweaks: Option<SelectedTweaks>,
}

/// A validated generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptGenerationOptions {
    pub input: String,
    pub agent: AgentId,
    pub length: PromptLength,
    pub strategy: PromptStrategy,
    pub ask_clarifying_questions: bool,
    pub project_context: Option<String>,
    pub tweaks: Option<SelectedTweaks>,
}

impl TryFrom<GenerationRequest> for PromptGenerationOptions {
    type Error = ForgeError;

    fn try_from(req: GenerationRequest) -> Result<Self, Self::Error> {
        let report = validate_prompt_generation_options(&req);
        if !report.valid {
            return Err(ForgeError::Validation {
                errors: report.errors,
            });
        }

        let invalid = |field: &str, e: ForgeError| ForgeError::Validation {
            errors: vec![ValidationError::new(field, e.to_string())],
        };

        Ok(Self {
            agent: req.agent.trim().parse().map_err(|e| invalid("agent", e))?,
            length: req.length.trim().parse().map_err(|e| invalid("length", e))?,
            strategy: req
                .strategy
                .trim()
                .parse()
                .map_err(|e| invalid("strategy", e))?,
            input: req.input,
            ask_clarifying_questions: req.ask_clarifying_questions,
            project_context: req.project_context,
            tweaks: req.tweaks,
        })
    }
}

/// Collaborator data the assembler needs besides the request itself.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyContext<'a> {
    pub provider: ProviderType,
    /// The resolved record when the target is a custom agent.
    pub custom_agent: Option<&'a CustomAgent>,
    /// The caller's custom tweaks; selection picks from these by id.
    pub custom_tweaks: &'a [CustomTweak],
}

impl<'a> AssemblyContext<'a> {
    pub fn new(provider: ProviderType) -> Self {
        Self {
            provider,
            custom_agent: None,
            custom_tweaks: &[],
        }
    }

    pub fn with_custom_agent(mut self, agent: &'a CustomAgent) -> Self {
        self.custom_agent = Some(agent);
        self
    }

    pub fn with_custom_tweaks(mut self, tweaks: &'a [CustomTweak]) -> Self {
        self.custom_tweaks = tweaks;
        self
    }
}

/// Build the full system instruction for a validated request.
pub fn build_system_prompt(options: &PromptGenerationOptions, ctx: &AssemblyContext<'_>) -> String {
    let mut blocks: Vec<String> = vec![CORE_SYSTEM_PROMPT.to_owned()];

    match options.agent {
        AgentId::BuiltIn(agent) => {
            blocks.push(lookup_guidelines(ctx.provider, agent).combined_injection);
            blocks.push(agent_dialect_prompt(agent));
        }
        AgentId::Custom(uuid) => match ctx.custom_agent {
            Some(custom) => blocks.push(custom_agent_dialect_prompt(custom)),
            None => warn!(agent = %uuid, "custom agent record not supplied; dialect block skipped"),
        },
    }

    blocks.push(options.length.instructions().to_owned());
    blocks.push(options.strategy.instructions().to_owned());

    if options.ask_clarifying_questions {
        blocks.push(CLARIFYING_QUESTIONS.to_owned());
    }

    if let Some(tweaks) = build_tweak_instructions(options.tweaks.as_ref(), ctx.custom_tweaks) {
        blocks.push(tweaks);
    }

    if let Some(project) = options
        .project_context
        .as_deref()
        .filter(|c| !c.trim().is_empty())
    {
        blocks.push(project.to_owned());
    }

    debug!(
        agent = %options.agent,
        provider = %ctx.provider,
        length = %options.length,
        strategy = %options.strategy,
        block_count = blocks.len(),
        "system prompt assembled"
    );

    blocks.join(BLOCK_DELIMITER)
}

/// Render selected tweaks as one `ACTIVE TWEAKS:` block.
///
/// Order: thinking level, skills, behaviors, custom tweaks; each group in
/// selection order. Returns `None` when nothing renders, so the caller can
/// skip the block and its delimiter.
pub fn build_tweak_instructions(
    selected: Option<&SelectedTweaks>,
    custom_tweaks: &[CustomTweak],
) -> Option<String> {
    let selected = selected?;
    let mut parts: Vec<String> = Vec::new();

    let catalog_ids = selected
        .thinking
        .iter()
        .chain(&selected.skills)
        .chain(&selected.behaviors);
    for id in catalog_ids {
        match tweak_by_id(id) {
            Some(t) => parts.push(t.instruction.to_owned()),
            None => warn!(tweak = %id, "unknown tweak id skipped"),
        }
    }

    for id in &selected.custom {
        match custom_tweaks.iter().find(|t| t.id == *id) {
            Some(t) if t.is_active => {
                parts.push(format!("CUSTOM TWEAK: {}\n{}", t.name, t.instruction.trim()));
            }
            Some(_) => debug!(tweak = %id, "inactive custom tweak skipped"),
            None => warn!(tweak = %id, "custom tweak record not supplied; skipped"),
        }
    }

    if parts.is_empty() {
        return None;
    }
    Some(format!("ACTIVE TWEAKS:\n\n{}", parts.join("\n\n")))
}

/// The two-message conversation sent to the completion API.
pub fn build_messages(options: &PromptGenerationOptions, ctx: &AssemblyContext<'_>) -> Vec<AiMessage> {
    let user_content = match detect_input_language(&options.input) {
        InputLanguage::Hebrew => format!("{HEBREW_INPUT_NOTE}\n\n{}", options.input),
        InputLanguage::English => options.input.clone(),
    };

    vec![
        AiMessage {
            role: Role::System,
            content: build_system_prompt(options, ctx),
        },
        AiMessage {
            role: Role::User,
            content: user_content,
        },
    ]
}
