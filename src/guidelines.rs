//! Prompt-engineering guidelines published by LLM vendors and coding tools.
//!
//! Each guideline set carries one `prompt_injection` block; the assembler
//! combines the provider's block with the target agent's block.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::BuiltInAgent;
use crate::error::ForgeError;

/// The LLM vendor that will run the completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAi,
    Anthropic,
    Google,
    Groq,
    Mistral,
    DeepSeek,
    OpenRouter,
}

impl ProviderType {
    pub const ALL: [ProviderType; 7] = [
        ProviderType::OpenAi,
        ProviderType::Anthropic,
        ProviderType::Google,
        ProviderType::Groq,
        ProviderType::Mistral,
        ProviderType::DeepSeek,
        ProviderType::OpenRouter,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ProviderType::OpenAi => "openai",
            ProviderType::Anthropic => "anthropic",
            ProviderType::Google => "google",
            ProviderType::Groq => "groq",
            ProviderType::Mistral => "mistral",
            ProviderType::DeepSeek => "deepseek",
            ProviderType::OpenRouter => "openrouter",
        }
    }

    /// Guidelines the vendor publishes, if any.
    fn published_guidelines(self) -> Option<&'static ProviderGuideline> {
        match self {
            ProviderType::OpenAi => Some(&OPENAI),
            ProviderType::Anthropic => Some(&ANTHROPIC),
            ProviderType::Google => Some(&GOOGLE),
            ProviderType::Groq
            | ProviderType::Mistral
            | ProviderType::DeepSeek
            | ProviderType::OpenRouter => None,
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderType {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.id() == s)
            .ok_or_else(|| ForgeError::UnknownProvider {
                value: s.to_owned(),
                expected: Self::ALL.map(|p| p.id()).join(", "),
            })
    }
}

/// A vendor's or tool's prompt-engineering best practices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderGuideline {
    pub id: &'static str,
    pub name: &'static str,
    pub principles: &'static [&'static str],
    pub structure_rules: &'static [&'static str],
    pub avoid: &'static [&'static str],
    pub example_patterns: &'static [&'static str],
    pub prompt_injection: &'static str,
    pub version: Option<&'static str>,
}

static OPENAI: ProviderGuideline = ProviderGuideline {
    id: "openai",
    name: "OpenAI",
    principles: &[
        "Put instructions at the beginning of the prompt",
        "Be specific about the desired outcome, length and format",
        "Show the expected output format",
    ],
    structure_rules: &[
        "Separate instructions from context with clear delimiters",
        "Use numbered steps for multi-step tasks",
    ],
    avoid: &["Fluffy or imprecise descriptions", "Saying only what not to do"],
    example_patterns: &["Goal -> Context -> Steps -> Output format"],
    prompt_injection: "PROVIDER GUIDELINES (OpenAI):\n\
- Lead with the instruction, then supply context separated by clear delimiters.\n\
- Be specific about the desired outcome, format and scope.\n\
- Say what to do instead of only what not to do.",
    version: Some("2024-06"),
};

static ANTHROPIC: ProviderGuideline = ProviderGuideline {
    id: "anthropic",
    name: "Anthropic",
    principles: &[
        "Be clear and direct",
        "Give the model context and motivation for the task",
        "Use structure to separate parts of the prompt",
    ],
    structure_rules: &[
        "Wrap distinct inputs in tagged or delimited sections",
        "Place long context before the question",
    ],
    avoid: &["Implicit assumptions about the codebase", "Vague success criteria"],
    example_patterns: &["Context -> Task -> Constraints -> Success criteria"],
    prompt_injection: "PROVIDER GUIDELINES (Anthropic):\n\
- Be clear and direct; explain the motivation behind each requirement.\n\
- Separate context, task and constraints into distinct sections.\n\
- State explicit success criteria the agent can check its work against.",
    version: Some("2025-01"),
};

static GOOGLE: ProviderGuideline = ProviderGuideline {
    id: "google",
    name: "Google Gemini",
    principles: &[
        "Give clear and specific instructions",
        "Specify constraints and response format",
        "Add contextual information the model needs",
    ],
    structure_rules: &["Use prefixes to mark input, output and examples"],
    avoid: &["Relying on the model to infer missing requirements"],
    example_patterns: &["Task: ... / Constraints: ... / Format: ..."],
    prompt_injection: "PROVIDER GUIDELINES (Google Gemini):\n\
- Give clear, specific instructions with explicit constraints.\n\
- Specify the response format and include the context the model needs.\n\
- Do not rely on the model to infer missing requirements.",
    version: None,
};

static CURSOR_GUIDE: ProviderGuideline = ProviderGuideline {
    id: "cursor",
    name: "Cursor",
    principles: &[
        "Reference files and symbols explicitly",
        "Keep each request to one focused change",
    ],
    structure_rules: &["List affected files before describing edits"],
    avoid: &["Open-ended requests across the whole codebase"],
    example_patterns: &["In `path/to/file`, change X so that Y"],
    prompt_injection: "AGENT GUIDELINES (Cursor):\n\
- Reference files, components and functions explicitly.\n\
- Keep each request to one focused, reviewable change.",
    version: None,
};

static LOVABLE_GUIDE: ProviderGuideline = ProviderGuideline {
    id: "lovable",
    name: "Lovable",
    principles: &[
        "Describe features from the user's perspective",
        "Build incrementally, one feature per prompt",
    ],
    structure_rules: &["Describe pages and components in the order the user meets them"],
    avoid: &["Bundling unrelated features into one prompt"],
    example_patterns: &["On the <page> page, when the user <action>, show <result>"],
    prompt_injection: "AGENT GUIDELINES (Lovable):\n\
- Describe behavior from the user's perspective, page by page.\n\
- Ask for one feature at a time and keep unrelated parts untouched.",
    version: None,
};

static REPLIT_GUIDE: ProviderGuideline = ProviderGuideline {
    id: "replit",
    name: "Replit Agent",
    principles: &["Make success observable in the running app"],
    structure_rules: &["Give a checklist the agent can verify step by step"],
    avoid: &["Unverifiable goals"],
    example_patterns: &["After the change, opening /x should show y"],
    prompt_injection: "AGENT GUIDELINES (Replit):\n\
- Make every requirement observable in the running app.\n\
- Provide a short checklist the agent can verify step by step.",
    version: None,
};

static WINDSURF_GUIDE: ProviderGuideline = ProviderGuideline {
    id: "windsurf",
    name: "Windsurf",
    principles: &["Break work into small reviewable increments"],
    structure_rules: &["Order sub-tasks by dependency"],
    avoid: &["Large unreviewable diffs"],
    example_patterns: &["Step 1: ..., Step 2: ..."],
    prompt_injection: "AGENT GUIDELINES (Windsurf):\n\
- Break the work into small increments ordered by dependency.\n\
- Each increment should be reviewable on its own.",
    version: None,
};

fn agent_guidelines(agent: BuiltInAgent) -> Option<&'static ProviderGuideline> {
    match agent {
        BuiltInAgent::Cursor => Some(&CURSOR_GUIDE),
        BuiltInAgent::Lovable => Some(&LOVABLE_GUIDE),
        BuiltInAgent::Replit => Some(&REPLIT_GUIDE),
        BuiltInAgent::Windsurf => Some(&WINDSURF_GUIDE),
        BuiltInAgent::Codex => Some(&OPENAI),
        BuiltInAgent::ClaudeCode => Some(&ANTHROPIC),
        BuiltInAgent::Bolt
        | BuiltInAgent::V0
        | BuiltInAgent::Copilot
        | BuiltInAgent::Generic => None,
    }
}

/// Result of combining provider and agent guidelines.
#[derive(Debug, Clone)]
pub struct GuidelineLookup {
    pub provider: &'static ProviderGuideline,
    pub agent: Option<&'static ProviderGuideline>,
    pub combined_injection: String,
    /// True when the provider publishes no guidelines and OpenAI's were used.
    pub provider_fallback: bool,
}

/// Look up guidelines for a provider and a built-in agent.
///
/// Providers without published guidelines fall back to OpenAI's set. The
/// agent block is dropped when it is identical to the provider block.
pub fn lookup_guidelines(provider: ProviderType, agent: BuiltInAgent) -> GuidelineLookup {
    let (provider_guide, provider_fallback) = match provider.published_guidelines() {
        Some(g) => (g, false),
        None => {
            debug!(provider = %provider, "no published guidelines; using openai set");
            (&OPENAI, true)
        }
    };
    let agent_guide = agent_guidelines(agent);

    let mut combined_injection = provider_guide.prompt_injection.to_owned();
    if let Some(g) = agent_guide {
        if g.prompt_injection != provider_guide.prompt_injection {
            combined_injection.push_str("\n\n");
            combined_injection.push_str(g.prompt_injection);
        }
    }

    GuidelineLookup {
        provider: provider_guide,
        agent: agent_guide,
        combined_injection,
        provider_fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_ids_round_trip() {
        for p in ProviderType::ALL {
            assert_eq!(p.id().parse::<ProviderType>().unwrap(), p);
        }
    }

    #[test]
    fn unknown_provider_lists_expected() {
        let err = "cohere".parse::<ProviderType>().unwrap_err();
        let msg = err.to_string();
        assert!(
            msg.contains("cohere") && msg.contains("anthropic"),
            "expected value and options, got: {msg}"
        );
    }

    #[test]
    fn combines_provider_and_agent_blocks_with_blank_line() {
        let g = lookup_guidelines(ProviderType::Anthropic, BuiltInAgent::Cursor);
        assert_eq!(g.provider.id, "anthropic");
        assert_eq!(g.agent.map(|a| a.id), Some("cursor"));
        assert_eq!(
            g.combined_injection,
            format!("{}\n\n{}", ANTHROPIC.prompt_injection, CURSOR_GUIDE.prompt_injection)
        );
        assert!(!g.provider_fallback);
    }

    #[test]
    fn identical_agent_block_is_not_duplicated() {
        let g = lookup_guidelines(ProviderType::OpenAi, BuiltInAgent::Codex);
        assert_eq!(g.combined_injection, OPENAI.prompt_injection);
        assert_eq!(g.combined_injection.matches("PROVIDER GUIDELINES").count(), 1);
    }

    #[test]
    fn agent_without_guidelines_uses_provider_only() {
        let g = lookup_guidelines(ProviderType::Google, BuiltInAgent::Generic);
        assert!(g.agent.is_none());
        assert_eq!(g.combined_injection, GOOGLE.prompt_injection);
    }

    #[test]
    fn unpublished_provider_falls_back_to_openai() {
        let g = lookup_guidelines(ProviderType::Groq, BuiltInAgent::Bolt);
        assert_eq!(g.provider.id, "openai");
        assert!(g.provider_fallback);
        assert_eq!(g.combined_injection, OPENAI.prompt_injection);
    }

    #[test]
    fn fallback_still_deduplicates_against_openai() {
        let g = lookup_guidelines(ProviderType::Mistral, BuiltInAgent::Codex);
        assert_eq!(g.combined_injection, OPENAI.prompt_injection);
    }
}
