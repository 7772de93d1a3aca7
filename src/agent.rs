//! Target agents and their dialects.
//!
//! Built-in agents form a closed enum with a dialect table that is exhaustive
//! over it. User-authored agents are addressed as `custom-<uuid>`; parsing an
//! agent id into [`AgentId`] is the only place that prefix is interpreted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ForgeError;

/// Prefix that marks a user-authored agent id.
pub const CUSTOM_AGENT_PREFIX: &str = "custom-";

/// One of the built-in AI coding tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltInAgent {
    Cursor,
    Lovable,
    Replit,
    Codex,
    ClaudeCode,
    Windsurf,
    Bolt,
    V0,
    Copilot,
    Generic,
}

impl BuiltInAgent {
    pub const ALL: [BuiltInAgent; 10] = [
        BuiltInAgent::Cursor,
        BuiltInAgent::Lovable,
        BuiltInAgent::Replit,
        BuiltInAgent::Codex,
        BuiltInAgent::ClaudeCode,
        BuiltInAgent::Windsurf,
        BuiltInAgent::Bolt,
        BuiltInAgent::V0,
        BuiltInAgent::Copilot,
        BuiltInAgent::Generic,
    ];

    pub fn id(self) -> &'static str {
        match self {
            BuiltInAgent::Cursor => "cursor",
            BuiltInAgent::Lovable => "lovable",
            BuiltInAgent::Replit => "replit",
            BuiltInAgent::Codex => "codex",
            BuiltInAgent::ClaudeCode => "claude-code",
            BuiltInAgent::Windsurf => "windsurf",
            BuiltInAgent::Bolt => "bolt",
            BuiltInAgent::V0 => "v0",
            BuiltInAgent::Copilot => "copilot",
            BuiltInAgent::Generic => "generic",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.id() == id)
    }

    pub fn display_name(self) -> &'static str {
        self.dialect().name
    }

    /// Dialect profile for this agent. The table covers every variant.
    pub fn dialect(self) -> &'static AgentDialect {
        match self {
            BuiltInAgent::Cursor => &CURSOR,
            BuiltInAgent::Lovable => &LOVABLE,
            BuiltInAgent::Replit => &REPLIT,
            BuiltInAgent::Codex => &CODEX,
            BuiltInAgent::ClaudeCode => &CLAUDE_CODE,
            BuiltInAgent::Windsurf => &WINDSURF,
            BuiltInAgent::Bolt => &BOLT,
            BuiltInAgent::V0 => &V0,
            BuiltInAgent::Copilot => &COPILOT,
            BuiltInAgent::Generic => &GENERIC,
        }
    }
}

impl fmt::Display for BuiltInAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A target agent reference: built-in, or a custom agent by UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentId {
    BuiltIn(BuiltInAgent),
    Custom(Uuid),
}

impl AgentId {
    pub fn built_in(self) -> Option<BuiltInAgent> {
        match self {
            AgentId::BuiltIn(agent) => Some(agent),
            AgentId::Custom(_) => None,
        }
    }

    pub fn is_custom(self) -> bool {
        matches!(self, AgentId::Custom(_))
    }
}

impl FromStr for AgentId {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(uuid) = custom_agent_uuid(s) {
            return Ok(AgentId::Custom(uuid));
        }
        BuiltInAgent::from_id(s)
            .map(AgentId::BuiltIn)
            .ok_or_else(|| ForgeError::UnknownAgent {
                value: s.to_owned(),
            })
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentId::BuiltIn(agent) => f.write_str(agent.id()),
            AgentId::Custom(uuid) => write!(f, "{CUSTOM_AGENT_PREFIX}{uuid}"),
        }
    }
}

/// True iff `id` is `custom-` followed by a syntactically valid UUID.
pub fn is_custom_agent_id(id: &str) -> bool {
    custom_agent_uuid(id).is_some()
}

/// Extract the UUID from a `custom-<uuid>` id.
pub fn custom_agent_uuid(id: &str) -> Option<Uuid> {
    id.strip_prefix(CUSTOM_AGENT_PREFIX)
        .and_then(|rest| Uuid::parse_str(rest).ok())
}

/// Static phrasing profile for one built-in agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDialect {
    pub name: &'static str,
    pub tone: &'static str,
    pub structure_preference: &'static str,
    pub emphasis: &'static str,
    pub key_phrase: &'static str,
    pub output_notes: Option<&'static str>,
}

static CURSOR: AgentDialect = AgentDialect {
    name: "Cursor",
    tone: "Direct and technical, like a senior engineer writing a ticket",
    structure_preference: "Numbered steps with explicit file and symbol references",
    emphasis: "Precise scope: which files to touch and which to leave alone",
    key_phrase: "Reference the exact files, components or functions involved before describing the change.",
    output_notes: Some("Cursor works best when the change can be applied as focused edits; avoid asking for whole-project rewrites."),
};

static LOVABLE: AgentDialect = AgentDialect {
    name: "Lovable",
    tone: "Friendly and product-focused",
    structure_preference: "User-visible outcome first, then UI details",
    emphasis: "What the user sees and does on each screen",
    key_phrase: "Describe the change from the end user's point of view, screen by screen.",
    output_notes: Some("Mention Supabase tables or auth only when the task needs backend changes."),
};

static REPLIT: AgentDialect = AgentDialect {
    name: "Replit",
    tone: "Practical and step-oriented",
    structure_preference: "Short checklist the agent can run through in order",
    emphasis: "Running app state: how to verify the fix in the preview",
    key_phrase: "State how to verify the result in the running app after each change.",
    output_notes: None,
};

static CODEX: AgentDialect = AgentDialect {
    name: "Codex",
    tone: "Concise and specification-like",
    structure_preference: "Goal, constraints, then acceptance tests",
    emphasis: "Testable acceptance criteria and commands to run",
    key_phrase: "End with the exact checks or tests that prove the task is done.",
    output_notes: Some("Prefer plain markdown lists; Codex reads them as a task contract."),
};

static CLAUDE_CODE: AgentDialect = AgentDialect {
    name: "Claude Code",
    tone: "Clear and explicit, with reasoning context",
    structure_preference: "Context block, then task, then constraints",
    emphasis: "Why the change is needed and what must not break",
    key_phrase: "Explain the intent behind the change so the agent can make sound judgment calls.",
    output_notes: None,
};

static WINDSURF: AgentDialect = AgentDialect {
    name: "Windsurf",
    tone: "Collaborative and structured",
    structure_preference: "Goal followed by ordered sub-tasks",
    emphasis: "Breaking the work into reviewable increments",
    key_phrase: "Split the work into small increments that can each be reviewed on their own.",
    output_notes: None,
};

static BOLT: AgentDialect = AgentDialect {
    name: "Bolt",
    tone: "Energetic and outcome-driven",
    structure_preference: "Feature description with concrete UI states",
    emphasis: "Complete, working UI flows rather than partial stubs",
    key_phrase: "Describe every UI state involved: empty, loading, success and error.",
    output_notes: None,
};

static V0: AgentDialect = AgentDialect {
    name: "v0",
    tone: "Design-minded and visual",
    structure_preference: "Component-by-component layout description",
    emphasis: "Layout, spacing, responsiveness and component hierarchy",
    key_phrase: "Describe the layout and component hierarchy before styling details.",
    output_notes: Some("Assume React with Tailwind and shadcn/ui unless the user says otherwise."),
};

static COPILOT: AgentDialect = AgentDialect {
    name: "GitHub Copilot",
    tone: "Terse and code-centric",
    structure_preference: "Bullet list of required code changes",
    emphasis: "Function-level changes and expected signatures",
    key_phrase: "Name the functions to change and the behavior each must have afterwards.",
    output_notes: None,
};

static GENERIC: AgentDialect = AgentDialect {
    name: "Generic AI assistant",
    tone: "Neutral and complete",
    structure_preference: "Goal, current behavior, expected behavior, acceptance criteria",
    emphasis: "Unambiguous description that any coding assistant can act on",
    key_phrase: "Make the prompt self-contained: assume the agent knows nothing about the project.",
    output_notes: None,
};

/// Render the dialect block for a built-in agent.
pub fn agent_dialect_prompt(agent: BuiltInAgent) -> String {
    let d = agent.dialect();
    let mut out = format!(
        "AGENT: {}\n\
         - Tone: {}\n\
         - Structure preference: {}\n\
         - Emphasis: {}\n\
         - Key instruction: {}",
        d.name, d.tone, d.structure_preference, d.emphasis, d.key_phrase
    );
    if let Some(notes) = d.output_notes {
        out.push_str(&format!("\n- Output notes: {notes}"));
    }
    out
}

/// A user-authored agent profile. Same shape as a built-in dialect, but
/// every descriptive field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAgent {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub structure_preference: Option<String>,
    #[serde(default)]
    pub emphasis: Option<String>,
    #[serde(default)]
    pub extra_phrase: Option<String>,
    #[serde(default)]
    pub documentation_url: Option<String>,
    #[serde(default)]
    pub custom_instructions: Option<String>,
    #[serde(default = "default_agent_icon")]
    pub icon: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_agent_icon() -> String {
    "bot".to_owned()
}

fn default_true() -> bool {
    true
}

/// Partial update for a [`CustomAgent`]. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomAgentUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tone: Option<String>,
    pub structure_preference: Option<String>,
    pub emphasis: Option<String>,
    pub extra_phrase: Option<String>,
    pub documentation_url: Option<String>,
    pub custom_instructions: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

impl CustomAgent {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            name: name.into(),
            description: None,
            tone: None,
            structure_preference: None,
            emphasis: None,
            extra_phrase: None,
            documentation_url: None,
            custom_instructions: None,
            icon: default_agent_icon(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// The `custom-<uuid>` reference for this agent.
    pub fn agent_id(&self) -> AgentId {
        AgentId::Custom(self.id)
    }

    pub fn apply_update(&mut self, update: CustomAgentUpdate, now: DateTime<Utc>) {
        if let Some(v) = update.name {
            self.name = v;
        }
        if let Some(v) = update.description {
            self.description = Some(v);
        }
        if let Some(v) = update.tone {
            self.tone = Some(v);
        }
        if let Some(v) = update.structure_preference {
            self.structure_preference = Some(v);
        }
        if let Some(v) = update.emphasis {
            self.emphasis = Some(v);
        }
        if let Some(v) = update.extra_phrase {
            self.extra_phrase = Some(v);
        }
        if let Some(v) = update.documentation_url {
            self.documentation_url = Some(v);
        }
        if let Some(v) = update.custom_instructions {
            self.custom_instructions = Some(v);
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

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Render the dialect block for a custom agent. Missing fields are omitted,
/// never filled from a built-in profile.
pub fn custom_agent_dialect_prompt(agent: &CustomAgent) -> String {
    let mut out = format!("AGENT: {}", agent.name);
    let lines = [
        ("Description", non_empty(&agent.description)),
        ("Tone", non_empty(&agent.tone)),
        ("Structure preference", non_empty(&agent.structure_preference)),
        ("Emphasis", non_empty(&agent.emphasis)),
        ("Key instruction", non_empty(&agent.extra_phrase)),
        ("Documentation", non_empty(&agent.documentation_url)),
    ];
    for (label, value) in lines {
        if let Some(v) = value {
            out.push_str(&format!("\n- {label}: {v}"));
        }
    }
    if let Some(instructions) = non_empty(&agent.custom_instructions) {
        out.push_str(&format!("\n- Custom instructions:\n{instructions}"));
    }
    out
}
