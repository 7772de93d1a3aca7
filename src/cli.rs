use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// promptforge: turn a rough coding task into an agent-ready prompt.
///
/// Assembles the system prompt for a target coding agent, parses completions
/// back into structured sections, and suggests modifiers for a task.
#[derive(Debug, Parser)]
#[command(name = "promptforge", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the messages that would be sent to the completion provider.
    Build(BuildArgs),

    /// Parse a completion into structured sections.
    Parse(ParseArgs),

    /// Suggest tweaks for a task description.
    Suggest(SuggestArgs),

    /// Show hints about gaps in a task description.
    Lint(LintArgs),

    /// Estimate the token overhead of a tweak selection.
    Cost(CostArgs),

    /// Validate a generation request without building it.
    Validate(ValidateArgs),
}

/// Options shared by every subcommand.
///
/// Values can also be set via config file or env vars (`PROMPTFORGE_*`).
/// Precedence: CLI > env > file > defaults.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CommonArgs {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Completion provider whose guidelines are injected (default: "openai").
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Target agent id, built-in or `custom-<uuid>` (default: "cursor").
    #[arg(long, global = true)]
    pub agent: Option<String>,

    /// Sampling temperature sent with the completion request (default: 0.3).
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Log level filter (e.g. "debug", "promptforge=trace").
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Append JSON logs to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Stderr log format: "compact" or "json".
    #[arg(long, global = true)]
    pub log_format: Option<String>,
}

/// Where the task description comes from. Stdin when neither is given.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InputArgs {
    /// Task description text.
    #[arg(long, conflicts_with = "input_file")]
    pub input: Option<String>,

    /// Read the task description from this file.
    #[arg(long)]
    pub input_file: Option<PathBuf>,
}

/// Tweak selection flags.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct TweakArgs {
    /// Skill tweak id (repeatable).
    #[arg(long = "skill")]
    pub skills: Vec<String>,

    /// Thinking level tweak id.
    #[arg(long)]
    pub thinking: Option<String>,

    /// Behavior tweak id (repeatable).
    #[arg(long = "behavior")]
    pub behaviors: Vec<String>,

    /// Custom tweak uuid from the config file (repeatable).
    #[arg(long = "custom-tweak")]
    pub custom_tweaks: Vec<String>,
}

/// Everything needed to describe one generation request.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RequestArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Prompt length: short, standard or detailed (default: "standard").
    #[arg(long)]
    pub length: Option<String>,

    /// Prompt strategy: implement or diagnose (default: "implement").
    #[arg(long)]
    pub strategy: Option<String>,

    /// Ask the model to list clarifying questions.
    #[arg(long, default_value_t = false)]
    pub ask_questions: bool,

    /// File with project context to append to the system prompt.
    #[arg(long)]
    pub project_context_file: Option<PathBuf>,

    #[command(flatten)]
    pub tweaks: TweakArgs,
}

/// Arguments for the `build` subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Print the completion request as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Arguments for the `parse` subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct ParseArgs {
    /// Completion text file. Stdin when omitted.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Print the copy-ready text instead of JSON.
    #[arg(long, default_value_t = false)]
    pub copy: bool,
}

/// Arguments for the `suggest` subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct SuggestArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Maximum number of suggestions (default: 3).
    #[arg(long)]
    pub max: Option<u32>,

    /// Print suggestions as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Arguments for the `lint` subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct LintArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print hints as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Arguments for the `cost` subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct CostArgs {
    #[command(flatten)]
    pub tweaks: TweakArgs,
}

/// Arguments for the `validate` subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}
