use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use promptforge::agent::AgentId;
use promptforge::cli::{Cli, Commands, InputArgs, RequestArgs, TweakArgs};
use promptforge::completion::{GenerationSettings, UserLibrary, prepare_request};
use promptforge::config::ForgeConfig;
use promptforge::error::ForgeError;
use promptforge::language::detect_input_language;
use promptforge::lint::lint_input;
use promptforge::prompt::GenerationRequest;
use promptforge::response::{format_prompt_for_copy, parse_generated_prompt};
use promptforge::tweaks::{SelectedTweaks, suggest_tweaks};
use promptforge::validation::{validate_prompt_generation_options, validate_selected_tweaks};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ForgeConfig::load(cli.common.config.as_deref(), &cli.common)?;

    promptforge::logging::init(
        config.log_level.as_deref(),
        config.log_file.as_deref(),
        config.log_format()?,
    )?;

    config.validate()?;

    debug!(
        provider = %config.provider,
        agent = %config.agent,
        custom_agents = config.custom_agents.len(),
        custom_tweaks = config.custom_tweaks.len(),
        "config loaded"
    );

    match cli.command {
        Commands::Build(args) => {
            let request = generation_request(&config, &args.request)?;
            let settings = GenerationSettings {
                provider: config.provider_type()?,
                temperature: config.temperature,
            };
            let library = UserLibrary {
                custom_agents: &config.custom_agents,
                custom_tweaks: &config.custom_tweaks,
            };

            info!(
                language = detect_input_language(&request.input).code(),
                agent = %request.agent,
                "building prompt"
            );
            let completion_request = prepare_request(request, library, &settings)?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&completion_request)?);
            } else {
                for message in &completion_request.messages {
                    let role = serde_json::to_value(message.role)?;
                    println!("=== {} ===", role.as_str().unwrap_or("message").to_uppercase());
                    println!("{}\n", message.content);
                }
            }
            Ok(())
        }
        Commands::Parse(args) => {
            let raw = read_text(args.file.as_deref())?;
            let prompt = parse_generated_prompt(&raw);
            if args.copy {
                if prompt.has_structure() {
                    println!("{}", format_prompt_for_copy(&prompt));
                } else {
                    warn!("completion has no recognizable sections; printing it verbatim");
                    println!("{}", prompt.full_prompt);
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&prompt)?);
            }
            Ok(())
        }
        Commands::Suggest(args) => {
            let input = read_input(&args.input)?;
            let agent: AgentId = config.agent.parse()?;
            let max = args.max.unwrap_or(config.max_suggestions) as usize;
            let suggestions = suggest_tweaks(&input, agent.built_in(), max);

            if args.json {
                println!("{}", serde_json::to_string_pretty(&suggestions)?);
            } else if suggestions.is_empty() {
                println!("No suggestions.");
            } else {
                for s in &suggestions {
                    println!("{}\t{:.2}\t{}", s.tweak_id, s.confidence, s.reason);
                }
            }
            Ok(())
        }
        Commands::Lint(args) => {
            let input = read_input(&args.input)?;
            let hints = lint_input(&input);

            if args.json {
                println!("{}", serde_json::to_string_pretty(&hints)?);
            } else {
                for h in &hints {
                    let severity = serde_json::to_value(h.severity)?;
                    println!(
                        "[{}] {}: {}",
                        severity.as_str().unwrap_or("info"),
                        h.rule,
                        h.message
                    );
                }
            }
            Ok(())
        }
        Commands::Cost(args) => {
            let tweaks = selected_tweaks(&args.tweaks)?;
            let report = validate_selected_tweaks(&tweaks);
            if !report.valid {
                for e in &report.errors {
                    println!("{}: {}", e.field, e.message);
                }
                return Err(ForgeError::Validation {
                    errors: report.errors,
                }
                .into());
            }
            println!("{}", tweaks.estimate_token_impact());
            Ok(())
        }
        Commands::Validate(args) => {
            let request = generation_request(&config, &args.request)?;
            let report = validate_prompt_generation_options(&request);
            if report.valid {
                println!("ok");
                return Ok(());
            }
            for e in &report.errors {
                println!("{}: {}", e.field, e.message);
            }
            Err(ForgeError::Validation {
                errors: report.errors,
            }
            .into())
        }
    }
}

/// Assemble the wire-shaped request from config defaults and CLI flags.
fn generation_request(config: &ForgeConfig, args: &RequestArgs) -> anyhow::Result<GenerationRequest> {
    let input = read_input(&args.input)?;
    let project_context = args
        .project_context_file
        .as_deref()
        .map(read_file)
        .transpose()?;
    let tweaks = selected_tweaks(&args.tweaks)?;

    Ok(GenerationRequest {
        input,
        agent: config.agent.clone(),
        length: args.length.clone().unwrap_or_else(|| config.length.clone()),
        strategy: args
            .strategy
            .clone()
            .unwrap_or_else(|| config.strategy.clone()),
        ask_clarifying_questions: args.ask_questions,
        project_context,
        tweaks: (!tweaks.is_empty()).then_some(tweaks),
    })
}

fn selected_tweaks(args: &TweakArgs) -> anyhow::Result<SelectedTweaks> {
    let custom = args
        .custom_tweaks
        .iter()
        .map(|id| {
            Uuid::parse_str(id.trim())
                .map_err(|e| anyhow::anyhow!("invalid custom tweak id '{id}': {e}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(SelectedTweaks {
        skills: args.skills.clone(),
        thinking: args.thinking.clone(),
        behaviors: args.behaviors.clone(),
        custom,
    })
}

/// Task text from `--input`, `--input-file`, or stdin.
fn read_input(args: &InputArgs) -> anyhow::Result<String> {
    if let Some(text) = &args.input {
        return Ok(text.clone());
    }
    read_text(args.input_file.as_deref())
}

fn read_text(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(p) => read_file(p),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| anyhow::anyhow!("failed to read stdin: {e}"))?;
            Ok(buf)
        }
    }
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).map_err(|e| {
        anyhow::Error::from(ForgeError::InputReadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    })
}
