use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::agent::{AgentId, CustomAgent};
use crate::cli::CommonArgs;
use crate::error::ForgeError;
use crate::guidelines::ProviderType;
use crate::logging::LogFormat;
use crate::prompt::{PromptLength, PromptStrategy};
use crate::tweaks::{CustomTweak, DEFAULT_MAX_SUGGESTIONS};
use crate::validation::{resolve_custom_agent, validate_custom_agent, validate_custom_tweak};

// Precedence: CLI > env > file > defaults.

const DEFAULT_PROVIDER: &str = "openai";
const DEFAULT_AGENT: &str = "cursor";
const DEFAULT_LENGTH: &str = "standard";
const DEFAULT_STRATEGY: &str = "implement";
const DEFAULT_TEMPERATURE: f32 = crate::completion::DEFAULT_TEMPERATURE;
const DEFAULT_LOG_FORMAT: &str = "compact";
const MAX_TEMPERATURE: f32 = 2.0;

const ENV_PREFIX: &str = "PROMPTFORGE_";

/// Resolved configuration for one invocation.
///
/// Built from three layers with precedence CLI > env > file > defaults.
/// String-valued choices are checked by [`ForgeConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ForgeConfig {
    pub provider: String,
    pub agent: String,
    pub length: String,
    pub strategy: String,
    pub temperature: f32,
    pub max_suggestions: u32,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub log_format: String,
    /// Custom agents available for `custom-<uuid>` agent ids. File only.
    pub custom_agents: Vec<CustomAgent>,
    /// Custom tweaks selectable by uuid. File only.
    pub custom_tweaks: Vec<CustomTweak>,
}

/// TOML-deserializable config file representation. All fields optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    provider: Option<String>,
    agent: Option<String>,
    length: Option<String>,
    strategy: Option<String>,
    temperature: Option<f32>,
    max_suggestions: Option<u32>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
    log_format: Option<String>,
    #[serde(default)]
    custom_agents: Vec<CustomAgent>,
    #[serde(default)]
    custom_tweaks: Vec<CustomTweak>,
}

/// One precedence layer; `None` means "not set here".
#[derive(Debug, Default)]
struct ConfigLayer {
    provider: Option<String>,
    agent: Option<String>,
    length: Option<String>,
    strategy: Option<String>,
    temperature: Option<f32>,
    max_suggestions: Option<u32>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
    log_format: Option<String>,
}

impl ForgeConfig {
    /// Load configuration with precedence: CLI > env > file > defaults.
    ///
    /// `config_path` is the optional TOML config file, `cli_args` the values
    /// given on the command line.
    pub fn load(config_path: Option<&Path>, cli_args: &CommonArgs) -> anyhow::Result<Self> {
        Self::load_with_env(config_path, cli_args, real_env_var)
    }

    /// Check every string-valued choice and the custom records.
    pub fn validate(&self) -> Result<(), ForgeError> {
        self.provider_type()?;
        let agent: AgentId = self.agent.parse()?;
        if let AgentId::Custom(uuid) = agent {
            if resolve_custom_agent(agent, &self.custom_agents).is_none() {
                return Err(ForgeError::CustomAgentNotFound {
                    id: uuid.to_string(),
                });
            }
        }
        self.length.parse::<PromptLength>()?;
        self.strategy.parse::<PromptStrategy>()?;
        self.log_format()?;

        if !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(ForgeError::InvalidConfigValue {
                field: "temperature".to_owned(),
                detail: format!("{} is outside 0.0..=2.0", self.temperature),
            });
        }
        if self.max_suggestions == 0 {
            return Err(ForgeError::InvalidConfigValue {
                field: "max_suggestions".to_owned(),
                detail: "must be at least 1".to_owned(),
            });
        }

        for agent in &self.custom_agents {
            let report = validate_custom_agent(agent);
            if !report.valid {
                return Err(ForgeError::Validation {
                    errors: report.errors,
                });
            }
        }
        for tweak in &self.custom_tweaks {
            let report = validate_custom_tweak(tweak);
            if !report.valid {
                return Err(ForgeError::Validation {
                    errors: report.errors,
                });
            }
        }
        Ok(())
    }

    pub fn provider_type(&self) -> Result<ProviderType, ForgeError> {
        self.provider.parse()
    }

    pub fn log_format(&self) -> Result<LogFormat, ForgeError> {
        self.log_format.parse()
    }

    /// Internal constructor that accepts an env-var lookup function,
    /// enabling deterministic testing without process-global mutation.
    fn load_with_env(
        config_path: Option<&Path>,
        cli_args: &CommonArgs,
        env_fn: fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let (file_layer, custom_agents, custom_tweaks) = match config_path {
            Some(path) => load_file_layer(path)?,
            None => (ConfigLayer::default(), Vec::new(), Vec::new()),
        };
        let env_layer = load_env_layer(env_fn)?;
        let cli_layer = cli_layer_from(cli_args);

        let merged = merge_layers(file_layer, env_layer, cli_layer);

        Ok(ForgeConfig {
            provider: merged
                .provider
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_owned()),
            agent: merged.agent.unwrap_or_else(|| DEFAULT_AGENT.to_owned()),
            length: merged.length.unwrap_or_else(|| DEFAULT_LENGTH.to_owned()),
            strategy: merged
                .strategy
                .unwrap_or_else(|| DEFAULT_STRATEGY.to_owned()),
            temperature: merged.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_suggestions: merged
                .max_suggestions
                .unwrap_or(DEFAULT_MAX_SUGGESTIONS as u32),
            log_level: merged.log_level,
            log_file: merged.log_file,
            log_format: merged
                .log_format
                .unwrap_or_else(|| DEFAULT_LOG_FORMAT.to_owned()),
            custom_agents,
            custom_tweaks,
        })
    }
}

fn load_file_layer(
    path: &Path,
) -> anyhow::Result<(ConfigLayer, Vec<CustomAgent>, Vec<CustomTweak>)> {
    let contents = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
    let fc: FileConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?;
    let layer = ConfigLayer {
        provider: fc.provider,
        agent: fc.agent,
        length: fc.length,
        strategy: fc.strategy,
        temperature: fc.temperature,
        max_suggestions: fc.max_suggestions,
        log_level: fc.log_level,
        log_file: fc.log_file,
        log_format: fc.log_format,
    };
    Ok((layer, fc.custom_agents, fc.custom_tweaks))
}

fn real_env_var(suffix: &str) -> Option<String> {
    let key = format!("{ENV_PREFIX}{suffix}");
    env::var(&key).ok().filter(|v| !v.is_empty())
}

fn load_env_layer(env_fn: fn(&str) -> Option<String>) -> Result<ConfigLayer, ForgeError> {
    Ok(ConfigLayer {
        provider: env_fn("PROVIDER"),
        agent: env_fn("AGENT"),
        length: env_fn("LENGTH"),
        strategy: env_fn("STRATEGY"),
        temperature: parse_env_f32(env_fn, "TEMPERATURE")?,
        max_suggestions: parse_env_u32(env_fn, "MAX_SUGGESTIONS")?,
        log_level: env_fn("LOG_LEVEL"),
        log_file: env_fn("LOG_FILE").map(PathBuf::from),
        log_format: env_fn("LOG_FORMAT"),
    })
}

fn parse_env_u32(
    env_fn: fn(&str) -> Option<String>,
    suffix: &str,
) -> Result<Option<u32>, ForgeError> {
    match env_fn(suffix) {
        Some(s) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|e| ForgeError::ConfigEnvParseError {
                var: format!("{ENV_PREFIX}{suffix}"),
                detail: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn parse_env_f32(
    env_fn: fn(&str) -> Option<String>,
    suffix: &str,
) -> Result<Option<f32>, ForgeError> {
    match env_fn(suffix) {
        Some(s) => s
            .trim()
            .parse::<f32>()
            .map(Some)
            .map_err(|e| ForgeError::ConfigEnvParseError {
                var: format!("{ENV_PREFIX}{suffix}"),
                detail: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn cli_layer_from(args: &CommonArgs) -> ConfigLayer {
    ConfigLayer {
        provider: args.provider.clone(),
        agent: args.agent.clone(),
        length: None,
        strategy: None,
        temperature: args.temperature,
        max_suggestions: None,
        log_level: args.log_level.clone(),
        log_file: args.log_file.clone(),
        log_format: args.log_format.clone(),
    }
}

fn merge_layers(file: ConfigLayer, env: ConfigLayer, cli: ConfigLayer) -> ConfigLayer {
    ConfigLayer {
        provider: cli.provider.or(env.provider).or(file.provider),
        agent: cli.agent.or(env.agent).or(file.agent),
        length: cli.length.or(env.length).or(file.length),
        strategy: cli.strategy.or(env.strategy).or(file.strategy),
        temperature: cli.temperature.or(env.temperature).or(file.temperature),
        max_suggestions: cli
            .max_suggestions
            .or(env.max_suggestions)
            .or(file.max_suggestions),
        log_level: cli.log_level.or(env.log_level).or(file.log_level),
        log_file: cli.log_file.or(env.log_file).or(file.log_file),
        log_format: cli.log_format.or(env.log_format).or(file.log_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_suffix: &str) -> Option<String> {
        None
    }

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("promptforge.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn defaults_applied_when_nothing_is_set() {
        let cfg = ForgeConfig::load_with_env(None, &CommonArgs::default(), no_env).unwrap();

        assert_eq!(cfg.provider, "openai");
        assert_eq!(cfg.agent, "cursor");
        assert_eq!(cfg.length, "standard");
        assert_eq!(cfg.strategy, "implement");
        assert!((cfg.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(cfg.max_suggestions, 3);
        assert_eq!(cfg.log_format, "compact");
        assert_eq!(cfg.log_level, None);
        assert!(cfg.custom_agents.is_empty());
        cfg.validate().expect("defaults should validate");
    }

    #[test]
    fn loads_from_toml_file() {
        let (_dir, path) = write_config(
            r#"
provider = "anthropic"
agent = "claude-code"
length = "detailed"
strategy = "diagnose"
temperature = 0.7
max_suggestions = 5
log_level = "debug"
log_format = "json"
"#,
        );

        let cfg = ForgeConfig::load_with_env(Some(&path), &CommonArgs::default(), no_env).unwrap();

        assert_eq!(cfg.provider, "anthropic");
        assert_eq!(cfg.agent, "claude-code");
        assert_eq!(cfg.length, "detailed");
        assert_eq!(cfg.strategy, "diagnose");
        assert!((cfg.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(cfg.max_suggestions, 5);
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.log_format().unwrap(), LogFormat::Json);
        cfg.validate().expect("file values should validate");
    }

    #[test]
    fn custom_records_load_from_file() {
        let (_dir, path) = write_config(
            r#"
agent = "custom-6f1c2b1e-8d4a-4c3e-9a57-2f0d9b3c4e5a"

[[custom_agents]]
id = "6f1c2b1e-8d4a-4c3e-9a57-2f0d9b3c4e5a"
user_id = "u1"
name = "Team Bot"
tone = "Terse"

[[custom_tweaks]]
id = "0b3f7e0c-5d0a-4a8e-b1a4-6c2d8e9f1a2b"
user_id = "u1"
name = "Use pnpm"
short_name = "pnpm"
instruction = "Use pnpm for every package command."
"#,
        );

        let cfg = ForgeConfig::load_with_env(Some(&path), &CommonArgs::default(), no_env).unwrap();

        assert_eq!(cfg.custom_agents.len(), 1);
        assert_eq!(cfg.custom_agents[0].name, "Team Bot");
        assert!(cfg.custom_agents[0].is_active, "is_active defaults to true");
        assert_eq!(cfg.custom_tweaks.len(), 1);
        assert_eq!(cfg.custom_tweaks[0].short_name, "pnpm");
        cfg.validate().expect("custom agent id should resolve");
    }

    #[test]
    fn env_overrides_file() {
        let (_dir, path) = write_config("agent = \"lovable\"\n");

        fn fake_env(suffix: &str) -> Option<String> {
            if suffix == "AGENT" {
                Some("replit".to_owned())
            } else {
                None
            }
        }

        let cfg = ForgeConfig::load_with_env(Some(&path), &CommonArgs::default(), fake_env).unwrap();
        assert_eq!(cfg.agent, "replit", "env wins over file");
    }

    #[test]
    fn cli_overrides_env() {
        fn fake_env(suffix: &str) -> Option<String> {
            if suffix == "PROVIDER" {
                Some("google".to_owned())
            } else {
                None
            }
        }

        let args = CommonArgs {
            provider: Some("anthropic".to_owned()),
            ..CommonArgs::default()
        };
        let cfg = ForgeConfig::load_with_env(None, &args, fake_env).unwrap();
        assert_eq!(cfg.provider, "anthropic", "CLI wins over env");
    }

    #[test]
    fn full_precedence_chain() {
        let (_dir, path) = write_config(
            r#"
provider = "google"
agent = "bolt"
length = "short"
temperature = 1.0
"#,
        );

        fn fake_env(suffix: &str) -> Option<String> {
            match suffix {
                "AGENT" => Some("windsurf".to_owned()),
                "TEMPERATURE" => Some("0.5".to_owned()),
                _ => None,
            }
        }

        let args = CommonArgs {
            temperature: Some(0.1),
            ..CommonArgs::default()
        };
        let cfg = ForgeConfig::load_with_env(Some(&path), &args, fake_env).unwrap();

        assert!((cfg.temperature - 0.1).abs() < f32::EPSILON, "CLI > env > file");
        assert_eq!(cfg.agent, "windsurf", "env > file");
        assert_eq!(cfg.provider, "google", "file used when no env/cli");
        assert_eq!(cfg.length, "short", "file fallback");
        assert_eq!(cfg.strategy, "implement", "default when unset everywhere");
    }

    #[test]
    fn invalid_toml_returns_error() {
        let (_dir, path) = write_config("not valid {{{{ toml");
        let err = ForgeConfig::load_with_env(Some(&path), &CommonArgs::default(), no_env).unwrap_err();
        assert!(
            format!("{err}").contains("failed to parse config file"),
            "unexpected: {err}"
        );
    }

    #[test]
    fn unknown_toml_key_returns_error() {
        let (_dir, path) = write_config("model = \"gpt-4o\"\n");
        let err = ForgeConfig::load_with_env(Some(&path), &CommonArgs::default(), no_env).unwrap_err();
        assert!(
            format!("{err}").contains("unknown field"),
            "expected unknown field error, got: {err}"
        );
    }

    #[test]
    fn missing_config_file_returns_error() {
        let err = ForgeConfig::load_with_env(
            Some(Path::new("/nonexistent/promptforge.toml")),
            &CommonArgs::default(),
            no_env,
        )
        .unwrap_err();
        assert!(
            format!("{err}").contains("failed to read config file"),
            "unexpected: {err}"
        );
    }

    #[test]
    fn invalid_env_var_returns_error() {
        fn fake_env(suffix: &str) -> Option<String> {
            if suffix == "MAX_SUGGESTIONS" {
                Some("lots".to_owned())
            } else {
                None
            }
        }

        let err = ForgeConfig::load_with_env(None, &CommonArgs::default(), fake_env).unwrap_err();
        let msg = format!("{err}");
        assert!(
            msg.contains("Failed to parse environment variable"),
            "unexpected: {msg}"
        );
        assert!(
            msg.contains("PROMPTFORGE_MAX_SUGGESTIONS"),
            "should mention the variable name, got: {msg}"
        );
    }

    #[test]
    fn validate_rejects_unknown_provider() {
        let args = CommonArgs {
            provider: Some("acme".to_owned()),
            ..CommonArgs::default()
        };
        let cfg = ForgeConfig::load_with_env(None, &args, no_env).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(
            matches!(err, ForgeError::UnknownProvider { .. }),
            "expected UnknownProvider, got: {err:?}"
        );
    }

    #[test]
    fn validate_rejects_unknown_agent() {
        let args = CommonArgs {
            agent: Some("notepad".to_owned()),
            ..CommonArgs::default()
        };
        let cfg = ForgeConfig::load_with_env(None, &args, no_env).unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_unresolved_custom_agent() {
        let args = CommonArgs {
            agent: Some(format!("custom-{}", uuid::Uuid::new_v4())),
            ..CommonArgs::default()
        };
        let cfg = ForgeConfig::load_with_env(None, &args, no_env).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(
            matches!(err, ForgeError::CustomAgentNotFound { .. }),
            "expected CustomAgentNotFound, got: {err:?}"
        );
    }

    #[test]
    fn validate_rejects_inactive_custom_agent() {
        let (_dir, path) = write_config(
            r#"
agent = "custom-6f1c2b1e-8d4a-4c3e-9a57-2f0d9b3c4e5a"

[[custom_agents]]
id = "6f1c2b1e-8d4a-4c3e-9a57-2f0d9b3c4e5a"
user_id = "u1"
name = "Retired Bot"
is_active = false
"#,
        );
        let cfg = ForgeConfig::load_with_env(Some(&path), &CommonArgs::default(), no_env).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(
            matches!(err, ForgeError::CustomAgentNotFound { .. }),
            "expected CustomAgentNotFound, got: {err:?}"
        );
    }

    #[test]
    fn validate_rejects_temperature_out_of_range() {
        let args = CommonArgs {
            temperature: Some(2.5),
            ..CommonArgs::default()
        };
        let cfg = ForgeConfig::load_with_env(None, &args, no_env).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(
            err.to_string().contains("temperature"),
            "expected temperature error, got: {err}"
        );
    }

    #[test]
    fn validate_rejects_zero_max_suggestions() {
        let (_dir, path) = write_config("max_suggestions = 0\n");
        let cfg = ForgeConfig::load_with_env(Some(&path), &CommonArgs::default(), no_env).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(
            err.to_string().contains("max_suggestions"),
            "expected max_suggestions error, got: {err}"
        );
    }

    #[test]
    fn validate_rejects_bad_log_format() {
        fn fake_env(suffix: &str) -> Option<String> {
            (suffix == "LOG_FORMAT").then(|| "xml".to_owned())
        }
        let cfg = ForgeConfig::load_with_env(None, &CommonArgs::default(), fake_env).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(
            matches!(err, ForgeError::InvalidLogFormat { .. }),
            "expected InvalidLogFormat, got: {err:?}"
        );
    }

    #[test]
    fn validate_rejects_invalid_custom_tweak() {
        let (_dir, path) = write_config(
            r#"
[[custom_tweaks]]
id = "0b3f7e0c-5d0a-4a8e-b1a4-6c2d8e9f1a2b"
user_id = "u1"
name = "Long label"
short_name = "definitely-too-long-label"
instruction = "Do the thing."
"#,
        );
        let cfg = ForgeConfig::load_with_env(Some(&path), &CommonArgs::default(), no_env).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(
            matches!(err, ForgeError::Validation { .. }),
            "expected Validation, got: {err:?}"
        );
    }
}
