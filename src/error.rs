use std::path::PathBuf;

use crate::validation::ValidationError;

/// Errors surfaced by the generation pipeline, configuration and CLI.
#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    /// Request failed validation; generation is never attempted.
    /// The message is the first error, which is what callers usually show.
    #[error("{}", first_message(.errors))]
    Validation { errors: Vec<ValidationError> },

    #[error("Unknown agent '{value}'")]
    UnknownAgent { value: String },

    #[error("Unknown provider '{value}' (expected one of: {expected})")]
    UnknownProvider { value: String, expected: String },

    #[error("Invalid length '{value}' (expected \"short\", \"standard\", or \"detailed\")")]
    InvalidLength { value: String },

    #[error("Invalid strategy '{value}' (expected \"implement\" or \"diagnose\")")]
    InvalidStrategy { value: String },

    #[error("Invalid log format '{value}' (expected \"compact\" or \"json\")")]
    InvalidLogFormat { value: String },

    #[error("Custom agent {id} not found")]
    CustomAgentNotFound { id: String },

    #[error("Completion request failed: {detail}")]
    Completion { detail: String },

    #[error("Completion returned no content (finish reason: {finish_reason})")]
    EmptyCompletion { finish_reason: String },

    #[error("Failed to parse environment variable '{var}': {detail}")]
    ConfigEnvParseError { var: String, detail: String },

    #[error("Invalid configuration value for '{field}': {detail}")]
    InvalidConfigValue { field: String, detail: String },

    #[error("Failed to read input {path}: {detail}")]
    InputReadFailed { path: PathBuf, detail: String },
}

fn first_message(errors: &[ValidationError]) -> String {
    errors
        .first()
        .map(|e| e.message.clone())
        .unwrap_or_else(|| "Validation failed".to_owned())
}
