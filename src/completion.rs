//! Completion collaborator contract and the generation pipeline.
//!
//! Vendor HTTP framing lives behind [`CompletionClient`]; this module only
//! fixes the request/response shape and drives one request per generation:
//! validate, assemble, call, parse. There is no retry, streaming or caching.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agent::{AgentId, CustomAgent};
use crate::error::ForgeError;
use crate::guidelines::ProviderType;
use crate::prompt::{AssemblyContext, GenerationRequest, PromptGenerationOptions, build_messages};
use crate::response::{GeneratedPrompt, parse_generated_prompt};
use crate::tweaks::CustomTweak;
use crate::validation::resolve_custom_agent;

pub const DEFAULT_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub messages: Vec<AiMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub content: String,
    pub finish_reason: String,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// A vendor adapter able to run one chat completion.
pub trait CompletionClient {
    fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse>;
}

/// Per-call settings that come from configuration rather than the request.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub provider: ProviderType,
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: ProviderType::OpenAi,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// The caller's custom agent and tweak records.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserLibrary<'a> {
    pub custom_agents: &'a [CustomAgent],
    pub custom_tweaks: &'a [CustomTweak],
}

/// Validate `request`, assemble messages and build the completion request.
///
/// Split from [`generate`] so callers can inspect what would be sent.
pub fn prepare_request(
    request: GenerationRequest,
    library: UserLibrary<'_>,
    settings: &GenerationSettings,
) -> Result<CompletionRequest, ForgeError> {
    let options = PromptGenerationOptions::try_from(request)?;

    let mut ctx = AssemblyContext::new(settings.provider).with_custom_tweaks(library.custom_tweaks);
    if let AgentId::Custom(uuid) = options.agent {
        let agent = resolve_custom_agent(options.agent, library.custom_agents).ok_or_else(|| {
            ForgeError::CustomAgentNotFound {
                id: uuid.to_string(),
            }
        })?;
        ctx = ctx.with_custom_agent(agent);
    }

    let messages = build_messages(&options, &ctx);
    debug!(
        system_len = messages[0].content.len(),
        user_len = messages[1].content.len(),
        "messages built"
    );

    Ok(CompletionRequest {
        messages,
        max_tokens: options.length.max_tokens(),
        temperature: settings.temperature,
    })
}

/// Run one generation end to end.
pub fn generate(
    client: &dyn CompletionClient,
    request: GenerationRequest,
    library: UserLibrary<'_>,
    settings: &GenerationSettings,
) -> Result<GeneratedPrompt, ForgeError> {
    let completion_request = prepare_request(request, library, settings)?;

    let response = client
        .complete(&completion_request)
        .map_err(|e| ForgeError::Completion {
            detail: format!("{e:#}"),
        })?;

    if response.content.trim().is_empty() {
        return Err(ForgeError::EmptyCompletion {
            finish_reason: response.finish_reason,
        });
    }

    let prompt = parse_generated_prompt(&response.content);
    info!(
        provider = %settings.provider,
        finish_reason = %response.finish_reason,
        content_len = response.content.len(),
        acceptance_criteria = prompt.acceptance_criteria.len(),
        structured = prompt.has_structure(),
        "completion parsed"
    );
    Ok(prompt)
}
