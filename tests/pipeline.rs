use std::cell::RefCell;

use promptforge::agent::CustomAgent;
use promptforge::completion::{
    CompletionClient, CompletionRequest, CompletionResponse, GenerationSettings, Role,
    UserLibrary, generate,
};
use promptforge::error::ForgeError;
use promptforge::guidelines::ProviderType;
use promptforge::prompt::{BLOCK_DELIMITER, GenerationRequest, HEBREW_INPUT_NOTE};
use promptforge::response::format_prompt_for_copy;
use promptforge::tweaks::{CustomTweak, SelectedTweaks, suggest_tweaks};

struct ScriptedClient {
    content: String,
    seen: RefCell<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    fn new(content: &str) -> Self {
        Self {
            content: content.to_owned(),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl CompletionClient for ScriptedClient {
    fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        self.seen.borrow_mut().push(request.clone());
        Ok(CompletionResponse {
            content: self.content.clone(),
            finish_reason: "stop".to_owned(),
            usage: None,
        })
    }
}

const COMPLETION: &str = "\
**Goal:** Make the mobile login button submit the form

**Current behavior (BROKEN):**
Tapping Login on iOS Safari does nothing.

**Expected behavior:**
The form submits and the user lands on the dashboard.

**Acceptance criteria:**
- Tapping Login submits the form on iOS Safari
- Desktop login keeps working

**Constraints:**
- Do not change the auth provider";

fn request(input: &str, agent: &str) -> GenerationRequest {
    GenerationRequest {
        input: input.to_owned(),
        agent: agent.to_owned(),
        length: "standard".to_owned(),
        strategy: "implement".to_owned(),
        ask_clarifying_questions: false,
        project_context: Some("React Native app, Expo SDK 50".to_owned()),
        tweaks: None,
    }
}

#[test]
fn builtin_agent_round_trip() {
    let client = ScriptedClient::new(COMPLETION);
    let settings = GenerationSettings {
        provider: ProviderType::Anthropic,
        temperature: 0.2,
    };

    let prompt = generate(
        &client,
        request("The login button does nothing on mobile Safari", "claude-code"),
        UserLibrary::default(),
        &settings,
    )
    .expect("generation should succeed");

    assert_eq!(prompt.goal, "Make the mobile login button submit the form");
    assert_eq!(
        prompt.current_behavior.as_deref(),
        Some("Tapping Login on iOS Safari does nothing.")
    );
    assert_eq!(prompt.acceptance_criteria.len(), 2);
    assert_eq!(
        prompt.constraints.as_deref(),
        Some(&["Do not change the auth provider".to_owned()][..])
    );
    assert_eq!(prompt.full_prompt, COMPLETION);

    let seen = client.seen.borrow();
    assert_eq!(seen.len(), 1);
    let sent = &seen[0];
    assert_eq!(sent.max_tokens, 2048);
    assert_eq!(sent.messages[0].role, Role::System);
    assert_eq!(sent.messages[1].role, Role::User);

    let system = &sent.messages[0].content;
    let blocks: Vec<&str> = system.split(BLOCK_DELIMITER).collect();
    assert!(
        blocks.iter().any(|b| b.starts_with("AGENT: Claude Code")),
        "expected Claude Code dialect block, got: {blocks:#?}"
    );
    assert_eq!(
        blocks.last().copied(),
        Some("React Native app, Expo SDK 50"),
        "project context is the last block"
    );

    let copy = format_prompt_for_copy(&prompt);
    assert!(copy.starts_with("**Goal:**\nMake the mobile login button"), "got: {copy}");
    assert!(copy.contains("- Desktop login keeps working"), "got: {copy}");
}

#[test]
fn custom_agent_and_tweaks_flow_into_the_system_prompt() {
    let mut agent = CustomAgent::new("u1", "Team Bot");
    agent.tone = Some("Blunt".to_owned());
    let tweak = CustomTweak::new("u1", "Use pnpm", "pnpm", "Use pnpm for every package command.");

    let mut tweaks = SelectedTweaks::default();
    tweaks.toggle_skill("testing");
    tweaks.toggle_custom(tweak.id);

    let mut req = request("Add a settings page for notification preferences", "");
    req.agent = agent.agent_id().to_string();
    req.tweaks = Some(tweaks);

    let agents = vec![agent];
    let custom_tweaks = vec![tweak];
    let client = ScriptedClient::new(COMPLETION);
    generate(
        &client,
        req,
        UserLibrary {
            custom_agents: &agents,
            custom_tweaks: &custom_tweaks,
        },
        &GenerationSettings::default(),
    )
    .expect("generation should succeed");

    let system = client.seen.borrow()[0].messages[0].content.clone();
    assert!(system.contains("AGENT: Team Bot"), "got: {system}");
    assert!(system.contains("- Tone: Blunt"), "got: {system}");
    assert!(system.contains("ACTIVE TWEAKS:"), "got: {system}");
    assert!(system.contains("CUSTOM TWEAK: Use pnpm"), "got: {system}");
    assert!(
        !system.contains("PROVIDER GUIDELINES"),
        "custom agents get no guideline block, got: {system}"
    );
}

#[test]
fn hebrew_input_is_flagged_for_translation() {
    let client = ScriptedClient::new(COMPLETION);
    generate(
        &client,
        request("כפתור ההתחברות לא עובד במובייל", "cursor"),
        UserLibrary::default(),
        &GenerationSettings::default(),
    )
    .expect("generation should succeed");

    let user = client.seen.borrow()[0].messages[1].content.clone();
    assert!(user.starts_with(HEBREW_INPUT_NOTE), "got: {user}");
}

#[test]
fn conflicting_tweaks_fail_validation_without_a_call() {
    let client = ScriptedClient::new(COMPLETION);
    let mut req = request("Rework the profile page layout for tablets", "cursor");
    req.tweaks = Some(SelectedTweaks {
        behaviors: vec!["minimal-changes".to_owned(), "full-rewrite".to_owned()],
        ..SelectedTweaks::default()
    });

    let err = generate(&client, req, UserLibrary::default(), &GenerationSettings::default())
        .unwrap_err();
    assert!(
        matches!(err, ForgeError::Validation { .. }),
        "expected Validation, got: {err:?}"
    );
    assert!(err.to_string().contains("conflicts with"), "got: {err}");
    assert!(client.seen.borrow().is_empty(), "no completion call on invalid input");
}

#[test]
fn suggestions_feed_a_valid_selection() {
    let suggestions = suggest_tweaks(
        "The dashboard is slow and there are no tests for the chart component",
        None,
        3,
    );
    let ids: Vec<&str> = suggestions.iter().map(|s| s.tweak_id).collect();
    assert!(ids.contains(&"performance"), "got: {ids:?}");
    assert!(ids.contains(&"testing"), "got: {ids:?}");
}
