use crate::completion::CompletionBackend;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Marker the model replies with when it will not draft a command.
pub const REFUSAL_SENTINEL: &str = "UNSAFE COMMAND REQUEST";

const SHELL_EXPERT_PROMPT: &str = "You are a Linux shell expert. Convert user requests into appropriate shell commands.
Only provide the shell commands, no explanations. Commands must be safe and non-destructive.
Do not surround your response with ``` or ```bash. Just return the command, for instance \"ls -l /\".
For example, if the user request is \"show content of folder ~/\", return \"ls -lha ~/\".
If a request could be dangerous, respond with 'UNSAFE COMMAND REQUEST'.
Use the command output and conversation history to provide better commands.";

/// What the generator produced for a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// One or more newline-separated candidate commands.
    Command(String),
    /// The request was judged unsafe; there is no command.
    Refused,
}

#[async_trait]
pub trait CommandGenerator: Send + Sync {
    /// Drafts a command from the rendered conversation history.
    async fn generate(&self, context: &str) -> Result<Generation>;
}

/// Generator backed by a completion model.
pub struct LlmGenerator {
    backend: Arc<dyn CompletionBackend>,
}

impl LlmGenerator {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl CommandGenerator for LlmGenerator {
    async fn generate(&self, context: &str) -> Result<Generation> {
        info!("Generating command...");
        let reply = self.backend.complete(SHELL_EXPERT_PROMPT, context).await?;
        let generation = parse_generation(&reply)?;
        info!("Generated: {:?}", generation);
        Ok(generation)
    }
}

/// Turns a raw model reply into a [`Generation`].
///
/// Code fences are stripped because models add them despite being told not to.
pub fn parse_generation(reply: &str) -> Result<Generation> {
    if is_refusal(reply) {
        warn!("Generator refused the request");
        return Ok(Generation::Refused);
    }

    let command = strip_code_fences(reply);
    if command.is_empty() {
        return Err(anyhow!("Generator returned an empty command"));
    }

    Ok(Generation::Command(command))
}

/// True when some line of `text` is the refusal sentinel on its own.
///
/// Surrounding quotes and punctuation are ignored, as is case. A command
/// that merely mentions the phrase, such as a `grep` for it, is not a refusal.
pub fn is_refusal(text: &str) -> bool {
    text.lines().any(|line| {
        line.trim_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .eq_ignore_ascii_case(REFUSAL_SENTINEL)
    })
}

fn strip_code_fences(reply: &str) -> String {
    reply
        .trim()
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Deterministic generator used in mock mode.
///
/// Picks a command from keywords in the opening request so the whole
/// workflow can be exercised without a model server.
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn mock_generate(&self, context: &str) -> Generation {
        let context = context.to_lowercase();
        let request = context.lines().next().unwrap_or_default();

        if ["delete everything", "rm -rf /", "format", "wipe"]
            .iter()
            .any(|danger| request.contains(danger))
        {
            return Generation::Refused;
        }

        let command = if context.contains("command output:") {
            "echo 'Output received'"
        } else if request.contains("folder") || request.contains("list") {
            "ls -lha ~/"
        } else if request.contains("disk") {
            "df -h"
        } else if request.contains("process") {
            "ps aux"
        } else if request.contains("date") || request.contains("time") {
            "date"
        } else {
            "echo 'Hello from shell-commander'"
        };

        Generation::Command(command.to_string())
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandGenerator for MockGenerator {
    async fn generate(&self, context: &str) -> Result<Generation> {
        Ok(self.mock_generate(context))
    }
}
