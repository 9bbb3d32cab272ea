//! Completion backends: the language model behind generator and reviewer.
//!
//! Both collaborators speak to the same kind of server with different system
//! prompts, so the backend only knows about "system prompt + input in, text out".

use crate::http_client::HttpClient;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Returns the model's raw reply to `input` under `system_prompt`.
    async fn complete(&self, system_prompt: &str, input: &str) -> Result<String>;
}

/// Backend for servers exposing the Ollama `/api/generate` endpoint.
pub struct OllamaBackend {
    http: Arc<dyn HttpClient>,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaBackend {
    pub fn new(
        http: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
            temperature,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    async fn complete(&self, system_prompt: &str, input: &str) -> Result<String> {
        let request_body = json!({
            "model": self.model,
            "system": system_prompt,
            "prompt": input,
            "stream": false,
            "options": {
                "temperature": self.temperature
            }
        });

        info!("Requesting completion from model '{}'", self.model);
        let reply = self.http.post_json(&self.endpoint(), &request_body).await?;
        debug!("Completion reply: {}", reply);

        if let Some(error) = reply.get("error").and_then(|e| e.as_str()) {
            return Err(anyhow!("completion server error: {}", error));
        }

        reply
            .get("response")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("completion reply has no 'response' field: {}", reply))
    }
}
