//! OpenAI-compatible chat completion client.

use arklife_core::{CompletionError, CompletionModel};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Connection and sampling settings for a [`ChatClient`].
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Model identifier sent with each request
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Base URL; `/chat/completions` is appended
    pub api_base: String,
    /// Bearer token
    pub api_key: String,
    /// Whole-request timeout
    pub timeout: Duration,
}

/// Chat completion client sending the prompt as a single user message.
#[derive(Debug, Clone)]
pub struct ChatClient {
    settings: ChatSettings,
    client: Client,
}

impl ChatClient {
    /// Create a new client.
    pub fn new(mut settings: ChatSettings) -> Result<Self, CompletionError> {
        if settings.api_key.trim().is_empty() {
            return Err(CompletionError::MissingApiKey);
        }
        settings.api_base = settings.api_base.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| CompletionError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { settings, client })
    }

    /// Settings in use.
    #[must_use]
    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }
}

#[async_trait]
impl CompletionModel for ChatClient {
    fn model_name(&self) -> &str {
        &self.settings.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let start_time = Instant::now();

        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.settings.temperature,
            stream: false,
        };

        info!(
            "Sending prompt to {} ({} chars)",
            self.settings.model,
            prompt.chars().count()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.settings.api_base))
            .header("Authorization", format!("Bearer {}", self.settings.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Completion API error {}: {}", status, body);
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Transport(format!("invalid response body: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::EmptyResponse)?;

        if let Some(usage) = parsed.usage {
            debug!(
                "Token usage: {} prompt, {} completion",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        info!(
            "Received completion in {:?} ({} chars)",
            start_time.elapsed(),
            choice.message.content.chars().count()
        );

        Ok(choice.message.content)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
