//! Groq chat-completion client
//!
//! Speaks the OpenAI-compatible `chat/completions` protocol.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::config::Settings;
use crate::error::AssistantError;
use crate::Result;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

/// Role of a message in a chat-completion conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A remote model that turns a conversation into text
#[async_trait::async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// False when a call is certain to fail for lack of credentials.
    /// Agents check this before touching any other upstream.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Run a completion and fold any failure into user-visible text.
pub async fn complete_or_message(llm: &dyn ChatCompletion, messages: &[ChatMessage]) -> String {
    match llm.complete(messages).await {
        Ok(answer) => answer,
        Err(e) => {
            warn!("Chat completion failed: {}", e);
            e.user_message()
        }
    }
}

/// Reusable Groq client (connection-pooled)
pub struct GroqClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl GroqClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(settings.http_timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: settings.groq_api_key.clone(),
            base_url: settings.groq_base_url.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait::async_trait]
impl ChatCompletion for GroqClient {
    fn is_configured(&self) -> bool {
        self.has_api_key()
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AssistantError::MissingCredential);
        };

        let request = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        info!(model = %self.model, messages = messages.len(), "Calling Groq API");

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Groq API request failed: {}", e);
                AssistantError::LlmNetwork(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Groq API error response ({}): {}", status, body);
            return Err(classify_status(status, body));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Groq response: {}", e);
            AssistantError::LlmMalformed(e.to_string())
        })?;

        let answer = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AssistantError::LlmMalformed("response has no choices".to_string()))?;

        info!("Groq response received ({} chars)", answer.len());

        Ok(answer)
    }
}

fn classify_status(status: StatusCode, body: String) -> AssistantError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AssistantError::LlmAuth(body),
        StatusCode::TOO_MANY_REQUESTS => AssistantError::LlmRateLimited(body),
        _ => AssistantError::LlmUpstream {
            status: status.as_u16(),
            body,
        },
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}
