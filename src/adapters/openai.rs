use crate::config::toml_config::OutreachConfig;
use crate::core::{CompletionRequest, TextGenerator};
use crate::utils::error::{OutreachError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI 相容的 chat completions 端點
pub struct OpenAiGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        })
    }

    pub fn from_config(config: &OutreachConfig) -> Result<Self> {
        let api_key = config.api_key();
        if api_key.is_none() {
            tracing::warn!(
                "⚠️ No API key found (generation.api_key or OPENAI_API_KEY); every email will use the template"
            );
        }
        Self::new(
            config.generation.endpoint.clone(),
            config.generation.model.clone(),
            api_key,
            config.generation_timeout(),
        )
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| OutreachError::GenerationError {
                message: "no API key configured".to_string(),
            })?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        tracing::debug!("Making completion request to: {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Completion response status: {}", status);

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OutreachError::GenerationError {
                message: format!("API returned status code {}: {}", status.as_u16(), text),
            });
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| OutreachError::GenerationError {
                    message: format!("malformed completion response: {}", e),
                })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OutreachError::GenerationError {
                message: "completion response contained no choices".to_string(),
            })
    }
}
