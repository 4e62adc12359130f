use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ragchat_core::config::GenerationConfig;
use ragchat_core::traits::Generator;
use ragchat_core::types::ChatMessage;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    n: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint. One request
/// per call, no retries.
pub struct OpenAiChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl OpenAiChatClient {
    pub fn new(config: &GenerationConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let api_key = config
            .resolved_api_key()
            .context("generation requires generation.api_key or OPENAI_API_KEY")?;
        Self::new(config, api_key)
    }
}

#[async_trait]
impl Generator for OpenAiChatClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let started = Instant::now();
        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            n: 1,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("chat completion timed out after {:?}", started.elapsed())
                } else {
                    anyhow::Error::new(e).context("chat completion request failed")
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            bail!("Chat completion API error: {status} - {error_text}");
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .context("invalid chat completion response")?;
        if let Some(usage) = &body.usage {
            tracing::info!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "chat completion"
            );
        }
        let Some(choice) = body.choices.into_iter().next() else {
            bail!("no choices returned from chat completion API");
        };
        Ok(choice.message.content.unwrap_or_default())
    }
}
