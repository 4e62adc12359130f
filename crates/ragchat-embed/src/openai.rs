use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ragchat_core::config::EmbeddingConfig;
use ragchat_core::traits::Embedder;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    usage: Option<EmbeddingUsage>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingUsage {
    prompt_tokens: u32,
    total_tokens: u32,
}

/// Client for an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dim: usize,
    id: String,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            dim: config.dimension,
            id: format!("openai:{}:d{}", config.model, config.dimension),
        })
    }

    /// Place each vector at its `index`; every input slot must be filled exactly once.
    fn reorder(&self, data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
        if data.len() != expected {
            bail!(
                "embedding API returned {} vectors for {} inputs",
                data.len(),
                expected
            );
        }
        let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
        for item in data {
            if item.embedding.len() != self.dim {
                bail!(
                    "embedding dim mismatch: expected {}, got {}",
                    self.dim,
                    item.embedding.len()
                );
            }
            match slots.get_mut(item.index) {
                None => bail!("embedding index {} out of range", item.index),
                Some(Some(_)) => bail!("embedding index {} returned twice", item.index),
                Some(slot) => *slot = Some(item.embedding),
            }
        }
        // equal lengths and no duplicates leave no gaps
        Ok(slots.into_iter().flatten().collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .context("embedding request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            bail!("Embedding API error: {status} - {error_text}");
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .context("invalid embedding response")?;
        if let Some(usage) = &body.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                total_tokens = usage.total_tokens,
                "embedding usage"
            );
        }
        self.reorder(body.data, texts.len())
    }
}
