//! Embedding providers.
//!
//! `OpenAiEmbedder` calls an OpenAI-compatible `/embeddings` endpoint.
//! `FakeEmbedder` hashes tokens into a fixed-size vector and never touches the
//! network; `APP_USE_FAKE_EMBEDDINGS=1` selects it regardless of configuration.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use ragchat_core::config::{EmbeddingConfig, EmbeddingProvider};
use ragchat_core::traits::Embedder;

mod fake;
mod openai;

pub use fake::FakeEmbedder;
pub use openai::OpenAiEmbedder;

pub fn get_default_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake || config.provider == EmbeddingProvider::Fake {
        tracing::info!(dim = config.dimension, "using fake embedder");
        return Ok(Arc::new(FakeEmbedder::new(config.dimension)));
    }
    let api_key = config.resolved_api_key().ok_or_else(|| {
        anyhow!("embedding provider 'openai' requires embedding.api_key or OPENAI_API_KEY")
    })?;
    let embedder =
        OpenAiEmbedder::new(config, api_key).context("failed to build embedding client")?;
    tracing::info!(model = %config.model, dim = config.dimension, "using OpenAI embedder");
    Ok(Arc::new(embedder))
}
