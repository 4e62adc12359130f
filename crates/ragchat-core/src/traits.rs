use async_trait::async_trait;

use crate::types::{ChatMessage, RetrievedChunk};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-3-small:d1536`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    /// One vector per input text, in input order.
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Persistent `id -> (text, embedding)` collection. Embeddings are computed
/// internally by the index's configured embedder.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn count(&self) -> anyhow::Result<usize>;

    /// Store new entries. `ids` and `documents` must have equal length.
    async fn add(&self, ids: &[String], documents: &[String]) -> anyhow::Result<()>;

    /// For each query text, up to `n_results` documents ordered nearest first.
    async fn query(
        &self,
        query_texts: &[String],
        n_results: usize,
    ) -> anyhow::Result<Vec<Vec<RetrievedChunk>>>;

    /// Digest recorded by the last completed ingestion, if any.
    async fn ingest_marker(&self) -> anyhow::Result<Option<String>>;

    async fn mark_ingested(&self, digest: &str) -> anyhow::Result<()>;

    /// Remove every stored entry and the completion marker.
    async fn clear(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait Generator: Send + Sync {
    fn model(&self) -> &str;
    /// A single completion for the given turns, untrimmed.
    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String>;
}
