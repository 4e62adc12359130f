use std::sync::Arc;

use anyhow::{Context, Result};

use ragchat_core::config::AppConfig;
use ragchat_core::traits::VectorIndex;
use ragchat_embed::get_default_embedder;
use ragchat_engine::{CorpusLoader, LoadOutcome, OpenAiChatClient, QueryEngine};
use ragchat_vector::LanceVectorIndex;

pub async fn open_index(config: &AppConfig) -> Result<Arc<dyn VectorIndex>> {
    let embedder = get_default_embedder(&config.embedding)?;
    let index_path = config.index_path();
    let index = LanceVectorIndex::open(
        &index_path,
        &config.index.table,
        embedder,
        config.embedding.batch_size,
    )
    .await
    .with_context(|| format!("failed to open vector index at {}", index_path.display()))?;
    Ok(Arc::new(index))
}

/// Run the loader once and report what it did.
pub async fn ingest(config: &AppConfig) -> Result<LoadOutcome> {
    let index = open_index(config).await?;
    let loader = CorpusLoader::new(config.corpus_path());
    Ok(loader.load(index.as_ref()).await?)
}

/// Ingestion failures surface here, before any traffic is accepted.
pub async fn build_engine(config: &AppConfig) -> Result<QueryEngine> {
    let index = CorpusLoader::new(config.corpus_path())
        .ensure_loaded(open_index(config).await?)
        .await?;
    let generator = OpenAiChatClient::from_config(&config.generation)?;
    Ok(QueryEngine::from_config(
        index,
        Arc::new(generator),
        &config.generation,
    ))
}
