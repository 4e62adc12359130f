use std::path::PathBuf;
use std::sync::Arc;

use ragchat_core::corpus::{read_corpus, split_corpus};
use ragchat_core::traits::VectorIndex;
use ragchat_core::{Error, Result};

/// What `CorpusLoader::load` did to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The index is populated and carries a completion marker; left untouched.
    Skipped { count: usize },
    /// An empty index was populated from the corpus.
    Ingested { count: usize },
    /// Rows without a completion marker were discarded and the corpus ingested again.
    Rebuilt { count: usize },
}

/// Populates a vector index from a blank-line separated corpus file, once.
pub struct CorpusLoader {
    corpus_path: PathBuf,
}

impl CorpusLoader {
    pub fn new(corpus_path: impl Into<PathBuf>) -> Self {
        Self {
            corpus_path: corpus_path.into(),
        }
    }

    /// Load if needed and hand the index back for the query engine.
    pub async fn ensure_loaded(
        &self,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Arc<dyn VectorIndex>> {
        self.load(index.as_ref()).await?;
        Ok(index)
    }

    /// Skips only a non-empty index with a completion marker. An empty index is
    /// always (re)ingested; rows without a marker are a partial ingestion and
    /// are cleared first.
    pub async fn load(&self, index: &dyn VectorIndex) -> Result<LoadOutcome> {
        let marker = index
            .ingest_marker()
            .await
            .map_err(|e| Error::ingestion(&e))?;
        let existing = index.count().await.map_err(|e| Error::ingestion(&e))?;

        if existing > 0 {
            if let Some(marker) = marker {
                self.warn_if_changed(&marker);
                tracing::info!(
                    count = existing,
                    "vector index already populated, skipping ingestion"
                );
                return Ok(LoadOutcome::Skipped { count: existing });
            }
        }

        let text = read_corpus(&self.corpus_path)?;
        let chunks = split_corpus(&text);

        if existing > 0 {
            tracing::warn!(
                existing,
                "index has rows but no completion marker, rebuilding"
            );
            index.clear().await.map_err(|e| Error::ingestion(&e))?;
        }

        if !chunks.is_empty() {
            let (ids, documents): (Vec<String>, Vec<String>) =
                chunks.into_iter().map(|c| (c.id, c.text)).unzip();
            index
                .add(&ids, &documents)
                .await
                .map_err(|e| Error::ingestion(&e))?;
        }
        index
            .mark_ingested(&corpus_digest(&text))
            .await
            .map_err(|e| Error::ingestion(&e))?;

        let count = index.count().await.map_err(|e| Error::ingestion(&e))?;
        tracing::info!(count, corpus = %self.corpus_path.display(), "ingested corpus");
        if existing > 0 {
            Ok(LoadOutcome::Rebuilt { count })
        } else {
            Ok(LoadOutcome::Ingested { count })
        }
    }

    fn warn_if_changed(&self, marker: &str) {
        if let Ok(text) = read_corpus(&self.corpus_path) {
            if corpus_digest(&text) != marker {
                tracing::warn!(
                    corpus = %self.corpus_path.display(),
                    "corpus changed since ingestion; keeping the existing index"
                );
            }
        }
    }
}

fn corpus_digest(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}
