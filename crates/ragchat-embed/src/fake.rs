use std::hash::{Hash, Hasher};

use anyhow::Result;
use async_trait::async_trait;
use twox_hash::XxHash64;

use ragchat_core::traits::Embedder;

/// Deterministic bag-of-words embedder for tests and offline development.
///
/// Each lowercase alphanumeric token adds 1.0 to the bucket its hash selects;
/// the result is L2-normalized, so texts sharing more words score closer.
pub struct FakeEmbedder {
    dim: usize,
    id: String,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            id: format!("fake:xxhash:d{dim}"),
        }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty());
        for token in tokens {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let idx = (hasher.finish() % self.dim as u64) as usize;
            v[idx] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
