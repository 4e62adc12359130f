use std::sync::Arc;

use ragchat_core::config::{GenerationConfig, HistoryPolicy, DEFAULT_SYSTEM_PROMPT};
use ragchat_core::traits::{Generator, VectorIndex};
use ragchat_core::types::{HistoryEntry, QueryResponse};
use ragchat_core::{Error, Result};

use crate::prompt::build_messages;

/// Retrieve, ground, generate. Holds shared handles only, so one engine
/// serves concurrent requests.
pub struct QueryEngine {
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn Generator>,
    system_prompt: String,
    history_policy: HistoryPolicy,
}

impl QueryEngine {
    pub fn new(index: Arc<dyn VectorIndex>, generator: Arc<dyn Generator>) -> Self {
        Self {
            index,
            generator,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            history_policy: HistoryPolicy::Ignore,
        }
    }

    pub fn from_config(
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn Generator>,
        config: &GenerationConfig,
    ) -> Self {
        Self::new(index, generator)
            .with_system_prompt(config.system_prompt.clone())
            .with_history_policy(config.history)
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_history_policy(mut self, policy: HistoryPolicy) -> Self {
        self.history_policy = policy;
        self
    }

    pub async fn answer(
        &self,
        question: &str,
        history: &[HistoryEntry],
        k: usize,
    ) -> Result<QueryResponse> {
        if k == 0 {
            return Err(Error::Validation("k must be at least 1".to_string()));
        }

        let mut results = self
            .index
            .query(&[question.to_string()], k)
            .await
            .map_err(|e| Error::retrieval(&e))?;
        if results.len() != 1 {
            return Err(Error::Retrieval(format!(
                "expected 1 result list, got {}",
                results.len()
            )));
        }
        let mut hits = results.remove(0);
        hits.truncate(k);
        let sources: Vec<String> = hits.into_iter().map(|h| h.text).collect();
        tracing::debug!(k, retrieved = sources.len(), "retrieved context");

        let messages = build_messages(
            &self.system_prompt,
            question,
            &sources,
            history,
            self.history_policy,
        );
        let completion = self
            .generator
            .complete(&messages)
            .await
            .map_err(|e| Error::generation(&e))?;
        let answer = completion.trim();
        if answer.is_empty() {
            return Err(Error::Generation(format!(
                "model {} returned an empty completion",
                self.generator.model()
            )));
        }

        Ok(QueryResponse {
            answer: answer.to_string(),
            sources,
        })
    }
}
