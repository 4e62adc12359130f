//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_RETRIEVAL__K=5`).
//! The environment name comes from `RUST_ENV` and defaults to `dev`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::Error;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "Answer the user's question based only on the provided context. \
     If the context does not contain the answer, say that you don't know.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub corpus: CorpusConfig,
    pub index: IndexConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub retrieval: RetrievalConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub path: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: "data/source.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// LanceDB storage directory.
    pub path: String,
    pub table: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: "data/index".to_string(),
            table: "docs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    OpenAi,
    Fake,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub dimension: usize,
    /// Maximum number of texts per embedding request.
    pub batch_size: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAi,
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            dimension: 1536,
            batch_size: 256,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref())
    }
}

/// What to do with the conversation history a client sends along.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryPolicy {
    /// Accepted and not used for retrieval or prompting.
    #[default]
    Ignore,
    /// Prior turns become chat messages ahead of the grounded question.
    Fold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_prompt: String,
    pub history: HistoryPolicy,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            timeout_secs: 120,
            temperature: None,
            max_tokens: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            history: HistoryPolicy::Ignore,
        }
    }
}

impl GenerationConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { k: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors: false,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_for_env(None)
    }

    pub fn load_for_env(env: Option<&str>) -> anyhow::Result<Self> {
        let env_name = match env {
            Some(e) => e.to_string(),
            None => env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string()),
        };
        let config: Self = Self::figment(&env_name)
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn figment(env_name: &str) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment.merge(Env::prefixed("APP_").split("__"))
    }

    pub fn validate_for_env(&self, env: &str) -> Result<(), Error> {
        if self.retrieval.k == 0 {
            return Err(Error::InvalidConfig("retrieval.k must be at least 1".to_string()));
        }
        if self.embedding.dimension == 0 {
            return Err(Error::InvalidConfig("embedding.dimension must be at least 1".to_string()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be at least 1".to_string()));
        }
        let production = matches!(env, "prod" | "production");
        if production && self.embedding.provider == EmbeddingProvider::Fake {
            return Err(Error::InvalidConfig(
                "the fake embedding provider is not allowed in production".to_string(),
            ));
        }
        Ok(())
    }

    pub fn corpus_path(&self) -> PathBuf {
        expand_path(&self.corpus.path)
    }

    pub fn index_path(&self) -> PathBuf {
        expand_path(&self.index.path)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Section key first, then `OPENAI_API_KEY`. Empty values count as unset.
fn resolve_api_key(configured: Option<&str>) -> Option<String> {
    let non_empty = |k: &String| !k.trim().is_empty();
    configured
        .map(str::to_string)
        .filter(non_empty)
        .or_else(|| env::var("OPENAI_API_KEY").ok().filter(non_empty))
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
