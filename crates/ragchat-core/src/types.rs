//! Domain types shared by the loader, the vector index and the query engine.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// A paragraph of the corpus, stored and retrieved as one document.
///
/// - `id`: sequential position in the corpus (`"0"`, `"1"`, ...), stable across runs
/// - `text`: trimmed, never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
}

/// One nearest-neighbor hit. `distance` is the store's cosine distance,
/// lower is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: ChunkId,
    pub text: String,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single turn sent to the generation model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A prior conversation turn as supplied by the client.
///
/// Plain strings are positional (user, assistant, user, ...). The chat widget
/// posts `{role, content}` objects, which keep their explicit role; a client
/// `system` turn is folded in as a `user` turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryEntry {
    Text(String),
    Turn { role: Role, content: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(rename = "query")]
    pub question: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// `sources` holds the retrieved chunk texts in rank order, nearest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<String>,
}
