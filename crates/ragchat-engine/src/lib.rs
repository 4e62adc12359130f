//! Ingestion and question answering on top of the collaborator traits in
//! `ragchat-core`.

pub mod engine;
pub mod llm;
pub mod loader;
pub mod prompt;

pub use engine::QueryEngine;
pub use llm::OpenAiChatClient;
pub use loader::{CorpusLoader, LoadOutcome};
