use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the loader and the query engine.
///
/// Collaborators (embedder, vector index, generator) report `anyhow` errors;
/// they are folded into one of these variants at the component boundary so
/// the façade can tell an ingestion problem from a retrieval or generation one.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read corpus {}: {source}", .path.display())]
    Corpus {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Invalid request: {0}")]
    Validation(String),
}

impl Error {
    /// Wrap a collaborator error, keeping its whole context chain in the message.
    pub fn ingestion(err: &anyhow::Error) -> Self {
        Self::Ingestion(format!("{err:#}"))
    }

    pub fn retrieval(err: &anyhow::Error) -> Self {
        Self::Retrieval(format!("{err:#}"))
    }

    pub fn generation(err: &anyhow::Error) -> Self {
        Self::Generation(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
