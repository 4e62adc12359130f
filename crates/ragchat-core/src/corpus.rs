//! Corpus reading and paragraph chunking.
//!
//! The corpus is a single UTF-8 file whose unit of retrieval is the paragraph:
//! text separated by a blank line (two consecutive newlines).

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::Chunk;

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Read the whole corpus. A missing, unreadable or non-UTF-8 file is an error.
pub fn read_corpus(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Corpus {
        path: path.to_path_buf(),
        source,
    })
}

/// Split on blank lines, trim each paragraph and drop the empty ones.
/// Ids are assigned sequentially from `"0"` in document order.
pub fn split_corpus(text: &str) -> Vec<Chunk> {
    let normalized = text.replace("\r\n", "\n");
    normalized
        .split(PARAGRAPH_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .enumerate()
        .map(|(i, p)| Chunk {
            id: i.to_string(),
            text: p.to_string(),
        })
        .collect()
}
