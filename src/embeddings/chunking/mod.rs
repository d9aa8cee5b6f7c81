#[cfg(test)]
mod tests;

use std::sync::LazyLock;

use fancy_regex::Regex;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{RagError, Result};

/// A run of sentence terminators followed by whitespace
static SENTENCE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[.!?]+\s+").expect("sentence boundary pattern is a valid regex")
});

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Configuration for splitting documents into chunks.
///
/// Both sizes are measured in characters, not bytes or tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target upper bound for the length of a chunk
    pub chunk_size: usize,
    /// Number of trailing characters of a chunk repeated at the head of the next one
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    #[inline]
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = Self {
            chunk_size,
            chunk_overlap,
        };
        config.validate()?;
        Ok(config)
    }

    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::InvalidChunking(
                "chunk size must be greater than zero".to_string(),
            ));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::InvalidChunking(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        Ok(())
    }

    /// Split `text` with this configuration
    #[inline]
    pub fn split(&self, text: &str) -> Result<Vec<String>> {
        split_text(text, self.chunk_size, self.chunk_overlap)
    }
}

/// Collapse every whitespace run (newlines, form feeds and carriage returns included)
/// into a single space and trim both ends.
#[inline]
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().join(" ")
}

/// Split text into overlapping, sentence-aligned chunks.
///
/// Sentences are accumulated greedily until the next one would push the chunk past
/// `chunk_size`. Every new chunk after the first starts with the last `chunk_overlap`
/// characters of the previous one, cut forward to a word boundary. Each sentence is
/// written back terminated by `". "` whatever its original punctuation was.
///
/// Whitespace-only input produces no chunks.
#[inline]
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<String>> {
    ChunkingConfig {
        chunk_size,
        chunk_overlap,
    }
    .validate()?;

    let normalized = normalize_text(text);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in split_sentences(&normalized) {
        let sentence_len = sentence.chars().count();

        if current_len + sentence_len > chunk_size && !current.is_empty() {
            chunks.push(current.trim().to_string());

            current = overlap_seed(&current, chunk_overlap).to_string();
            current_len = current.chars().count();
        }

        current.push_str(sentence);
        current.push_str(". ");
        current_len += sentence_len + 2;
    }

    let last = current.trim();
    if !last.is_empty() {
        chunks.push(last.to_string());
    }

    debug!(
        "Split {} bytes into {} chunks (size {}, overlap {})",
        normalized.len(),
        chunks.len(),
        chunk_size,
        chunk_overlap
    );

    Ok(chunks)
}

/// Break normalized text into trimmed, non-empty sentence units
fn split_sentences(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // A plain character class never exhausts the backtracking limit
        let Ok(boundary) = boundary else {
            break;
        };
        units.push(text.get(start..boundary.start()).unwrap_or_default());
        start = boundary.end();
    }
    units.push(text.get(start..).unwrap_or_default());

    units
        .into_iter()
        .map(|unit| unit.trim().trim_end_matches(SENTENCE_TERMINATORS).trim_end())
        .filter(|unit| !unit.is_empty())
        .collect()
}

/// Text carried over from a closed chunk into the next one.
///
/// Chunks no longer than `overlap` are carried over whole. Otherwise the last `overlap`
/// characters are taken and everything up to and including the first space inside them
/// is dropped, so the seed does not begin mid-word.
fn overlap_seed(chunk: &str, overlap: usize) -> &str {
    let total = chunk.chars().count();
    if total <= overlap {
        return chunk;
    }

    let start = chunk
        .char_indices()
        .nth(total - overlap)
        .map_or(chunk.len(), |(index, _)| index);
    let tail = chunk.get(start..).unwrap_or_default();

    match tail.find(' ') {
        Some(space) if space > 0 => tail.get(space + 1..).unwrap_or_default(),
        _ => tail,
    }
}
