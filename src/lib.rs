use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid chunking parameters: {0}")]
    InvalidChunking(String),

    #[error("Document '{document_id}' contains no indexable text")]
    EmptyContent { document_id: String },

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Timed out after {timeout:?} waiting for {operation}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Vector index is not available")]
    IndexUnavailable,

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl RagError {
    /// Stable, machine-readable name of the error kind
    #[inline]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::InvalidChunking(_) => "invalid_chunking",
            Self::EmptyContent { .. } => "empty_content",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::Embedding(_) => "embedding",
            Self::Generation(_) => "generation",
            Self::Timeout { .. } => "timeout",
            Self::IndexUnavailable => "index_unavailable",
            Self::InvalidQuestion(_) => "invalid_question",
            Self::Io(_) => "io",
            Self::Other(_) => "internal",
        }
    }
}

pub mod chat;
pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod http;
pub mod retrieval;
pub mod server;
