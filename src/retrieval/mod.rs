// Retrieval module
// Ingestion (chunk, embed, store) and question answering over the vector index


use std::sync::Arc;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chat::{ChatModel, chat_model_from_config};
use crate::config::Config;
use crate::database::{ChunkPayload, InMemoryIndex, SearchHit, VectorIndex, VectorRecord};
use crate::embeddings::{ChunkingConfig, Embedder, embedder_from_config};
use crate::http::JsonClient;
use crate::{RagError, Result};

/// Answer returned when no stored chunk matches the question
pub const NO_RELEVANT_INFORMATION: &str =
    "I couldn't find any relevant information in the uploaded documents to answer your question.";

pub const DEFAULT_TOP_K: usize = 5;

/// Longest question accepted, in characters
pub const MAX_QUESTION_CHARS: usize = 1000;

const CITATION_CHARS: usize = 100;

/// Outcome of ingesting one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub document_id: String,
    pub chunk_count: usize,
    pub ingested_at: DateTime<Utc>,
}

/// Generated answer together with the context it was based on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub answer: String,
    /// Full text of every chunk passed to the model, best match first
    pub sources: Vec<String>,
    /// Sources shortened for display
    pub citations: Vec<String>,
}

impl Answer {
    fn from_sources(answer: String, sources: Vec<String>) -> Self {
        let citations = sources.iter().map(|source| citation(source)).collect();
        Self {
            answer,
            sources,
            citations,
        }
    }
}

/// Orchestrates the embedder, the vector index and the chat model
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatModel>,
    index: Arc<dyn VectorIndex>,
    chunking: ChunkingConfig,
    top_k: usize,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("embedding_model", &self.embedder.model())
            .field("chat_model", &self.chat.model())
            .field("records", &self.index.len())
            .field("chunking", &self.chunking)
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl Retriever {
    #[inline]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            embedder,
            chat,
            index,
            chunking: ChunkingConfig::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Build the configured providers over a fresh in-memory index, pinned to the
    /// configured embedding dimension when one is set
    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = JsonClient::new(config.request_timeout());
        let embedder = embedder_from_config(&config.embedding, client.clone())?;
        let chat = chat_model_from_config(&config.chat, client)?;

        let index = match config.embedding.dimension {
            Some(dimension) => InMemoryIndex::with_dimension(dimension),
            None => InMemoryIndex::new(),
        };

        Ok(Self::new(embedder, chat, Arc::new(index))
            .with_chunking(config.chunking)
            .with_top_k(config.retrieval.top_k))
    }

    #[inline]
    pub fn chunking(&self) -> ChunkingConfig {
        self.chunking
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Number of records currently in the index
    #[inline]
    pub fn record_count(&self) -> usize {
        self.index.len()
    }

    /// Vector length the index accepts, if it has been fixed
    #[inline]
    pub fn index_dimension(&self) -> Option<usize> {
        self.index.dimension()
    }

    /// Embed and store `chunks` as records `{document_id}_chunk_{i}`.
    ///
    /// Stops at the first failure; chunks stored before it stay in the index.
    #[inline]
    pub fn ingest_chunks(&self, chunks: &[String], document_id: &str) -> Result<usize> {
        self.ensure_available()?;

        for (chunk_index, text) in chunks.iter().enumerate() {
            let vector = self.embedder.embed(text)?;
            debug!(
                "Embedded chunk {} of '{}' ({} dimensions)",
                chunk_index,
                document_id,
                vector.len()
            );

            self.index.insert(VectorRecord::new(
                vector,
                ChunkPayload {
                    document_id: document_id.to_string(),
                    chunk_index,
                    text: text.clone(),
                },
            ))?;
        }

        Ok(chunks.len())
    }

    /// Chunk `text` and ingest every chunk under `document_id`
    #[inline]
    pub fn ingest_document(
        &self,
        text: &str,
        document_id: &str,
        chunking: &ChunkingConfig,
    ) -> Result<IngestReport> {
        self.ensure_available()?;

        let chunks = chunking.split(text)?;
        if chunks.is_empty() {
            warn!("Document '{}' has no text to index", document_id);
            return Err(RagError::EmptyContent {
                document_id: document_id.to_string(),
            });
        }

        let chunk_count = self.ingest_chunks(&chunks, document_id)?;
        info!("Ingested '{}' as {} chunks", document_id, chunk_count);

        Ok(IngestReport {
            document_id: document_id.to_string(),
            chunk_count,
            ingested_at: Utc::now(),
        })
    }

    /// Answer `question` from the `top_k` most similar chunks
    #[inline]
    pub fn answer(&self, question: &str, top_k: usize) -> Result<Answer> {
        self.ensure_available()?;
        validate_question(question)?;

        let query = self.embedder.embed(question)?;
        let hits = self.index.search(&query, top_k)?;

        if hits.is_empty() {
            info!("No relevant chunks found for question");
            return Ok(Answer::from_sources(
                NO_RELEVANT_INFORMATION.to_string(),
                Vec::new(),
            ));
        }

        let sources: Vec<String> = hits.into_iter().map(|hit| hit.payload.text).collect();
        let prompt = build_prompt(&build_context(&sources), question);

        let answer = self.chat.generate(&prompt)?;
        info!(
            "Answered question from {} chunks with {}",
            sources.len(),
            self.chat.model()
        );

        Ok(Answer::from_sources(answer, sources))
    }

    /// Answer `question` with the configured `top_k`
    #[inline]
    pub fn ask(&self, question: &str) -> Result<Answer> {
        self.answer(question, self.top_k)
    }

    /// The chunks that would be used as context for `question`, without generating an answer
    #[inline]
    pub fn search(&self, question: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        self.ensure_available()?;
        validate_question(question)?;

        let query = self.embedder.embed(question)?;
        self.index.search(&query, top_k)
    }

    #[inline]
    pub fn clear_index(&self) -> Result<()> {
        self.index.clear()?;
        info!("Vector index cleared");
        Ok(())
    }

    #[inline]
    pub fn index_is_available(&self) -> bool {
        self.index.is_available()
    }

    fn ensure_available(&self) -> Result<()> {
        if self.index.is_available() {
            Ok(())
        } else {
            warn!("Vector index is not available");
            Err(RagError::IndexUnavailable)
        }
    }
}

fn validate_question(question: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(RagError::InvalidQuestion(
            "question must not be empty".to_string(),
        ));
    }

    let length = question.chars().count();
    if length > MAX_QUESTION_CHARS {
        return Err(RagError::InvalidQuestion(format!(
            "question is {} characters, the limit is {}",
            length, MAX_QUESTION_CHARS
        )));
    }

    Ok(())
}

fn build_context(sources: &[String]) -> String {
    sources.iter().join("\n\n")
}

fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Based on the following context from uploaded documents, please answer the user's question.\n\
         If the answer cannot be found in the context, please say so.\n\n\
         Context:\n{}\n\n\
         Question: {}\n\n\
         Answer:",
        context, question
    )
}

/// Shorten `source` to a display citation
#[inline]
pub fn citation(source: &str) -> String {
    match source.char_indices().nth(CITATION_CHARS) {
        Some((cut, _)) => format!("{}...", source.get(..cut).unwrap_or(source)),
        None => source.to_string(),
    }
}
