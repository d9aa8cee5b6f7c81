// Embeddings module
// Text chunking and the providers that turn text into vectors

pub mod chunking;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

pub use chunking::{ChunkingConfig, normalize_text, split_text};
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

use crate::Result;
use crate::config::{EmbeddingConfig, EmbeddingProvider};
use crate::http::JsonClient;

/// Maps text to a fixed-length vector.
///
/// Implementations must return the same vector for the same input within a session.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Name of the model producing the vectors
    fn model(&self) -> &str;
}

/// Build the embedder selected by `config`
#[inline]
pub fn embedder_from_config(
    config: &EmbeddingConfig,
    client: JsonClient,
) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.provider {
        EmbeddingProvider::Ollama => Arc::new(OllamaEmbedder::from_config(config, client)?),
        EmbeddingProvider::OpenAi => Arc::new(OpenAiEmbedder::from_config(config, client)?),
    };

    tracing::info!(
        "Using {} embeddings with model {}",
        config.provider,
        embedder.model()
    );
    Ok(embedder)
}
