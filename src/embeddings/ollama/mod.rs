#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::EmbeddingConfig;
use crate::embeddings::Embedder;
use crate::http::{JsonClient, endpoint};
use crate::{RagError, Result};

/// Embeddings served by a local or remote Ollama instance
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    embed_url: Url,
    model: String,
    client: JsonClient,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    #[inline]
    pub fn new(base_url: &Url, model: impl Into<String>, client: JsonClient) -> Result<Self> {
        Ok(Self {
            embed_url: endpoint(base_url, "api/embed")?,
            model: model.into(),
            client,
        })
    }

    #[inline]
    pub fn from_config(config: &EmbeddingConfig, client: JsonClient) -> Result<Self> {
        let base_url = config
            .base_url()
            .map_err(|e| RagError::Config(e.to_string()))?;
        Self::new(&base_url, config.model(), client)
    }
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let request = EmbedRequest {
            model: &self.model,
            input: text,
        };

        let response: EmbedResponse = self
            .client
            .post_json(&self.embed_url, None, &request)
            .map_err(|e| e.into_embedding_error())?;

        let embedding = response
            .embeddings
            .into_iter()
            .next()
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| {
                RagError::Embedding(format!("Ollama model {} returned no embedding", self.model))
            })?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
