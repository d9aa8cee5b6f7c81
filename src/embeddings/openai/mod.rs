
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::EmbeddingConfig;
use crate::embeddings::Embedder;
use crate::http::{JsonClient, endpoint};
use crate::{RagError, Result};

/// Embeddings from the OpenAI embeddings endpoint
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    embeddings_url: Url,
    model: String,
    api_key: String,
    client: JsonClient,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    #[inline]
    pub fn new(
        base_url: &Url,
        model: impl Into<String>,
        api_key: impl Into<String>,
        client: JsonClient,
    ) -> Result<Self> {
        Ok(Self {
            embeddings_url: endpoint(base_url, "v1/embeddings")?,
            model: model.into(),
            api_key: api_key.into(),
            client,
        })
    }

    #[inline]
    pub fn from_config(config: &EmbeddingConfig, client: JsonClient) -> Result<Self> {
        let base_url = config
            .base_url()
            .map_err(|e| RagError::Config(e.to_string()))?;
        let api_key = config
            .require_api_key()
            .map_err(|e| RagError::Config(e.to_string()))?;
        Self::new(&base_url, config.model(), api_key, client)
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Requesting OpenAI embedding (length: {})", text.len());

        let request = EmbeddingsRequest {
            model: &self.model,
            input: text,
        };

        let response: EmbeddingsResponse = self
            .client
            .post_json(&self.embeddings_url, Some(&self.api_key), &request)
            .map_err(|e| e.into_embedding_error())?;

        response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| {
                RagError::Embedding(format!("OpenAI model {} returned no embedding", self.model))
            })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
