use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::chat::ChatModel;
use crate::config::ChatConfig;
use crate::http::{JsonClient, endpoint};
use crate::{RagError, Result};

/// Non-streaming generation from an Ollama instance
#[derive(Debug, Clone)]
pub struct OllamaChat {
    generate_url: Url,
    model: String,
    temperature: f64,
    num_predict: u32,
    client: JsonClient,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaChat {
    #[inline]
    pub fn from_config(config: &ChatConfig, client: JsonClient) -> Result<Self> {
        let base_url = config
            .base_url()
            .map_err(|e| RagError::Config(e.to_string()))?;

        Ok(Self {
            generate_url: endpoint(&base_url, "api/generate")?,
            model: config.model().to_string(),
            temperature: config.temperature,
            num_predict: config.max_tokens,
            client,
        })
    }
}

impl ChatModel for OllamaChat {
    fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Requesting Ollama generation (prompt length: {})", prompt.len());

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.num_predict,
            },
        };

        let response: GenerateResponse = self
            .client
            .post_json(&self.generate_url, None, &request)
            .map_err(|e| e.into_generation_error())?;

        Ok(response.response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
