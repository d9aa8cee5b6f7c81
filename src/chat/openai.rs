use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::chat::ChatModel;
use crate::config::ChatConfig;
use crate::http::{JsonClient, endpoint};
use crate::{RagError, Result};

/// Chat completions from the OpenAI API
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    completions_url: Url,
    model: String,
    api_key: String,
    temperature: f64,
    max_tokens: u32,
    client: JsonClient,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiChat {
    #[inline]
    pub fn from_config(config: &ChatConfig, client: JsonClient) -> Result<Self> {
        let base_url = config
            .base_url()
            .map_err(|e| RagError::Config(e.to_string()))?;
        let api_key = config
            .require_api_key()
            .map_err(|e| RagError::Config(e.to_string()))?;

        Ok(Self {
            completions_url: endpoint(&base_url, "v1/chat/completions")?,
            model: config.model().to_string(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }
}

impl ChatModel for OpenAiChat {
    fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Requesting OpenAI completion (prompt length: {})", prompt.len());

        let request = CompletionRequest {
            model: &self.model,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response: CompletionResponse = self
            .client
            .post_json(&self.completions_url, Some(&self.api_key), &request)
            .map_err(|e| e.into_generation_error())?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                RagError::Generation(format!("OpenAI model {} returned no content", self.model))
            })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
