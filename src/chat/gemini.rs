use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::chat::ChatModel;
use crate::config::ChatConfig;
use crate::http::{JsonClient, endpoint};
use crate::{RagError, Result};

/// Content generation from the Google Gemini API
#[derive(Debug, Clone)]
pub struct GeminiChat {
    generate_url: Url,
    model: String,
    client: JsonClient,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiChat {
    #[inline]
    pub fn from_config(config: &ChatConfig, client: JsonClient) -> Result<Self> {
        let base_url = config
            .base_url()
            .map_err(|e| RagError::Config(e.to_string()))?;
        let api_key = config
            .require_api_key()
            .map_err(|e| RagError::Config(e.to_string()))?;

        let mut generate_url = endpoint(
            &base_url,
            &format!("v1beta/models/{}:generateContent", config.model()),
        )?;
        generate_url.query_pairs_mut().append_pair("key", &api_key);

        Ok(Self {
            generate_url,
            model: config.model().to_string(),
            client,
        })
    }
}

impl ChatModel for GeminiChat {
    fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Requesting Gemini content (prompt length: {})", prompt.len());

        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let response: GenerateResponse = self
            .client
            .post_json(&self.generate_url, None, &request)
            .map_err(|e| e.into_generation_error())?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or_else(|| {
                RagError::Generation(format!("Gemini model {} returned no candidates", self.model))
            })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
