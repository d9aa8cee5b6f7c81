//! Chat completion providers
//!
//! The retrieval pipeline only sees [`ChatModel`]. Which provider backs it is decided
//! once, from [`ChatConfig::provider`], when the pipeline is built.


pub mod gemini;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use tracing::info;

pub use gemini::GeminiChat;
pub use ollama::OllamaChat;
pub use openai::OpenAiChat;

use crate::Result;
use crate::config::{ChatConfig, ChatProvider};
use crate::http::JsonClient;

/// Generates a completion for a single user prompt
pub trait ChatModel: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;

    /// Name of the model generating answers
    fn model(&self) -> &str;
}

/// Build the chat model selected by `config`
#[inline]
pub fn chat_model_from_config(config: &ChatConfig, client: JsonClient) -> Result<Arc<dyn ChatModel>> {
    let model: Arc<dyn ChatModel> = match config.provider {
        ChatProvider::Ollama => Arc::new(OllamaChat::from_config(config, client)?),
        ChatProvider::OpenAi => Arc::new(OpenAiChat::from_config(config, client)?),
        ChatProvider::Gemini => Arc::new(GeminiChat::from_config(config, client)?),
    };

    info!("Using {} chat with model {}", config.provider, model.model());
    Ok(model)
}
