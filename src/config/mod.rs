// Configuration management module
// TOML settings for providers, chunking and retrieval

pub mod settings;


pub use settings::{
    ChatConfig, ChatProvider, Config, ConfigError, EmbeddingConfig, EmbeddingProvider,
    GOOGLEAI_API_KEY_ENV, OPENAI_API_KEY_ENV, RetrievalConfig,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
