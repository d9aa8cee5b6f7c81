
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::embeddings::chunking::ChunkingConfig;
use crate::http::DEFAULT_TIMEOUT_SECONDS;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const GOOGLEAI_API_KEY_ENV: &str = "GOOGLEAI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Ollama,
    OpenAi,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatProvider {
    #[default]
    Ollama,
    OpenAi,
    Gemini,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    /// Overrides the provider's default endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Vector length the model produces; when unset it is taken from the first stored chunk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    pub provider: ChatProvider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: ChatProvider::default(),
            base_url: None,
            model: None,
            api_key: None,
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved as context for each question
    pub top_k: usize,
    /// Upper bound on every embedding and chat request
    pub request_timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            request_timeout_secs: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL: {0} (must use http or https)")]
    InvalidUrl(String),
    #[error("Invalid model name: {0:?} (cannot be empty)")]
    InvalidModel(String),
    #[error("Missing API key for {provider} (set it in config.toml or {env_var})")]
    MissingApiKey {
        provider: String,
        env_var: &'static str,
    },
    #[error("Invalid temperature: {0} (must be between 0.0 and 2.0)")]
    InvalidTemperature(f64),
    #[error("Invalid max tokens: {0} (must be between 1 and 32768)")]
    InvalidMaxTokens(u32),
    #[error("Invalid chunk size: {0} (must be between 50 and 8192)")]
    InvalidChunkSize(usize),
    #[error("Chunk overlap ({0}) must be smaller than chunk size ({1})")]
    InvalidChunkOverlap(usize, usize),
    #[error("Invalid embedding dimension: {0} (must be between 1 and 65536)")]
    InvalidDimension(usize),
    #[error("Invalid top k: {0} (must be between 1 and 100)")]
    InvalidTopK(usize),
    #[error("Invalid request timeout: {0} (must be between 1 and 600 seconds)")]
    InvalidTimeout(u64),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".docs-rag"))
            .or_else(|| dirs::data_dir().map(|data| data.join("docs-rag")))
            .ok_or(ConfigError::DirectoryError)
    }

    /// Load the configuration from the default directory
    #[inline]
    pub fn load_default() -> Result<Self> {
        let config_dir = Self::config_dir().context("Failed to locate config directory")?;
        Self::load(config_dir)
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    #[inline]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval.request_timeout_secs)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.embedding.validate()?;
        self.chat.validate()?;
        self.validate_chunking_config()?;
        self.retrieval.validate()?;
        Ok(())
    }

    fn validate_chunking_config(&self) -> Result<(), ConfigError> {
        let config = &self.chunking;

        if !(50..=8192).contains(&config.chunk_size) {
            return Err(ConfigError::InvalidChunkSize(config.chunk_size));
        }

        if config.chunk_overlap >= config.chunk_size {
            return Err(ConfigError::InvalidChunkOverlap(
                config.chunk_overlap,
                config.chunk_size,
            ));
        }

        Ok(())
    }
}

impl EmbeddingProvider {
    #[inline]
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Ollama => "http://localhost:11434",
            Self::OpenAi => "https://api.openai.com",
        }
    }

    #[inline]
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Ollama => "nomic-embed-text:latest",
            Self::OpenAi => "text-embedding-3-small",
        }
    }

    /// Environment variable holding the API key, for providers that need one
    #[inline]
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::Ollama => None,
            Self::OpenAi => Some(OPENAI_API_KEY_ENV),
        }
    }
}

impl fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ollama => f.write_str("Ollama"),
            Self::OpenAi => f.write_str("OpenAI"),
        }
    }
}

impl ChatProvider {
    #[inline]
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Ollama => "http://localhost:11434",
            Self::OpenAi => "https://api.openai.com",
            Self::Gemini => "https://generativelanguage.googleapis.com",
        }
    }

    #[inline]
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Ollama => "llama3.2:latest",
            Self::OpenAi => "gpt-3.5-turbo",
            Self::Gemini => "gemini-pro",
        }
    }

    #[inline]
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::Ollama => None,
            Self::OpenAi => Some(OPENAI_API_KEY_ENV),
            Self::Gemini => Some(GOOGLEAI_API_KEY_ENV),
        }
    }
}

impl fmt::Display for ChatProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ollama => f.write_str("Ollama"),
            Self::OpenAi => f.write_str("OpenAI"),
            Self::Gemini => f.write_str("Gemini"),
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint(self.base_url.as_ref())?;
        validate_model(self.model.as_deref())?;

        match self.dimension {
            Some(dimension) if !(1..=65536).contains(&dimension) => {
                Err(ConfigError::InvalidDimension(dimension))
            }
            _ => Ok(()),
        }
    }

    #[inline]
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        resolve_base_url(self.base_url.as_ref(), self.provider.default_base_url())
    }

    #[inline]
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Key from the config file, falling back to the provider's environment variable
    #[inline]
    pub fn api_key(&self) -> Option<String> {
        self.provider
            .api_key_env()
            .and_then(|env_var| resolve_api_key(self.api_key.as_deref(), env_var))
    }

    #[inline]
    pub fn require_api_key(&self) -> Result<String, ConfigError> {
        self.api_key().ok_or_else(|| ConfigError::MissingApiKey {
            provider: format!("{} embeddings", self.provider),
            env_var: self.provider.api_key_env().unwrap_or_default(),
        })
    }
}

impl ChatConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint(self.base_url.as_ref())?;
        validate_model(self.model.as_deref())?;

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }

        if !(1..=32768).contains(&self.max_tokens) {
            return Err(ConfigError::InvalidMaxTokens(self.max_tokens));
        }

        Ok(())
    }

    #[inline]
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        resolve_base_url(self.base_url.as_ref(), self.provider.default_base_url())
    }

    #[inline]
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    #[inline]
    pub fn api_key(&self) -> Option<String> {
        self.provider
            .api_key_env()
            .and_then(|env_var| resolve_api_key(self.api_key.as_deref(), env_var))
    }

    #[inline]
    pub fn require_api_key(&self) -> Result<String, ConfigError> {
        self.api_key().ok_or_else(|| ConfigError::MissingApiKey {
            provider: format!("{} chat", self.provider),
            env_var: self.provider.api_key_env().unwrap_or_default(),
        })
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.top_k) {
            return Err(ConfigError::InvalidTopK(self.top_k));
        }

        if !(1..=600).contains(&self.request_timeout_secs) {
            return Err(ConfigError::InvalidTimeout(self.request_timeout_secs));
        }

        Ok(())
    }
}

fn validate_endpoint(url: Option<&Url>) -> Result<(), ConfigError> {
    match url {
        Some(url) if url.scheme() != "http" && url.scheme() != "https" => {
            Err(ConfigError::InvalidUrl(url.to_string()))
        }
        _ => Ok(()),
    }
}

fn validate_model(model: Option<&str>) -> Result<(), ConfigError> {
    match model {
        Some(model) if model.trim().is_empty() => Err(ConfigError::InvalidModel(model.to_string())),
        _ => Ok(()),
    }
}

fn resolve_base_url(configured: Option<&Url>, default: &str) -> Result<Url, ConfigError> {
    match configured {
        Some(url) => Ok(url.clone()),
        None => Url::parse(default).map_err(|_| ConfigError::InvalidUrl(default.to_string())),
    }
}

fn resolve_api_key(configured: Option<&str>, env_var: &str) -> Option<String> {
    configured
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .or_else(|| {
            std::env::var(env_var)
                .ok()
                .filter(|key| !key.trim().is_empty())
        })
}
