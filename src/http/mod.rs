// Blocking JSON transport shared by the embedding and chat providers


use std::io::ErrorKind;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::RagError;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP {status} from {path}")]
    Status { status: u16, path: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to encode request: {0}")]
    Encode(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl HttpError {
    /// Translate a failed embedding request into the crate error taxonomy
    #[inline]
    pub fn into_embedding_error(self) -> RagError {
        match self {
            Self::Timeout(timeout) => RagError::Timeout {
                operation: "embedding",
                timeout,
            },
            other => RagError::Embedding(other.to_string()),
        }
    }

    /// Translate a failed chat request into the crate error taxonomy
    #[inline]
    pub fn into_generation_error(self) -> RagError {
        match self {
            Self::Timeout(timeout) => RagError::Timeout {
                operation: "generation",
                timeout,
            },
            other => RagError::Generation(other.to_string()),
        }
    }
}

/// Sends JSON requests through a single agent with a global timeout.
///
/// Requests are never retried; the first failure is returned to the caller.
#[derive(Debug, Clone)]
pub struct JsonClient {
    agent: ureq::Agent,
    timeout: Duration,
}

impl Default for JsonClient {
    #[inline]
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
    }
}

impl JsonClient {
    #[inline]
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self { agent, timeout }
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST `body` as JSON and decode the JSON response
    #[inline]
    pub fn post_json<B, R>(&self, url: &Url, bearer: Option<&str>, body: &B) -> Result<R, HttpError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let payload =
            serde_json::to_string(body).map_err(|e| HttpError::Encode(e.to_string()))?;

        // The query string may carry an API key, so only the path is logged
        debug!("POST {} ({} bytes)", url.path(), payload.len());

        let mut request = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json");
        if let Some(token) = bearer {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response_text = request
            .send(&payload)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|error| self.classify(error, url))?;

        serde_json::from_str(&response_text).map_err(|e| HttpError::Decode(e.to_string()))
    }

    fn classify(&self, error: ureq::Error, url: &Url) -> HttpError {
        let classified = match error {
            ureq::Error::StatusCode(status) => HttpError::Status {
                status,
                path: url.path().to_string(),
            },
            ureq::Error::Timeout(_) => HttpError::Timeout(self.timeout),
            ureq::Error::Io(ref io) if io.kind() == ErrorKind::TimedOut => {
                HttpError::Timeout(self.timeout)
            }
            other => HttpError::Transport(other.to_string()),
        };

        warn!("Request to {} failed: {}", url.path(), classified);
        classified
    }
}

/// Resolve `path` against a provider base URL.
///
/// The base is treated as a directory, so `http://host/prefix` and `http://host/prefix/`
/// resolve the same way.
#[inline]
pub fn endpoint(base: &Url, path: &str) -> Result<Url, RagError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let directory = format!("{}/", base.path());
        base.set_path(&directory);
    }

    base.join(path.trim_start_matches('/'))
        .map_err(|e| RagError::Config(format!("Invalid endpoint '{}' for {}: {}", path, base, e)))
}
