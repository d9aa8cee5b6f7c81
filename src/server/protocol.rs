//! Line-delimited JSON messages exchanged over stdio

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::RagError;
use crate::database::SearchHit;
use crate::retrieval::IngestReport;

/// Error kind reported for lines that are not a valid request
pub const INVALID_REQUEST: &str = "invalid_request";

pub const INGEST_SUCCESS_MESSAGE: &str = "Document uploaded and processed successfully";
pub const INDEX_AVAILABLE_MESSAGE: &str = "Vector database is available";
pub const INDEX_UNAVAILABLE_MESSAGE: &str = "Vector database is not available";

/// One request line
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestParams {
    pub document_id: String,
    pub text: String,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskParams {
    pub question: String,
    pub top_k: Option<usize>,
}

/// Ranked chunks for a `search` request
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestResult {
    pub message: &'static str,
    pub document_id: String,
    pub chunk_count: usize,
    pub ingested_at: DateTime<Utc>,
}

impl From<IngestReport> for IngestResult {
    #[inline]
    fn from(report: IngestReport) -> Self {
        Self {
            message: INGEST_SUCCESS_MESSAGE,
            document_id: report.document_id,
            chunk_count: report.chunk_count,
            ingested_at: report.ingested_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResult {
    pub available: bool,
    pub records: usize,
    /// Vector length the index accepts, `null` until fixed
    pub dimension: Option<usize>,
    pub message: &'static str,
}

impl HealthResult {
    #[inline]
    pub fn new(available: bool, records: usize, dimension: Option<usize>) -> Self {
        Self {
            available,
            records,
            dimension,
            message: if available {
                INDEX_AVAILABLE_MESSAGE
            } else {
                INDEX_UNAVAILABLE_MESSAGE
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

impl ErrorBody {
    #[inline]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: INVALID_REQUEST.to_string(),
            message: message.into(),
        }
    }
}

impl From<&RagError> for ErrorBody {
    #[inline]
    fn from(error: &RagError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// One response line, carrying either `result` or `error`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    #[inline]
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    #[inline]
    pub fn failure(id: Option<Value>, error: ErrorBody) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }
}
