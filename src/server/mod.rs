//! Stdio request server
//!
//! Reads one JSON request per line and writes one JSON response per line. Every
//! retrieval call runs on the blocking pool so a slow provider never stalls the reader.


pub mod protocol;

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

pub use protocol::{ErrorBody, Request, Response};

use crate::RagError;
use crate::embeddings::ChunkingConfig;
use crate::retrieval::Retriever;
use protocol::{AskParams, HealthResult, IngestParams, IngestResult, SearchResult};

/// Serves retrieval requests for a shared [`Retriever`]
#[derive(Debug, Clone)]
pub struct RagServer {
    retriever: Arc<Retriever>,
}

impl RagServer {
    #[inline]
    pub fn new(retriever: Arc<Retriever>) -> Self {
        Self { retriever }
    }

    /// Serve requests from stdin until EOF
    #[inline]
    pub async fn serve_stdio(&self) -> Result<()> {
        info!("Starting retrieval server on stdio");
        let reader = BufReader::new(io::stdin());
        let mut stdout = io::stdout();
        self.serve(reader, &mut stdout).await
    }

    /// Serve requests from `reader` until EOF, writing responses to `writer`
    #[inline]
    pub async fn serve<R, W>(&self, mut reader: R, writer: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("EOF reached, stopping server");
                    break;
                }
                Ok(_) => {
                    let request = line.trim();
                    if request.is_empty() {
                        continue;
                    }

                    let response = self.handle_line(request).await;
                    send_response(writer, &response).await?;
                }
                Err(e) => {
                    error!("Error reading request: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle one request line
    #[inline]
    pub async fn handle_line(&self, line: &str) -> Response {
        let request: Request = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected malformed request: {}", e);
                return Response::failure(None, ErrorBody::invalid_request(e.to_string()));
            }
        };

        debug!("Handling '{}' request", request.method);
        let id = request.id;
        match self.dispatch(&request.method, request.params).await {
            Ok(result) => Response::success(id, result),
            Err(error) => {
                warn!("Request '{}' failed: {}", request.method, error.message);
                Response::failure(id, error)
            }
        }
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, ErrorBody> {
        match method {
            "ingest" => {
                let params: IngestParams = parse_params(params)?;
                let defaults = self.retriever.chunking();
                let chunking = ChunkingConfig {
                    chunk_size: params.chunk_size.unwrap_or(defaults.chunk_size),
                    chunk_overlap: params.chunk_overlap.unwrap_or(defaults.chunk_overlap),
                };

                let report = self
                    .run_blocking(move |retriever| {
                        retriever.ingest_document(&params.text, &params.document_id, &chunking)
                    })
                    .await?;
                to_result(&IngestResult::from(report))
            }
            "ask" => {
                let params: AskParams = parse_params(params)?;
                let top_k = self.resolve_top_k(params.top_k)?;

                let answer = self
                    .run_blocking(move |retriever| retriever.answer(&params.question, top_k))
                    .await?;
                to_result(&answer)
            }
            "search" => {
                let params: AskParams = parse_params(params)?;
                let top_k = self.resolve_top_k(params.top_k)?;

                let hits = self
                    .run_blocking(move |retriever| retriever.search(&params.question, top_k))
                    .await?;
                to_result(&SearchResult { hits })
            }
            "clear" => {
                self.run_blocking(|retriever| retriever.clear_index()).await?;
                Ok(serde_json::json!({ "cleared": true }))
            }
            "health" => {
                let health = self
                    .run_blocking(|retriever| {
                        Ok(HealthResult::new(
                            retriever.index_is_available(),
                            retriever.record_count(),
                            retriever.index_dimension(),
                        ))
                    })
                    .await?;
                to_result(&health)
            }
            other => Err(ErrorBody::invalid_request(format!(
                "unknown method '{}'",
                other
            ))),
        }
    }

    fn resolve_top_k(&self, requested: Option<usize>) -> Result<usize, ErrorBody> {
        match requested.unwrap_or_else(|| self.retriever.top_k()) {
            0 => Err(ErrorBody::invalid_request("top_k must be at least 1")),
            top_k => Ok(top_k),
        }
    }

    async fn run_blocking<T, F>(&self, operation: F) -> Result<T, ErrorBody>
    where
        T: Send + 'static,
        F: FnOnce(&Retriever) -> crate::Result<T> + Send + 'static,
    {
        let retriever = Arc::clone(&self.retriever);
        tokio::task::spawn_blocking(move || operation(&retriever))
            .await
            .map_err(|e| RagError::Other(anyhow::anyhow!("retrieval task failed: {}", e)))
            .and_then(|result| result)
            .map_err(|e| ErrorBody::from(&e))
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, ErrorBody> {
    serde_json::from_value(params)
        .map_err(|e| ErrorBody::invalid_request(format!("invalid params: {}", e)))
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, ErrorBody> {
    serde_json::to_value(value).map_err(|e| ErrorBody::from(&RagError::Other(e.into())))
}

async fn send_response<W>(writer: &mut W, response: &Response) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(response)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
