use anyhow::{Context, Result, ensure};
use console::style;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::retrieval::{Answer, IngestReport, Retriever};
use crate::server::RagServer;

/// Print the effective configuration
#[inline]
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", style("📋 Current Configuration").bold().cyan());
    println!();

    println!("{}", style("Embeddings:").bold().yellow());
    println!("  Provider: {}", style(config.embedding.provider).cyan());
    println!("  Model: {}", style(config.embedding.model()).cyan());
    match config.embedding.base_url() {
        Ok(url) => println!("  URL: {}", style(url).cyan()),
        Err(e) => println!("  URL: {} ({})", style("Invalid").red(), e),
    }
    if let Some(dimension) = config.embedding.dimension {
        println!("  Dimension: {}", style(dimension).cyan());
    }
    print_key_status(config.embedding.provider.api_key_env(), config.embedding.api_key());

    println!();
    println!("{}", style("Chat:").bold().yellow());
    println!("  Provider: {}", style(config.chat.provider).cyan());
    println!("  Model: {}", style(config.chat.model()).cyan());
    match config.chat.base_url() {
        Ok(url) => println!("  URL: {}", style(url).cyan()),
        Err(e) => println!("  URL: {} ({})", style("Invalid").red(), e),
    }
    println!("  Temperature: {}", style(config.chat.temperature).cyan());
    println!("  Max Tokens: {}", style(config.chat.max_tokens).cyan());
    print_key_status(config.chat.provider.api_key_env(), config.chat.api_key());

    println!();
    println!("{}", style("Retrieval:").bold().yellow());
    println!("  Chunk Size: {}", style(config.chunking.chunk_size).cyan());
    println!("  Chunk Overlap: {}", style(config.chunking.chunk_overlap).cyan());
    println!("  Top K: {}", style(config.retrieval.top_k).cyan());
    println!(
        "  Request Timeout: {}s",
        style(config.retrieval.request_timeout_secs).cyan()
    );

    println!();
    println!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn print_key_status(env_var: Option<&'static str>, key: Option<String>) {
    let Some(env_var) = env_var else {
        return;
    };

    if key.is_some() {
        println!("  API Key: {}", style("set").green());
    } else {
        println!(
            "  API Key: {} (set it in the config file or {})",
            style("missing").red(),
            env_var
        );
    }
}

/// Write `config` to its config file
#[inline]
pub fn init_config(config: &Config) -> Result<PathBuf> {
    config.save().context("Failed to save configuration")?;

    let path = config.config_file_path();
    println!("{}", style("✓ Configuration saved successfully!").green());
    println!("Config file: {}", style(path.display()).cyan());
    Ok(path)
}

/// Read a UTF-8 text document; its id is the file name
#[inline]
pub fn read_document(path: &Path) -> Result<(String, String)> {
    let document_id = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file path: {}", path.display()))?;

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;

    Ok((document_id, text))
}

/// Ingest every file with the retriever's chunking settings
#[inline]
pub fn ingest_files(retriever: &Retriever, files: &[PathBuf]) -> Result<Vec<IngestReport>> {
    let chunking = retriever.chunking();

    files
        .iter()
        .map(|path| {
            let (document_id, text) = read_document(path)?;
            let report = retriever
                .ingest_document(&text, &document_id, &chunking)
                .with_context(|| format!("Failed to ingest {}", path.display()))?;
            info!(
                "Ingested {} ({} chunks)",
                report.document_id, report.chunk_count
            );
            Ok(report)
        })
        .collect()
}

/// Ingest `files` and answer `question` from them
#[inline]
pub fn answer_from_files(
    retriever: &Retriever,
    files: &[PathBuf],
    question: &str,
    top_k: Option<usize>,
) -> Result<Answer> {
    let top_k = top_k.unwrap_or_else(|| retriever.top_k());
    ensure!(top_k > 0, "--top-k must be at least 1");

    ingest_files(retriever, files)?;
    let answer = retriever
        .answer(question, top_k)
        .context("Failed to answer question")?;
    Ok(answer)
}

/// Answer a single question over the given files and print the result
#[inline]
pub async fn ask_question(
    config: &Config,
    question: String,
    files: Vec<PathBuf>,
    top_k: Option<usize>,
) -> Result<()> {
    let retriever = Retriever::from_config(config).context("Failed to set up providers")?;

    let answer = tokio::task::spawn_blocking(move || {
        answer_from_files(&retriever, &files, &question, top_k)
    })
    .await
    .context("Question task failed")??;

    print_answer(&answer);
    Ok(())
}

fn print_answer(answer: &Answer) {
    println!("{}", style("Answer").bold().cyan());
    println!("{}", answer.answer);

    if answer.citations.is_empty() {
        return;
    }

    println!();
    println!("{}", style("Sources").bold().yellow());
    for (i, citation) in answer.citations.iter().enumerate() {
        println!("  {}. {}", i + 1, style(citation).dim());
    }
}

/// Run the stdio server, optionally pre-loading `files`
#[inline]
pub async fn serve(config: &Config, files: Vec<PathBuf>) -> Result<()> {
    let retriever =
        Arc::new(Retriever::from_config(config).context("Failed to set up providers")?);

    if !files.is_empty() {
        let preload = Arc::clone(&retriever);
        let reports = tokio::task::spawn_blocking(move || ingest_files(&preload, &files))
            .await
            .context("Preload task failed")??;

        // stdout carries the protocol, so status goes to stderr
        for report in &reports {
            eprintln!(
                "{} {} ({} chunks)",
                style("✓ Loaded").green(),
                report.document_id,
                report.chunk_count
            );
        }
    }

    RagServer::new(retriever).serve_stdio().await
}
