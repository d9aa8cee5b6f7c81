use anyhow::Result;
use clap::{Parser, Subcommand};
use docs_rag::commands::{ask_question, init_config, serve, show_config};
use docs_rag::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docs-rag")]
#[command(about = "Answer questions about your documents with retrieval-augmented generation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
    /// Ingest documents and answer a single question about them
    Ask {
        /// The question to answer
        question: String,
        /// UTF-8 text files to search; the file name becomes the document id
        #[arg(long = "file", short = 'f', required = true)]
        files: Vec<PathBuf>,
        /// Number of chunks to use as context
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Start the retrieval server on stdio
    Serve {
        /// Text files to ingest before accepting requests
        #[arg(long = "file", short = 'f')]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is reserved for command output and the server protocol
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load_default()?;

    match cli.command {
        Commands::Config { init } => {
            if init {
                init_config(&config)?;
            } else {
                show_config(&config)?;
            }
        }
        Commands::Ask {
            question,
            files,
            top_k,
        } => {
            ask_question(&config, question, files, top_k).await?;
        }
        Commands::Serve { files } => {
            serve(&config, files).await?;
        }
    }

    Ok(())
}
