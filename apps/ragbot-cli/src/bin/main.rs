//! ragbot CLI
//!
//! ```bash
//! # Index a file or every .txt/.md file under a directory for one bot
//! ragbot ingest support-bot ./docs
//!
//! # Ask a question, optionally continuing a session
//! ragbot ask support-bot "How long do refunds take?" --session session_1700000000000_abc123xyz
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use ragbot_cli::{init_tracing, render_response, Backend};
use ragbot_core::config::{Config, Settings};
use ragbot_core::data_processor::{ChunkingConfig, DataProcessor};
use ragbot_hybrid::{ChatRequest, ChatService, HybridRetriever, IngestPipeline};
use ragbot_llm::{build_embedder, build_generator};

#[derive(Parser)]
#[command(name = "ragbot")]
#[command(about = "Hybrid-retrieval chatbot over your own documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a .txt/.md file or a directory of them
    Ingest {
        /// Bot the documents belong to
        bot_id: String,

        /// File or directory to ingest
        path: PathBuf,
    },

    /// Ask a question against a bot's documents
    Ask {
        bot_id: String,

        question: String,

        /// Session token to continue
        #[arg(short, long)]
        session: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::load()?;
    let settings = config.settings()?;
    tracing::debug!(?settings, "loaded settings");
    let backend = Backend::open(&settings.storage).await?;

    match cli.command {
        Commands::Ingest { bot_id, path } => ingest(&settings, &backend, &bot_id, path).await,
        Commands::Ask { bot_id, question, session } => {
            ask(&settings, &backend, bot_id, question, session).await
        }
    }
}

async fn ingest(settings: &Settings, backend: &Backend, bot_id: &str, path: PathBuf) -> Result<()> {
    let processor = DataProcessor::with_config(ChunkingConfig::from(&settings.chunking));
    let files = processor.list_source_files(&path);
    if files.is_empty() {
        anyhow::bail!("no .txt or .md files found at {}", path.display());
    }

    let embedder = build_embedder(&settings.embedding)?;
    let pipeline = IngestPipeline::new(
        backend.chunks.clone(),
        backend.documents.clone(),
        embedder,
        processor,
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}",
            )?
            .progress_chars("#>-"),
    );

    let mut documents = 0usize;
    let mut chunks = 0usize;
    let mut failed = 0usize;
    for file in &files {
        let name = file.file_name().map(|n| n.to_string_lossy().to_string());
        pb.set_message(name.unwrap_or_default());
        let outcome = match pipeline.processor().read_source(file) {
            Ok(source) => pipeline.ingest_source(bot_id, &source).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok((document, report)) => {
                documents += 1;
                chunks += report.total_chunks;
                if report.embedding_failures > 0 || report.insert_failures > 0 {
                    pb.println(format!(
                        "{}: {} chunks, {} without embedding, {} not stored",
                        document.filename,
                        report.total_chunks,
                        report.embedding_failures,
                        report.insert_failures
                    ));
                }
            }
            Err(e) => {
                failed += 1;
                tracing::error!(path = %file.display(), error = %e, "ingestion failed");
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    println!("Ingested {documents} documents ({chunks} chunks) for bot '{bot_id}'");
    if failed > 0 {
        println!("{failed} files failed; see the log for details");
    }
    Ok(())
}

async fn ask(
    settings: &Settings,
    backend: &Backend,
    bot_id: String,
    question: String,
    session_token: Option<String>,
) -> Result<()> {
    let retriever = HybridRetriever::new(build_embedder(&settings.embedding)?);
    let generator = build_generator(&settings.generation)?;
    let service = ChatService::new(
        backend.chunks.clone(),
        retriever,
        generator,
        Arc::clone(&backend.sessions),
    );

    let response = service.respond(ChatRequest { bot_id, question, session_token }).await;
    println!("{}", render_response(&response));
    Ok(())
}
