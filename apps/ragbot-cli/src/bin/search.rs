//! ragbot-search: run retrieval only and show each stage's ranking.
//!
//! ```bash
//! ragbot-search support-bot "refund window"
//! ```

use anyhow::Result;
use clap::Parser;

use ragbot_cli::{init_tracing, snippet, Backend};
use ragbot_core::config::Config;
use ragbot_core::traits::ChunkStore;
use ragbot_core::types::ScoredChunk;
use ragbot_hybrid::HybridRetriever;
use ragbot_llm::build_embedder;

#[derive(Parser)]
#[command(name = "ragbot-search")]
#[command(about = "Show BM25, vector and fused rankings for a query")]
struct Args {
    bot_id: String,
    query: String,
}

fn print_hits(title: &str, hits: &[ScoredChunk<'_>]) {
    println!("\n{title}");
    if hits.is_empty() {
        println!("  (none)");
    }
    for (i, hit) in hits.iter().enumerate() {
        println!(
            "  {}. score={:.4}  id={}  {}  chunk={}",
            i + 1,
            hit.score,
            hit.id(),
            hit.chunk.metadata.citation(),
            hit.chunk.chunk_index
        );
        println!("     {}", snippet(&hit.chunk.content, 120));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let settings = Config::load()?.settings()?;
    let backend = Backend::open(&settings.storage).await?;
    let chunks = backend.chunks.get_chunks(&args.bot_id).await?;
    println!("Query: {}\nBot: {} ({} chunks)", args.query, args.bot_id, chunks.len());
    if chunks.is_empty() {
        println!("No documents indexed for this bot.");
        return Ok(());
    }

    let retriever = HybridRetriever::new(build_embedder(&settings.embedding)?);
    let retrieval = retriever.retrieve(&args.query, &chunks).await;
    print_hits("BM25 top 5", &retrieval.lexical);
    print_hits("Vector top 5", &retrieval.vector);
    print_hits(&format!("Final ({})", retrieval.mode), &retrieval.results);
    Ok(())
}
