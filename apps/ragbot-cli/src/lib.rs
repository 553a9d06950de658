//! Shared wiring for the `ragbot` binaries: logging setup and storage
//! backend selection from settings.

use std::sync::Arc;

use ragbot_core::config::{StorageBackend, StorageSettings};
use ragbot_core::traits::{ChunkStore, DocumentStore, SessionLog};
use ragbot_hybrid::{ChatResponse, RetrievalMode};
use ragbot_vector::{LanceStore, MemoryStore};
use tracing_subscriber::EnvFilter;

/// Log to stderr so answers on stdout stay pipeable. `RUST_LOG` overrides
/// the default `info` level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub struct Backend {
    pub chunks: Arc<dyn ChunkStore>,
    pub documents: Arc<dyn DocumentStore>,
    /// Sessions are kept in memory for the lifetime of the process.
    pub sessions: Arc<dyn SessionLog>,
}

impl Backend {
    pub async fn open(settings: &StorageSettings) -> anyhow::Result<Self> {
        match settings.backend {
            StorageBackend::Memory => {
                tracing::warn!("memory storage selected: nothing outlives this process");
                let store = Arc::new(MemoryStore::new());
                Ok(Self { chunks: store.clone(), documents: store.clone(), sessions: store })
            }
            StorageBackend::Lancedb => {
                let path = settings.lancedb_path(&std::env::current_dir()?);
                std::fs::create_dir_all(&path)?;
                let lance = LanceStore::open(
                    &path,
                    &settings.chunks_table,
                    &settings.documents_table,
                )
                .await?;
                let lance = Arc::new(lance);
                Ok(Self {
                    chunks: lance.clone(),
                    documents: lance,
                    sessions: Arc::new(MemoryStore::new()),
                })
            }
        }
    }
}

/// Terminal transcript for one chat response.
///
/// Error details and fallback reasons stay in the log; they can carry
/// provider response bodies.
pub fn render_response(response: &ChatResponse) -> String {
    let mut out = response.answer.clone();
    if !response.citations.is_empty() {
        out.push_str(&format!("\n\nSources: {}", response.citations.join(", ")));
    }
    match &response.retrieval {
        Some(RetrievalMode::Hybrid) => out.push_str("\nRetrieval: hybrid"),
        Some(RetrievalMode::LexicalOnly { .. }) => out.push_str("\nRetrieval: lexical-only"),
        None => {}
    }
    if let Some(token) = &response.session_token {
        out.push_str(&format!("\nSession: {token}"));
    }
    out.push_str(&format!("\nResponse time: {} ms", response.response_time_ms));
    if response.diagnostic.is_some() {
        out.push_str("\nThe request failed; see the log for details.");
    }
    out
}

/// First `max_chars` characters of `text` on one line.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}
