use std::fmt;
use std::sync::Arc;

use ragbot_core::traits::EmbeddingProvider;
use ragbot_core::types::{Chunk, ScoredChunk};
use ragbot_core::{Error, Result};
use ragbot_text::Bm25Scorer;
use ragbot_vector::rank_by_similarity;

use crate::fusion::{fuse, FUSION_LIST_SIZE};

/// How the final ranking was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalMode {
    Hybrid,
    /// The vector stage was unavailable; results are the BM25 top entries.
    LexicalOnly { reason: String },
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hybrid => f.write_str("hybrid"),
            Self::LexicalOnly { reason } => write!(f, "lexical-only ({reason})"),
        }
    }
}

#[derive(Debug)]
pub struct Retrieval<'a> {
    /// Final ranking, at most `FUSION_LIST_SIZE` entries.
    pub results: Vec<ScoredChunk<'a>>,
    pub mode: RetrievalMode,
    /// BM25 top entries with raw scores.
    pub lexical: Vec<ScoredChunk<'a>>,
    /// Cosine top entries with raw similarities; empty in lexical-only mode.
    pub vector: Vec<ScoredChunk<'a>>,
}

pub struct HybridRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    scorer: Bm25Scorer,
}

impl HybridRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder, scorer: Bm25Scorer::new() }
    }

    /// Rank `chunks` (all candidates of one bot) for `query`.
    ///
    /// Never fails: any error from the vector stage degrades the result to
    /// the BM25 top entries. An empty candidate set yields no results and
    /// makes no provider call.
    pub async fn retrieve<'a>(&self, query: &str, chunks: &'a [Chunk]) -> Retrieval<'a> {
        if chunks.is_empty() {
            return Retrieval {
                results: Vec::new(),
                mode: RetrievalMode::LexicalOnly { reason: "no candidate chunks".to_string() },
                lexical: Vec::new(),
                vector: Vec::new(),
            };
        }

        let mut lexical = self.scorer.rank(query, chunks);
        lexical.truncate(FUSION_LIST_SIZE);

        match self.vector_stage(query, chunks).await {
            Ok(vector) => {
                tracing::debug!(lexical = lexical.len(), vector = vector.len(), "fusing rankings");
                let results = fuse(&lexical, &vector);
                Retrieval { results, mode: RetrievalMode::Hybrid, lexical, vector }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    embedder = self.embedder.embedder_id(),
                    "vector search failed, using BM25 only"
                );
                Retrieval {
                    results: lexical.clone(),
                    mode: RetrievalMode::LexicalOnly { reason: e.to_string() },
                    lexical,
                    vector: Vec::new(),
                }
            }
        }
    }

    async fn vector_stage<'a>(
        &self,
        query: &str,
        chunks: &'a [Chunk],
    ) -> Result<Vec<ScoredChunk<'a>>> {
        let query_embedding = self.embedder.embed(query).await?;
        if query_embedding.is_empty() {
            return Err(Error::provider(self.embedder.embedder_id(), "empty query embedding"));
        }
        let mut ranked = rank_by_similarity(&query_embedding, chunks);
        ranked.truncate(FUSION_LIST_SIZE);
        Ok(ranked)
    }
}
