//! Domain types shared by ingestion, retrieval and storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type ChunkId = String;

/// Normalized term -> occurrence count within one chunk.
pub type TermFrequencies = BTreeMap<String, u32>;

/// Number of consecutive chunks attributed to one citation page.
pub const CHUNKS_PER_PAGE: usize = 5;

/// Per-chunk attributes. `page` is the only field the engine reads; the
/// rest is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_page() -> u32 {
    1
}

impl Default for ChunkMetadata {
    fn default() -> Self {
        Self { page: default_page(), extra: HashMap::new() }
    }
}

impl ChunkMetadata {
    /// Metadata for the chunk at `chunk_index` within its document.
    pub fn for_index(chunk_index: usize) -> Self {
        let page = u32::try_from(chunk_index / CHUNKS_PER_PAGE + 1).unwrap_or(u32::MAX);
        Self { page, extra: HashMap::new() }
    }

    pub fn citation(&self) -> String {
        format!("Page {}", self.page)
    }
}

/// The unit of indexing and retrieval.
///
/// - `id`: unique chunk identifier
/// - `document_id`/`bot_id`: ownership; retrieval is always scoped to one bot
/// - `chunk_index`: position within the source document
/// - `term_frequencies`: computed once at ingestion, never mutated
/// - `embedding`: absent when the provider failed for this chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub document_id: String,
    pub bot_id: String,
    pub chunk_index: usize,
    pub content: String,
    pub token_count: usize,
    pub term_frequencies: TermFrequencies,
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

/// Indicates which ranking stage produced a score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Raw BM25 score, unbounded and non-negative.
    Text,
    /// Raw cosine similarity in [-1, 1].
    Vector,
    /// Rank-blended score in [0, 1].
    Hybrid,
}

/// A chunk paired with a stage-specific score. Scores with different
/// `source` values are not comparable.
#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a Chunk,
    pub score: f32,
    pub source: SourceKind,
}

impl ScoredChunk<'_> {
    pub fn id(&self) -> &str {
        &self.chunk.id
    }
}

/// Sort descending by score. Ties keep their input order.
pub fn sort_by_score_desc(hits: &mut [ScoredChunk<'_>]) {
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Txt,
    Md,
    Pdf,
    Docx,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "text" => Some(Self::Txt),
            "md" | "markdown" => Some(Self::Md),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Md => "md",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

impl std::str::FromStr for FileType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| crate::Error::UnsupportedFileType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(crate::Error::InvalidInput(format!("unknown document status '{other}'"))),
        }
    }
}

/// An uploaded source document owned by one bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub bot_id: String,
    pub filename: String,
    pub file_type: FileType,
    pub status: DocumentStatus,
    pub total_chunks: usize,
    pub processing_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        bot_id: impl Into<String>,
        filename: impl Into<String>,
        file_type: FileType,
    ) -> Self {
        Self {
            id: id.into(),
            bot_id: bot_id.into(),
            filename: filename.into(),
            file_type,
            status: DocumentStatus::Pending,
            total_chunks: 0,
            processing_error: None,
            created_at: Utc::now(),
            processed_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub bot_id: String,
    pub session_token: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub session_id: String,
    pub bot_id: String,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub citations: Vec<String>,
    pub response_time_ms: u64,
    pub created_at: DateTime<Utc>,
}
