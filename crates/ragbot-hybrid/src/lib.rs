//! ragbot-hybrid
//!
//! The query and ingestion paths: rank fusion of lexical and vector
//! results, the retriever that falls back to lexical-only ranking when the
//! vector stage is unavailable, the ingestion pipeline, and the chat
//! service that turns retrieved chunks into a cited answer.

pub mod chat;
pub mod fusion;
pub mod ingest;
pub mod retrieve;

pub use chat::{ChatAnswer, ChatRequest, ChatResponse, ChatService};
pub use fusion::fuse;
pub use ingest::{IngestPipeline, IngestReport};
pub use retrieve::{HybridRetriever, Retrieval, RetrievalMode};
