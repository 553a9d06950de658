use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChatMessage, ChatSession, Chunk, Document};

/// Persistence for indexed chunks.
///
/// `get_chunks` must return every chunk of the bot in one call: corpus
/// statistics are derived from the complete set.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn get_chunks(&self, bot_id: &str) -> Result<Vec<Chunk>>;
    async fn put_chunk(&self, chunk: Chunk) -> Result<Chunk>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn put_document(&self, document: Document) -> Result<Document>;
    async fn get_document(&self, id: &str) -> Result<Document>;
    async fn update_document(&self, document: &Document) -> Result<()>;
}

/// Sink for chat sessions and their messages.
#[async_trait]
pub trait SessionLog: Send + Sync {
    async fn find_or_create_session(
        &self,
        bot_id: &str,
        session_token: &str,
    ) -> Result<ChatSession>;
    async fn append_messages(&self, messages: Vec<ChatMessage>) -> Result<()>;
    async fn touch_session(&self, session_id: &str) -> Result<()>;
}

/// Produces dense vectors for text.
///
/// Implementations fail with `Error::Provider` on non-2xx responses,
/// authentication failures and malformed bodies. Vectors from one
/// provider share a single dimensionality.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-3-small`).
    fn embedder_id(&self) -> &str;
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Synthesizes an answer from retrieved context.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, context: &str, question: &str) -> Result<String>;
}
