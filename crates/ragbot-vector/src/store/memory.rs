use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use ragbot_core::traits::{ChunkStore, DocumentStore, SessionLog};
use ragbot_core::types::{ChatMessage, ChatSession, Chunk, Document};
use ragbot_core::{Error, Result};

#[derive(Default)]
struct Inner {
    chunks: Vec<Chunk>,
    documents: HashMap<String, Document>,
    sessions: Vec<ChatSession>,
    messages: Vec<ChatMessage>,
}

/// In-process store for development, tests and short-lived CLI runs.
///
/// Chunks come back in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn chunk_count(&self) -> usize {
        self.inner.read().await.chunks.len()
    }

    pub async fn sessions(&self) -> Vec<ChatSession> {
        self.inner.read().await.sessions.clone()
    }

    pub async fn messages(&self, session_id: &str) -> Vec<ChatMessage> {
        let inner = self.inner.read().await;
        inner.messages.iter().filter(|m| m.session_id == session_id).cloned().collect()
    }
}

#[async_trait]
impl ChunkStore for MemoryStore {
    async fn get_chunks(&self, bot_id: &str) -> Result<Vec<Chunk>> {
        let inner = self.inner.read().await;
        Ok(inner.chunks.iter().filter(|c| c.bot_id == bot_id).cloned().collect())
    }

    async fn put_chunk(&self, chunk: Chunk) -> Result<Chunk> {
        let mut inner = self.inner.write().await;
        if inner.chunks.iter().any(|c| c.id == chunk.id) {
            return Err(Error::InvalidInput(format!("duplicate chunk id {}", chunk.id)));
        }
        inner.chunks.push(chunk.clone());
        Ok(chunk)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put_document(&self, document: Document) -> Result<Document> {
        self.inner.write().await.documents.insert(document.id.clone(), document.clone());
        Ok(document)
    }

    async fn get_document(&self, id: &str) -> Result<Document> {
        self.inner
            .read()
            .await
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("document {id}")))
    }

    async fn update_document(&self, document: &Document) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.documents.get_mut(&document.id) {
            Some(existing) => {
                *existing = document.clone();
                Ok(())
            }
            None => Err(Error::NotFound(format!("document {}", document.id))),
        }
    }
}

#[async_trait]
impl SessionLog for MemoryStore {
    async fn find_or_create_session(
        &self,
        bot_id: &str,
        session_token: &str,
    ) -> Result<ChatSession> {
        let mut inner = self.inner.write().await;
        let existing = inner
            .sessions
            .iter()
            .find(|s| s.bot_id == bot_id && s.session_token == session_token);
        if let Some(existing) = existing {
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let session = ChatSession {
            id: uuid::Uuid::new_v4().to_string(),
            bot_id: bot_id.to_string(),
            session_token: session_token.to_string(),
            created_at: now,
            last_active_at: now,
        };
        inner.sessions.push(session.clone());
        Ok(session)
    }

    async fn append_messages(&self, messages: Vec<ChatMessage>) -> Result<()> {
        let mut inner = self.inner.write().await;
        for m in &messages {
            if !inner.sessions.iter().any(|s| s.id == m.session_id) {
                return Err(Error::NotFound(format!("session {}", m.session_id)));
            }
        }
        inner.messages.extend(messages);
        Ok(())
    }

    async fn touch_session(&self, session_id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let session = inner
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| Error::NotFound(format!("session {session_id}")))?;
        session.last_active_at = Utc::now();
        Ok(())
    }
}
