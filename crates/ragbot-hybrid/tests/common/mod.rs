#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ragbot_core::traits::{AnswerGenerator, ChunkStore, EmbeddingProvider, SessionLog};
use ragbot_core::types::{ChatMessage, ChatSession, Chunk, ChunkMetadata};
use ragbot_core::{Error, Result};
use ragbot_text::term_frequencies;
use ragbot_vector::MemoryStore;

pub fn chunk(id: &str, chunk_index: usize, content: &str, embedding: Option<Vec<f32>>) -> Chunk {
    Chunk {
        id: id.to_string(),
        document_id: "doc-1".to_string(),
        bot_id: "bot-1".to_string(),
        chunk_index,
        content: content.to_string(),
        token_count: content.split_whitespace().count(),
        term_frequencies: term_frequencies(content),
        embedding,
        metadata: ChunkMetadata::for_index(chunk_index),
    }
}

/// Returns the same vector for every input.
pub struct FixedEmbedder {
    pub vector: Vec<f32>,
    pub calls: AtomicUsize,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    fn embedder_id(&self) -> &str {
        "fixed"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector.clone())
    }
}

/// Fails every call, like a provider with a missing key.
#[derive(Default)]
pub struct FailingEmbedder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn embedder_id(&self) -> &str {
        "failing"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::provider("failing", "HTTP 401 Unauthorized"))
    }
}

/// Fails for texts containing `FAIL`, embeds everything else as `[1, 0]`.
pub struct FlakyEmbedder;

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    fn embedder_id(&self) -> &str {
        "flaky"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains("FAIL") {
            Err(Error::provider("flaky", "HTTP 503 Service Unavailable"))
        } else {
            Ok(vec![1.0, 0.0])
        }
    }
}

/// Records every (context, question) pair it is asked about.
#[derive(Default)]
pub struct RecordingGenerator {
    pub calls: Mutex<Vec<(String, String)>>,
}

impl RecordingGenerator {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_context(&self) -> Option<String> {
        self.calls.lock().unwrap().last().map(|(c, _)| c.clone())
    }
}

#[async_trait]
impl AnswerGenerator for RecordingGenerator {
    async fn generate(&self, context: &str, question: &str) -> Result<String> {
        self.calls.lock().unwrap().push((context.to_string(), question.to_string()));
        Ok("generated answer".to_string())
    }
}

pub struct FailingGenerator;

#[async_trait]
impl AnswerGenerator for FailingGenerator {
    async fn generate(&self, _context: &str, _question: &str) -> Result<String> {
        Err(Error::provider("gemini", "HTTP 500 Internal Server Error"))
    }
}

pub struct FailingSessionLog;

#[async_trait]
impl SessionLog for FailingSessionLog {
    async fn find_or_create_session(
        &self,
        _bot_id: &str,
        _session_token: &str,
    ) -> Result<ChatSession> {
        Err(Error::Store("sessions table unavailable".into()))
    }

    async fn append_messages(&self, _messages: Vec<ChatMessage>) -> Result<()> {
        Err(Error::Store("sessions table unavailable".into()))
    }

    async fn touch_session(&self, _session_id: &str) -> Result<()> {
        Err(Error::Store("sessions table unavailable".into()))
    }
}

/// Delegates to a memory store but rejects the chunk at one position.
pub struct RejectingChunkStore {
    pub inner: Arc<MemoryStore>,
    pub reject_index: usize,
}

#[async_trait]
impl ChunkStore for RejectingChunkStore {
    async fn get_chunks(&self, bot_id: &str) -> Result<Vec<Chunk>> {
        self.inner.get_chunks(bot_id).await
    }

    async fn put_chunk(&self, chunk: Chunk) -> Result<Chunk> {
        if chunk.chunk_index == self.reject_index {
            return Err(Error::Store("disk full".into()));
        }
        self.inner.put_chunk(chunk).await
    }
}
