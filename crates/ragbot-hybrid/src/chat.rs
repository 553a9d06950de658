//! Query path: retrieve, generate, cite, and log the exchange.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use ragbot_core::traits::{AnswerGenerator, ChunkStore, SessionLog};
use ragbot_core::types::{ChatMessage, ChatSession, Role};
use ragbot_core::{Error, Result};

use crate::retrieve::{HybridRetriever, RetrievalMode};

pub const NO_DOCUMENTS_ANSWER: &str =
    "I don't have any documents to answer from yet. Please upload some documents first.";
pub const APOLOGY: &str = "Sorry, something went wrong. Please try again.";

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub bot_id: String,
    pub question: String,
    /// Existing session to continue; a new token is generated when absent.
    pub session_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatAnswer {
    pub answer: String,
    pub citations: Vec<String>,
    pub session_token: String,
    /// `None` when the bot has no documents and retrieval was skipped.
    pub retrieval: Option<RetrievalMode>,
    pub response_time_ms: u64,
}

/// What the caller sees. Failures carry the apology text and keep the
/// underlying error in `diagnostic`.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub answer: String,
    pub citations: Vec<String>,
    pub session_token: Option<String>,
    pub retrieval: Option<RetrievalMode>,
    pub response_time_ms: u64,
    pub diagnostic: Option<String>,
}

/// `session_<unix-millis>_<9 chars>`.
pub fn new_session_token() -> String {
    let suffix: String = uuid::Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("session_{}_{}", Utc::now().timestamp_millis(), suffix)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

pub struct ChatService {
    chunks: Arc<dyn ChunkStore>,
    retriever: HybridRetriever,
    generator: Arc<dyn AnswerGenerator>,
    sessions: Arc<dyn SessionLog>,
}

impl ChatService {
    pub fn new(
        chunks: Arc<dyn ChunkStore>,
        retriever: HybridRetriever,
        generator: Arc<dyn AnswerGenerator>,
        sessions: Arc<dyn SessionLog>,
    ) -> Self {
        Self { chunks, retriever, generator, sessions }
    }

    pub async fn ask(&self, request: ChatRequest) -> Result<ChatAnswer> {
        let started = Instant::now();
        if request.bot_id.trim().is_empty() || request.question.trim().is_empty() {
            return Err(Error::InvalidInput("bot id and question are required".into()));
        }
        let session_token = request.session_token.clone().unwrap_or_else(new_session_token);

        let chunks = self.chunks.get_chunks(&request.bot_id).await?;
        if chunks.is_empty() {
            tracing::info!(bot_id = %request.bot_id, "no documents indexed, canned answer");
            return Ok(ChatAnswer {
                answer: NO_DOCUMENTS_ANSWER.to_string(),
                citations: Vec::new(),
                session_token,
                retrieval: None,
                response_time_ms: elapsed_ms(started),
            });
        }

        let retrieval = self.retriever.retrieve(&request.question, &chunks).await;
        let context = retrieval
            .results
            .iter()
            .map(|hit| hit.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let citations: Vec<String> =
            retrieval.results.iter().map(|hit| hit.chunk.metadata.citation()).collect();
        tracing::debug!(
            bot_id = %request.bot_id,
            mode = %retrieval.mode,
            results = retrieval.results.len(),
            "retrieved context"
        );

        let answer = self.generator.generate(&context, &request.question).await?;
        let response_time_ms = elapsed_ms(started);

        let logged = self
            .log_exchange(&request, &session_token, &answer, &citations, response_time_ms)
            .await;
        if let Err(e) = logged {
            tracing::warn!(
                bot_id = %request.bot_id,
                session_token = %session_token,
                error = %e,
                "failed to log chat exchange"
            );
        }

        Ok(ChatAnswer {
            answer,
            citations,
            session_token,
            retrieval: Some(retrieval.mode),
            response_time_ms,
        })
    }

    /// Error boundary around [`ask`](Self::ask); never fails.
    pub async fn respond(&self, request: ChatRequest) -> ChatResponse {
        let started = Instant::now();
        let bot_id = request.bot_id.clone();
        match self.ask(request).await {
            Ok(a) => ChatResponse {
                answer: a.answer,
                citations: a.citations,
                session_token: Some(a.session_token),
                retrieval: a.retrieval,
                response_time_ms: a.response_time_ms,
                diagnostic: None,
            },
            Err(e) => {
                tracing::error!(bot_id = %bot_id, error = %e, "chat query failed");
                ChatResponse {
                    answer: APOLOGY.to_string(),
                    citations: Vec::new(),
                    session_token: None,
                    retrieval: None,
                    response_time_ms: elapsed_ms(started),
                    diagnostic: Some(e.to_string()),
                }
            }
        }
    }

    async fn log_exchange(
        &self,
        request: &ChatRequest,
        session_token: &str,
        answer: &str,
        citations: &[String],
        response_time_ms: u64,
    ) -> Result<ChatSession> {
        let session =
            self.sessions.find_or_create_session(&request.bot_id, session_token).await?;
        let now = Utc::now();
        let messages = vec![
            ChatMessage {
                session_id: session.id.clone(),
                bot_id: request.bot_id.clone(),
                role: Role::User,
                content: request.question.clone(),
                citations: Vec::new(),
                response_time_ms: 0,
                created_at: now,
            },
            ChatMessage {
                session_id: session.id.clone(),
                bot_id: request.bot_id.clone(),
                role: Role::Assistant,
                content: answer.to_string(),
                citations: citations.to_vec(),
                response_time_ms,
                created_at: now,
            },
        ];
        self.sessions.append_messages(messages).await?;
        self.sessions.touch_session(&session.id).await?;
        Ok(session)
    }
}
