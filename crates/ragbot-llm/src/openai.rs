//! OpenAI (and OpenAI-compatible) embeddings and chat completions.

use async_trait::async_trait;
use ragbot_core::config::{EmbeddingSettings, GenerationSettings};
use ragbot_core::traits::{AnswerGenerator, EmbeddingProvider};
use ragbot_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::http::{build_client, endpoint, require_key, send_json};
use crate::{build_prompt, NO_ANSWER};

const PROVIDER: &str = "openai";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    id: String,
}

impl OpenAiEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let model = settings.model.clone().unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
        Ok(Self {
            client: build_client(PROVIDER, settings.timeout_secs)?,
            base_url: settings.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            id: format!("{PROVIDER}:{model}"),
            model,
            api_key: settings.api_key.clone(),
        })
    }
}

fn first_embedding(response: EmbeddingResponse) -> Result<Vec<f32>> {
    match response.data.into_iter().next() {
        Some(item) if !item.embedding.is_empty() => Ok(item.embedding),
        _ => Err(Error::provider(PROVIDER, "response contained no embedding")),
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let key = require_key(PROVIDER, self.api_key.as_deref())?;
        let request = self
            .client
            .post(endpoint(&self.base_url, "v1/embeddings"))
            .bearer_auth(key)
            .json(&EmbeddingRequest { model: &self.model, input: text });
        let response: EmbeddingResponse = send_json(PROVIDER, request).await?;
        first_embedding(response)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn answer_text(response: ChatResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| NO_ANSWER.to_string())
}

pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_output_tokens: u32,
}

impl OpenAiGenerator {
    pub fn new(settings: &GenerationSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(PROVIDER, settings.timeout_secs)?,
            base_url: settings.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: settings.model.clone().unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            api_key: settings.api_key.clone(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        })
    }
}

#[async_trait]
impl AnswerGenerator for OpenAiGenerator {
    async fn generate(&self, context: &str, question: &str) -> Result<String> {
        let key = require_key(PROVIDER, self.api_key.as_deref())?;
        let prompt = build_prompt(context, question);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: &prompt }],
            temperature: self.temperature,
            max_tokens: self.max_output_tokens,
        };
        let request = self
            .client
            .post(endpoint(&self.base_url, "v1/chat/completions"))
            .bearer_auth(key)
            .json(&body);
        let response: ChatResponse = send_json(PROVIDER, request).await?;
        Ok(answer_text(response))
    }
}
