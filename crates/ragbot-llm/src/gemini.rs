//! Google Gemini embeddings and content generation.
//!
//! The API key travels in the `x-goog-api-key` header.

use async_trait::async_trait;
use ragbot_core::config::{EmbeddingSettings, GenerationSettings};
use ragbot_core::traits::{AnswerGenerator, EmbeddingProvider};
use ragbot_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::http::{build_client, endpoint, require_key, send_json};
use crate::{build_prompt, NO_ANSWER};

const PROVIDER: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-flash";

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: Option<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

fn embedding_values(response: EmbedContentResponse) -> Result<Vec<f32>> {
    match response.embedding {
        Some(e) if !e.values.is_empty() => Ok(e.values),
        _ => Err(Error::provider(PROVIDER, "response contained no embedding")),
    }
}

pub struct GeminiEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    id: String,
}

impl GeminiEmbedder {
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

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let key = require_key(PROVIDER, self.api_key.as_deref())?;
        let body = EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content { role: None, parts: vec![Part { text }] },
        };
        let url = endpoint(&self.base_url, &format!("v1beta/models/{}:embedContent", self.model));
        let request = self.client.post(url).header(API_KEY_HEADER, key).json(&body);
        let response: EmbedContentResponse = send_json(PROVIDER, request).await?;
        embedding_values(response)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn candidate_text(response: GenerateContentResponse) -> String {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        NO_ANSWER.to_string()
    } else {
        text
    }
}

pub struct GeminiGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiGenerator {
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
impl AnswerGenerator for GeminiGenerator {
    async fn generate(&self, context: &str, question: &str) -> Result<String> {
        let key = require_key(PROVIDER, self.api_key.as_deref())?;
        let prompt = build_prompt(context, question);
        let body = GenerateContentRequest {
            contents: vec![Content { role: Some("user"), parts: vec![Part { text: &prompt }] }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };
        let path = format!("v1beta/models/{}:generateContent", self.model);
        let url = endpoint(&self.base_url, &path);
        let request = self.client.post(url).header(API_KEY_HEADER, key).json(&body);
        let response: GenerateContentResponse = send_json(PROVIDER, request).await?;
        Ok(candidate_text(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_request_uses_camel_case_config() {
        let body = GenerateContentRequest {
            contents: vec![Content { role: Some("user"), parts: vec![Part { text: "hi" }] }],
            generation_config: GenerationConfig { temperature: 0.5, max_output_tokens: 512 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 512);
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn embedding_values_are_extracted() {
        let body: EmbedContentResponse =
            serde_json::from_str(r#"{"embedding":{"values":[1.0,0.0]}}"#).unwrap();
        assert_eq!(embedding_values(body).unwrap(), vec![1.0, 0.0]);
        let body: EmbedContentResponse =
            serde_json::from_str(r#"{"embedding":{"values":[]}}"#).unwrap();
        assert!(embedding_values(body).is_err());
    }

    #[test]
    fn missing_candidate_text_yields_the_placeholder() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"Page 2 "},{"text":"yes."}]}}]}"#;
        let body: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(candidate_text(body), "Page 2 yes.");
        let json = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        let body: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(candidate_text(body), NO_ANSWER);
    }
}
