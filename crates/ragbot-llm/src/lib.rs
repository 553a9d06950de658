//! ragbot-llm
//!
//! Clients for the remote language-model providers the engine talks to:
//! embeddings for chunks and queries, and answer generation from retrieved
//! context. Every client is built from an explicit settings object; none of
//! them read the process environment.

use std::sync::Arc;

use ragbot_core::config::{
    EmbeddingProviderKind, EmbeddingSettings, GenerationProviderKind, GenerationSettings,
};
use ragbot_core::traits::{AnswerGenerator, EmbeddingProvider};
use ragbot_core::Result;

pub mod gemini;
pub mod hashed;
mod http;
pub mod openai;

pub use gemini::{GeminiEmbedder, GeminiGenerator};
pub use hashed::HashedEmbedder;
pub use openai::{OpenAiEmbedder, OpenAiGenerator};

/// Returned when a provider answers without any text.
pub const NO_ANSWER: &str = "No answer generated.";

/// Prompt sent to the generator for a context/question pair.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!("Context:\n{context}\n\nQuestion: {question}\n\nAnswer:")
}

pub fn build_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match settings.provider {
        EmbeddingProviderKind::OpenAi => Arc::new(OpenAiEmbedder::new(settings)?),
        EmbeddingProviderKind::Gemini => Arc::new(GeminiEmbedder::new(settings)?),
        EmbeddingProviderKind::Hashed => Arc::new(HashedEmbedder::new(settings.dimension)),
    };
    tracing::debug!(embedder = embedder.embedder_id(), "embedding provider ready");
    Ok(embedder)
}

pub fn build_generator(settings: &GenerationSettings) -> Result<Arc<dyn AnswerGenerator>> {
    Ok(match settings.provider {
        GenerationProviderKind::OpenAi => Arc::new(OpenAiGenerator::new(settings)?),
        GenerationProviderKind::Gemini => Arc::new(GeminiGenerator::new(settings)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_layout() {
        assert_eq!(build_prompt("ctx", "why?"), "Context:\nctx\n\nQuestion: why?\n\nAnswer:");
    }

    #[test]
    fn hashed_settings_build_an_offline_embedder() {
        let settings = EmbeddingSettings {
            provider: EmbeddingProviderKind::Hashed,
            dimension: 32,
            ..Default::default()
        };
        let embedder = build_embedder(&settings).unwrap();
        assert_eq!(embedder.embedder_id(), "hashed:d32");
    }
}
