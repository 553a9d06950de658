use ragbot_core::config::{EmbeddingProviderKind, EmbeddingSettings, GenerationSettings};
use ragbot_core::traits::EmbeddingProvider;
use ragbot_llm::{build_embedder, build_generator, HashedEmbedder};

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[tokio::test]
async fn hashed_vectors_favour_shared_vocabulary() {
    let embedder = HashedEmbedder::new(128);
    let query = embedder.embed("refund window").await.unwrap();
    let related = embedder.embed("The refund window is fourteen days").await.unwrap();
    let unrelated = embedder.embed("Shipping labels print from the dashboard").await.unwrap();
    assert!(dot(&query, &related) > dot(&query, &unrelated));
}

#[test]
fn remote_providers_build_without_contacting_the_network() {
    let settings = EmbeddingSettings {
        provider: EmbeddingProviderKind::Gemini,
        ..Default::default()
    };
    let embedder = build_embedder(&settings).unwrap();
    assert_eq!(embedder.embedder_id(), "gemini:text-embedding-004");
    assert!(build_generator(&GenerationSettings::default()).is_ok());
}
