use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use ragbot_core::traits::EmbeddingProvider;
use ragbot_core::{Error, Result};
use ragbot_text::tokenize;
use twox_hash::XxHash64;

/// Offline embedder: each token is hashed into one of `dim` buckets and the
/// result is L2-normalized. Texts sharing vocabulary end up close together,
/// which is enough for development and tests without network access.
pub struct HashedEmbedder {
    dim: usize,
    id: String,
}

impl HashedEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, id: format!("hashed:d{dim}") }
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        if self.dim == 0 {
            return v;
        }
        for token in tokenize(text) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let weight = 0.5 + ((h >> 32) as u32) as f32 / u32::MAX as f32;
            v[idx] += weight;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashedEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let v = self.embed_sync(text);
        if v.iter().all(|x| *x == 0.0) {
            return Err(Error::provider("hashed", "text has no indexable tokens"));
        }
        Ok(v)
    }
}
