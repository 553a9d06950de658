use ragbot_core::types::{sort_by_score_desc, Chunk, ScoredChunk, SourceKind};

/// Cosine similarity of two vectors, clamped to [-1, 1].
///
/// Mismatched lengths, empty input and zero-norm vectors all yield 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0f64;
    let mut norm_a = 0f64;
    let mut norm_b = 0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    sim.clamp(-1.0, 1.0) as f32
}

/// Rank chunks carrying an embedding of the query's dimensionality, best
/// first. Chunks without an embedding (or from another embedder with a
/// different dimension) are left out.
pub fn rank_by_similarity<'a>(query: &[f32], chunks: &'a [Chunk]) -> Vec<ScoredChunk<'a>> {
    let mut scored: Vec<ScoredChunk<'a>> = chunks
        .iter()
        .filter_map(|chunk| {
            let embedding = chunk.embedding.as_deref()?;
            if embedding.len() != query.len() {
                return None;
            }
            Some(ScoredChunk {
                chunk,
                score: cosine_similarity(query, embedding),
                source: SourceKind::Vector,
            })
        })
        .collect();
    sort_by_score_desc(&mut scored);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_and_opposite_vectors() {
        let v = [0.3, -1.2, 4.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
        let neg: Vec<f32> = v.iter().map(|x| -x).collect();
        assert!((cosine_similarity(&v, &neg) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn similarity_stays_in_range() {
        let a = [1e-20f32, 3.5e18, -7.0];
        let b = [2e-20f32, 3.5e18, -7.0];
        let s = cosine_similarity(&a, &b);
        assert!((-1.0..=1.0).contains(&s));
    }
}
