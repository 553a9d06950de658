//! Rank-position fusion of a lexical and a vector ranking.
//!
//! Only the ordinal position within each list's top entries matters; raw
//! BM25 and cosine magnitudes never meet.

use std::collections::HashMap;

use ragbot_core::types::{sort_by_score_desc, Chunk, ScoredChunk, SourceKind};

/// Entries taken from each input list, and size of the fused output.
pub const FUSION_LIST_SIZE: usize = 5;
pub const LEXICAL_WEIGHT: f32 = 0.6;
pub const VECTOR_WEIGHT: f32 = 0.4;

/// `(len - index) / len`: 1.0 for the head of the list, `1/len` for its tail.
pub fn rank_score(rank_index: usize, list_len: usize) -> f32 {
    if list_len == 0 || rank_index >= list_len {
        return 0.0;
    }
    (list_len - rank_index) as f32 / list_len as f32
}

/// Fuse two rankings (each already sorted best first) into one.
///
/// Each list is cut to its first `FUSION_LIST_SIZE` entries. A chunk in
/// both lists appears once with both weighted contributions summed. The
/// union is sorted by fused score and cut to `FUSION_LIST_SIZE`.
pub fn fuse<'a>(lexical: &[ScoredChunk<'a>], vector: &[ScoredChunk<'a>]) -> Vec<ScoredChunk<'a>> {
    let lexical = &lexical[..lexical.len().min(FUSION_LIST_SIZE)];
    let vector = &vector[..vector.len().min(FUSION_LIST_SIZE)];

    let mut order: Vec<(&'a Chunk, f32)> = Vec::with_capacity(lexical.len() + vector.len());
    let mut position: HashMap<&'a str, usize> = HashMap::new();
    let weighted = weighted_ranks(lexical, LEXICAL_WEIGHT)
        .chain(weighted_ranks(vector, VECTOR_WEIGHT));
    for (chunk, contribution) in weighted {
        match position.get(chunk.id.as_str()) {
            Some(&slot) => order[slot].1 += contribution,
            None => {
                position.insert(chunk.id.as_str(), order.len());
                order.push((chunk, contribution));
            }
        }
    }

    let mut fused: Vec<ScoredChunk<'a>> = order
        .into_iter()
        .map(|(chunk, score)| ScoredChunk { chunk, score, source: SourceKind::Hybrid })
        .collect();
    sort_by_score_desc(&mut fused);
    fused.truncate(FUSION_LIST_SIZE);
    fused
}

fn weighted_ranks<'a, 'b>(
    list: &'b [ScoredChunk<'a>],
    weight: f32,
) -> impl Iterator<Item = (&'a Chunk, f32)> + 'b {
    list.iter()
        .enumerate()
        .map(move |(i, hit)| (hit.chunk, weight * rank_score(i, list.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_scores_descend_linearly() {
        assert_eq!(rank_score(0, 5), 1.0);
        assert!((rank_score(4, 5) - 0.2).abs() < 1e-6);
        assert_eq!(rank_score(0, 1), 1.0);
        assert_eq!(rank_score(3, 0), 0.0);
    }
}
