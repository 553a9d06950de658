//! BM25 over stored term-frequency maps.
//!
//! Nothing here is cached: `CorpusStats` is rebuilt from the candidate
//! chunks on every query, so a newly ingested document is visible to the
//! very next query.

use std::collections::HashMap;

use ragbot_core::types::{sort_by_score_desc, Chunk, ScoredChunk, SourceKind, TermFrequencies};

use crate::tokenize::tokenize;

pub const K1: f32 = 1.5;
pub const B: f32 = 0.75;

/// Smoothed inverse document frequency, `ln((N - df + 0.5) / (df + 0.5) + 1)`.
///
/// Never negative for `df <= N`, so very common terms still score >= 0.
pub fn idf(doc_count: usize, doc_freq: usize) -> f32 {
    let n = doc_count as f64;
    let df = doc_freq as f64;
    (((n - df + 0.5) / (df + 0.5)) + 1.0).ln() as f32
}

/// Corpus statistics for one query's candidate set.
#[derive(Debug, Clone)]
pub struct CorpusStats {
    doc_count: usize,
    avg_doc_length: f32,
    doc_freq: HashMap<String, usize>,
}

impl CorpusStats {
    pub fn from_term_maps<'a, I>(term_maps: I) -> Self
    where
        I: IntoIterator<Item = &'a TermFrequencies>,
    {
        let mut doc_count = 0usize;
        let mut total_length = 0u64;
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for map in term_maps {
            doc_count += 1;
            total_length += map.values().map(|&v| u64::from(v)).sum::<u64>();
            for term in map.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }
        let avg_doc_length = if doc_count == 0 {
            0.0
        } else {
            (total_length as f64 / doc_count as f64) as f32
        };
        Self { doc_count, avg_doc_length, doc_freq }
    }

    pub fn from_chunks(chunks: &[Chunk]) -> Self {
        Self::from_term_maps(chunks.iter().map(|c| &c.term_frequencies))
    }

    pub fn doc_count(&self) -> usize {
        self.doc_count
    }

    pub fn avg_doc_length(&self) -> f32 {
        self.avg_doc_length
    }

    /// Number of chunks whose term map contains `term`.
    pub fn doc_freq(&self, term: &str) -> usize {
        self.doc_freq.get(term).copied().unwrap_or(0)
    }

    /// IDF of a term seen in the corpus; 0 for unseen terms.
    pub fn idf(&self, term: &str) -> f32 {
        match self.doc_freq.get(term) {
            Some(&df) => idf(self.doc_count, df),
            None => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Bm25Scorer {
    k1: f32,
    b: f32,
}

impl Default for Bm25Scorer {
    fn default() -> Self {
        Self { k1: K1, b: B }
    }
}

impl Bm25Scorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score one chunk against already-tokenized query terms.
    ///
    /// Repeated query terms contribute once per occurrence.
    pub fn score_terms(
        &self,
        query_terms: &[String],
        term_frequencies: &TermFrequencies,
        stats: &CorpusStats,
    ) -> f32 {
        let doc_length: u32 = term_frequencies.values().sum();
        let length_ratio = doc_length as f32 / stats.avg_doc_length();
        query_terms
            .iter()
            .map(|term| {
                let tf = term_frequencies.get(term).copied().unwrap_or(0);
                if tf == 0 {
                    return 0.0;
                }
                let tf = tf as f32;
                let numerator = tf * (self.k1 + 1.0);
                let denominator = tf + self.k1 * (1.0 - self.b + self.b * length_ratio);
                stats.idf(term) * numerator / denominator
            })
            .sum()
    }

    /// Rank every candidate chunk for `query`, best first.
    ///
    /// Chunks matching no query term stay in the output with score 0. The
    /// caller guards against an empty candidate set.
    pub fn rank<'a>(&self, query: &str, chunks: &'a [Chunk]) -> Vec<ScoredChunk<'a>> {
        let query_terms = tokenize(query);
        let stats = CorpusStats::from_chunks(chunks);
        let mut scored: Vec<ScoredChunk<'a>> = chunks
            .iter()
            .map(|chunk| ScoredChunk {
                chunk,
                score: self.score_terms(&query_terms, &chunk.term_frequencies, &stats),
                source: SourceKind::Text,
            })
            .collect();
        sort_by_score_desc(&mut scored);
        scored
    }
}
