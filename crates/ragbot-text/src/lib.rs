//! ragbot-text
//!
//! Lexical side of retrieval: the tokenizer shared by ingestion and query
//! time, and a BM25 scorer that rebuilds corpus statistics from the stored
//! per-chunk term maps on every query.

pub mod bm25;
pub mod tokenize;

pub use bm25::{Bm25Scorer, CorpusStats};
pub use tokenize::{term_frequencies, tokenize};
