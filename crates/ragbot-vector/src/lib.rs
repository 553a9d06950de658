//! ragbot-vector
//!
//! Dense-vector scoring and the persistence layer. `similarity` ranks
//! chunks against a query embedding; `store` holds the in-memory and
//! LanceDB-backed implementations of the storage traits.

pub mod similarity;
pub mod store;

pub use similarity::{cosine_similarity, rank_by_similarity};
pub use store::{LanceStore, MemoryStore};
