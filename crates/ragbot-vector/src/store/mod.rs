//! Storage backends for chunks, documents and chat sessions.

pub mod lance;
pub mod memory;

pub use lance::LanceStore;
pub use memory::MemoryStore;
