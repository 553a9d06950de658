//! ragbot-core
//!
//! Domain types, configuration and the collaborator traits shared by the
//! retrieval engine, the ingestion pipeline and the storage backends.

pub mod config;
pub mod data_processor;
pub mod error;
pub mod extract;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
