use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// A remote model provider rejected the call or answered with
    /// something we could not use.
    #[error("{provider} provider error: {message}")]
    Provider { provider: String, message: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider { provider: provider.into(), message: message.into() }
    }

    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::Store(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
