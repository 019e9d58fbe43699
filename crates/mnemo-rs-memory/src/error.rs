//! Error types for memory operations.

use crate::codec::CodecError;
use crate::embedding::EmbeddingError;

/// Errors returned by the memory store and its helpers.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// Content was empty or whitespace-only.
    #[error("invalid content: memory content must not be empty")]
    InvalidContent,
    /// Search query was empty.
    #[error("invalid query: search query must not be empty")]
    InvalidQuery,
    /// Category string did not name a known category.
    #[error("invalid category: {0}")]
    InvalidCategory(String),
    /// The embedding provider cannot produce vectors.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),
    /// A stored vector does not match the expected layout.
    #[error("corrupt vector: {0}")]
    CorruptVector(String),
    /// The keyword backend rejected a query or failed.
    #[error("keyword index error: {0}")]
    KeywordIndex(String),
    /// SQLite storage error.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CodecError> for MemoryError {
    fn from(err: CodecError) -> Self {
        MemoryError::CorruptVector(err.to_string())
    }
}

impl From<EmbeddingError> for MemoryError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::Unavailable(reason) => MemoryError::EmbeddingUnavailable(reason),
        }
    }
}
