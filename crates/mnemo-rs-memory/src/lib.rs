//! Persistent hybrid memory retrieval for Mnemo.
//!
//! Memories are free-text records indexed two ways: a dense embedding vector
//! (compared by exact cosine similarity) and an FTS5 keyword index. Search
//! blends both signals into one ranking and keeps working, observably
//! degraded, when either signal is unavailable.

pub mod codec;
pub mod embedding;
pub mod error;
pub mod keyword;
#[cfg(feature = "fastembed")]
pub mod local_model;
pub mod model;
pub mod outcome;
pub mod ranker;
pub mod store;

/// Vector codec error type.
pub use codec::CodecError;
/// Embedding provider interface and adapters.
pub use embedding::{
    DisabledEmbeddingProvider, EmbeddingError, EmbeddingProvider, LazyEmbeddingProvider,
};
/// Memory error type.
pub use error::MemoryError;
/// Keyword index over memory content.
pub use keyword::{KeywordHit, KeywordIndex, KeywordOutcome};
/// Local fastembed provider.
#[cfg(feature = "fastembed")]
pub use local_model::{FastEmbedOptions, FastEmbedProvider};
/// Memory record model.
pub use model::{MemoryCategory, MemoryId, MemoryRecord, ScoredMemory};
/// Degradation-aware outcomes.
pub use outcome::{SearchOutcome, SignalStatus};
/// Hybrid ranking weights.
pub use ranker::{DEFAULT_KEYWORD_WEIGHT, DEFAULT_VECTOR_WEIGHT, HybridWeights};
/// Memory store and its options.
pub use store::{
    DEFAULT_KEYWORD_CANDIDATE_MULTIPLIER, DEFAULT_LIST_LIMIT, DEFAULT_SEARCH_LIMIT, MemoryStore,
    MemoryStoreOptions, NewMemory,
};
