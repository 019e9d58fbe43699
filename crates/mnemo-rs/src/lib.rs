//! Public SDK surface for Mnemo.
//!
//! Re-exports the config and memory crates and wires a validated
//! [`MnemoConfig`] into a ready-to-use [`MemoryStore`].

/// Re-export for convenience.
pub use mnemo_rs_config as config;
/// Re-export for convenience.
pub use mnemo_rs_memory as memory;

use log::info;
use mnemo_rs_config::{EmbeddingConfig, MnemoConfig};
use mnemo_rs_memory::{
    DisabledEmbeddingProvider, EmbeddingProvider, HybridWeights, MemoryError, MemoryStore,
    MemoryStoreOptions, SearchOutcome,
};
use std::path::Path;
use std::sync::Arc;

/// Reply used when a search finds nothing.
pub const NO_RESULTS: &str = "No relevant memories found.";

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}

/// Store options derived from config.
pub fn store_options(config: &MnemoConfig) -> MemoryStoreOptions {
    MemoryStoreOptions {
        dimension: config.embedding.dimension,
        weights: HybridWeights {
            vector: config.memory.vector_weight,
            keyword: config.memory.keyword_weight,
        },
        keyword_candidate_multiplier: config.memory.keyword_candidate_multiplier,
        store_without_embedding: config.memory.store_without_embedding,
    }
}

/// Embedding provider for the configured model.
///
/// The model is never loaded here; with the `fastembed` feature it loads on
/// the first embedding call.
pub fn embedding_provider(config: &EmbeddingConfig) -> Arc<dyn EmbeddingProvider> {
    if !config.enabled {
        info!("embeddings disabled by config; keyword-only retrieval");
        return Arc::new(DisabledEmbeddingProvider::new("embeddings disabled by config"));
    }
    local_provider(config)
}

#[cfg(feature = "fastembed")]
fn local_provider(config: &EmbeddingConfig) -> Arc<dyn EmbeddingProvider> {
    use mnemo_rs_memory::{FastEmbedOptions, FastEmbedProvider};

    Arc::new(FastEmbedProvider::lazy(FastEmbedOptions {
        model: config.model.clone(),
        cache_dir: config.cache_dir.as_ref().map(std::path::PathBuf::from),
        show_download_progress: config.show_download_progress,
    }))
}

#[cfg(not(feature = "fastembed"))]
fn local_provider(config: &EmbeddingConfig) -> Arc<dyn EmbeddingProvider> {
    info!(
        "built without local embeddings; keyword-only retrieval (model={})",
        config.model
    );
    Arc::new(DisabledEmbeddingProvider::new(
        "built without the fastembed feature",
    ))
}

/// Open the configured store. Relative database paths resolve against `base`.
pub fn open_store(config: &MnemoConfig, base: impl AsRef<Path>) -> Result<MemoryStore, MemoryError> {
    open_store_with_provider(config, base, embedding_provider(&config.embedding))
}

/// Open the configured store with an explicit embedding provider.
pub fn open_store_with_provider(
    config: &MnemoConfig,
    base: impl AsRef<Path>,
    provider: Arc<dyn EmbeddingProvider>,
) -> Result<MemoryStore, MemoryError> {
    let path = config.resolve_db_path(base);
    MemoryStore::open_with_options(path, provider, store_options(config))
}

/// Render hits as `[category] (score: 0.83) content`, blank-line separated.
///
/// Degraded signals add a trailing note so callers can tell a partial
/// ranking from a complete one.
pub fn format_search_outcome(outcome: &SearchOutcome) -> String {
    let mut out = if outcome.hits.is_empty() {
        NO_RESULTS.to_string()
    } else {
        outcome
            .hits
            .iter()
            .map(|hit| {
                format!(
                    "[{}] (score: {:.2}) {}",
                    hit.record.category, hit.score, hit.record.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    if let Some(reason) = outcome.vector.reason() {
        out.push_str(&format!("\n\n(note: semantic search unavailable: {reason})"));
    }
    if let Some(reason) = outcome.keyword.reason() {
        out.push_str(&format!("\n\n(note: keyword search unavailable: {reason})"));
    }
    if outcome.skipped_vectors > 0 {
        out.push_str(&format!(
            "\n\n(note: {} stored vectors could not be read)",
            outcome.skipped_vectors
        ));
    }
    out
}
