//! Embedding provider interface and lazy initialization.
//!
//! The store consumes exactly one external capability: turning text into a
//! fixed-length vector. Providers are constructed by the caller and injected
//! into the store; expensive model loading is deferred to first use through
//! [`LazyEmbeddingProvider`].

use log::{info, warn};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Errors returned by embedding providers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmbeddingError {
    /// The provider cannot produce vectors (model missing, load failure, inference error).
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),
}

/// Text to fixed-dimension vector conversion.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several texts; equivalent to mapping [`EmbeddingProvider::embed`].
    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Output dimension when known without embedding anything.
    fn dimension(&self) -> Option<usize> {
        None
    }

    /// Model identifier used in logs.
    fn model_name(&self) -> &str;
}

/// Provider that is never available. Used when embeddings are disabled.
#[derive(Debug, Clone)]
pub struct DisabledEmbeddingProvider {
    reason: String,
}

impl DisabledEmbeddingProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl EmbeddingProvider for DisabledEmbeddingProvider {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Unavailable(self.reason.clone()))
    }

    fn embed_many(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Unavailable(self.reason.clone()))
    }

    fn model_name(&self) -> &str {
        "disabled"
    }
}

type Initializer =
    Box<dyn FnOnce() -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> + Send + 'static>;

/// Provider that builds its inner provider on first use, exactly once.
///
/// Concurrent first callers block until the single initialization finishes
/// and then observe the same result. A failed initialization is remembered:
/// every later call reports [`EmbeddingError::Unavailable`] with the original
/// reason instead of retrying the load.
pub struct LazyEmbeddingProvider {
    label: String,
    init: Mutex<Option<Initializer>>,
    state: OnceLock<Result<Arc<dyn EmbeddingProvider>, String>>,
}

impl LazyEmbeddingProvider {
    /// Wrap an initializer. Nothing runs until the first embedding call.
    pub fn new<F>(label: impl Into<String>, init: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> + Send + 'static,
    {
        Self {
            label: label.into(),
            init: Mutex::new(Some(Box::new(init))),
            state: OnceLock::new(),
        }
    }

    /// Whether initialization has already run (successfully or not).
    pub fn is_initialized(&self) -> bool {
        self.state.get().is_some()
    }

    fn resolve(&self) -> Result<&Arc<dyn EmbeddingProvider>, EmbeddingError> {
        let state = self.state.get_or_init(|| {
            let Some(init) = self.init.lock().take() else {
                return Err("initializer already consumed".to_string());
            };
            match init() {
                Ok(provider) => {
                    info!(
                        "embedding provider initialized (label={}, model={})",
                        self.label,
                        provider.model_name()
                    );
                    Ok(provider)
                }
                Err(err) => {
                    warn!(
                        "embedding provider failed to initialize (label={}, error={})",
                        self.label, err
                    );
                    Err(match err {
                        EmbeddingError::Unavailable(reason) => reason,
                    })
                }
            }
        });
        state
            .as_ref()
            .map_err(|reason| EmbeddingError::Unavailable(reason.clone()))
    }
}

impl fmt::Debug for LazyEmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyEmbeddingProvider")
            .field("label", &self.label)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl EmbeddingProvider for LazyEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.resolve()?.embed(text)
    }

    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.resolve()?.embed_many(texts)
    }

    fn dimension(&self) -> Option<usize> {
        match self.state.get() {
            Some(Ok(provider)) => provider.dimension(),
            _ => None,
        }
    }

    fn model_name(&self) -> &str {
        &self.label
    }
}
