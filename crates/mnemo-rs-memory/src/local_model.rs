//! Local ONNX embeddings via fastembed.
//!
//! Models download on first use into the configured cache directory and run
//! fully offline afterwards.

use crate::embedding::{EmbeddingError, EmbeddingProvider, LazyEmbeddingProvider};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "bge-small-en-v1.5";

/// Resolve a model identifier to the fastembed model and its output size.
fn resolve_model(name: &str) -> Option<(EmbeddingModel, usize)> {
    match name.to_ascii_lowercase().as_str() {
        "bge-small-en-v1.5" | "baai/bge-small-en-v1.5" => {
            Some((EmbeddingModel::BGESmallENV15, 384))
        }
        "bge-base-en-v1.5" | "baai/bge-base-en-v1.5" => Some((EmbeddingModel::BGEBaseENV15, 768)),
        "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => {
            Some((EmbeddingModel::AllMiniLML6V2, 384))
        }
        "multilingual-e5-small" | "intfloat/multilingual-e5-small" => {
            Some((EmbeddingModel::MultilingualE5Small, 384))
        }
        _ => None,
    }
}

/// Options for loading a local model.
#[derive(Debug, Clone)]
pub struct FastEmbedOptions {
    pub model: String,
    pub cache_dir: Option<PathBuf>,
    pub show_download_progress: bool,
}

impl Default for FastEmbedOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            cache_dir: None,
            show_download_progress: false,
        }
    }
}

/// Embedding provider backed by a loaded fastembed model.
pub struct FastEmbedProvider {
    model: TextEmbedding,
    name: String,
    dimension: usize,
}

impl FastEmbedProvider {
    /// Load the model now. Prefer [`FastEmbedProvider::lazy`] for startup paths.
    pub fn load(options: &FastEmbedOptions) -> Result<Self, EmbeddingError> {
        let Some((model, dimension)) = resolve_model(&options.model) else {
            return Err(EmbeddingError::Unavailable(format!(
                "unsupported embedding model: {}",
                options.model
            )));
        };
        let mut init = InitOptions::new(model)
            .with_show_download_progress(options.show_download_progress);
        if let Some(cache_dir) = options.cache_dir.clone() {
            init = init.with_cache_dir(cache_dir);
        }
        debug!("loading fastembed model (model={})", options.model);
        let model = TextEmbedding::try_new(init).map_err(|err| {
            EmbeddingError::Unavailable(format!("failed to init embedding model: {err}"))
        })?;
        Ok(Self {
            model,
            name: options.model.clone(),
            dimension,
        })
    }

    /// Build a provider that loads the model on first use.
    pub fn lazy(options: FastEmbedOptions) -> LazyEmbeddingProvider {
        let label = options.model.clone();
        LazyEmbeddingProvider::new(label, move || {
            let provider = FastEmbedProvider::load(&options)?;
            Ok(Arc::new(provider) as Arc<dyn EmbeddingProvider>)
        })
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_many(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Unavailable("no embedding returned".to_string()))
    }

    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.model
            .embed(texts.to_vec(), None)
            .map_err(|err| EmbeddingError::Unavailable(format!("embedding error: {err}")))
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_model;

    #[test]
    fn resolves_known_models() {
        assert_eq!(resolve_model("bge-small-en-v1.5").map(|(_, dim)| dim), Some(384));
        assert_eq!(resolve_model("BAAI/bge-base-en-v1.5").map(|(_, dim)| dim), Some(768));
        assert!(resolve_model("unknown-model").is_none());
    }
}
