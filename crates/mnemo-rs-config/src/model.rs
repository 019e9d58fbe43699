//! Configuration schema for Mnemo.

use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root config for a Mnemo memory store.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MnemoConfig {
    #[serde(default, rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub memory: MemoryStoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl MnemoConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> MnemoConfigBuilder {
        MnemoConfigBuilder::new()
    }

    /// Database path, with `~/` expanded and relative paths joined onto `base`.
    pub fn resolve_db_path(&self, base: impl AsRef<Path>) -> PathBuf {
        let raw = self.memory.path.as_str();
        if let Some(rest) = raw.strip_prefix("~/")
            && let Some(dirs) = UserDirs::new()
        {
            return dirs.home_dir().join(rest);
        }
        let path = PathBuf::from(raw);
        if path.is_absolute() {
            path
        } else {
            base.as_ref().join(path)
        }
    }
}

/// Builder for assembling a `MnemoConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct MnemoConfigBuilder {
    config: MnemoConfig,
}

impl MnemoConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: MnemoConfig::default(),
        }
    }

    /// Replace the store configuration.
    pub fn memory(mut self, memory: MemoryStoreConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Replace the embedding configuration.
    pub fn embedding(mut self, embedding: EmbeddingConfig) -> Self {
        self.config.embedding = embedding;
        self
    }

    /// Set the database path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.memory.path = path.into();
        self
    }

    /// Finalize and return the built `MnemoConfig`.
    pub fn build(self) -> MnemoConfig {
        self.config
    }
}

/// Store location, limits and ranking weights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryStoreConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
    #[serde(default = "default_keyword_candidate_multiplier")]
    pub keyword_candidate_multiplier: usize,
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f32,
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f32,
    /// Keep records whose embedding failed, searchable by keyword only.
    #[serde(default = "default_store_without_embedding")]
    pub store_without_embedding: bool,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            search_limit: default_search_limit(),
            list_limit: default_list_limit(),
            keyword_candidate_multiplier: default_keyword_candidate_multiplier(),
            vector_weight: default_vector_weight(),
            keyword_weight: default_keyword_weight(),
            store_without_embedding: default_store_without_embedding(),
        }
    }
}

/// Default database location, relative to the working directory.
fn default_db_path() -> String {
    ".mnemo/memory.db".to_string()
}

fn default_search_limit() -> usize {
    5
}

fn default_list_limit() -> usize {
    100
}

/// Keyword candidates fetched per requested hit.
fn default_keyword_candidate_multiplier() -> usize {
    3
}

/// Default semantic similarity weight.
fn default_vector_weight() -> f32 {
    0.7
}

/// Default keyword rank weight.
fn default_keyword_weight() -> f32 {
    0.3
}

fn default_store_without_embedding() -> bool {
    true
}

/// Local embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_enabled")]
    pub enabled: bool,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Expected vector size; learned from the first vector when unset.
    #[serde(default)]
    pub dimension: Option<usize>,
    /// Model weight cache; the library default when unset.
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub show_download_progress: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: default_embedding_enabled(),
            model: default_embedding_model(),
            dimension: None,
            cache_dir: None,
            show_download_progress: false,
        }
    }
}

fn default_embedding_enabled() -> bool {
    true
}

/// Default local embedding model identifier.
fn default_embedding_model() -> String {
    "bge-small-en-v1.5".to_string()
}
