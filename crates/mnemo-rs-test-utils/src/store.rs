use crate::embedding::FixedEmbedder;
use mnemo_rs_memory::{EmbeddingProvider, MemoryError, MemoryStore, MemoryStoreOptions};
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Dimension used by [`scenario_embedder`].
pub const SCENARIO_DIMENSION: usize = 4;

/// A store backed by a database file in a temporary directory.
///
/// The directory is removed when the value drops.
#[derive(Debug)]
pub struct TempStore {
    store: MemoryStore,
    dir: TempDir,
}

impl TempStore {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Result<Self, MemoryError> {
        Self::with_options(provider, MemoryStoreOptions::default())
    }

    pub fn with_options(
        provider: Arc<dyn EmbeddingProvider>,
        options: MemoryStoreOptions,
    ) -> Result<Self, MemoryError> {
        let dir = tempfile::tempdir()?;
        let store = MemoryStore::open_with_options(dir.path().join("memory.db"), provider, options)?;
        Ok(Self { store, dir })
    }

    /// Path of the database file.
    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("memory.db")
    }

    /// Close the store, keeping the directory so it can be reopened.
    pub fn into_parts(self) -> (MemoryStore, TempDir) {
        (self.store, self.dir)
    }
}

impl Deref for TempStore {
    type Target = MemoryStore;

    fn deref(&self) -> &MemoryStore {
        &self.store
    }
}

/// Embedder with hand-picked vectors for a small preference scenario.
///
/// "User prefers dark mode" and the theme question point the same way;
/// the lesson and the deadline are orthogonal to it.
pub fn scenario_embedder() -> FixedEmbedder {
    FixedEmbedder::new(SCENARIO_DIMENSION)
        .with("User prefers dark mode", vec![0.9, 0.1, 0.0, 0.0])
        .with("Deploy on Fridays is risky", vec![0.0, 0.0, 1.0, 0.0])
        .with("Project deadline is March 1", vec![0.0, 0.0, 0.0, 1.0])
        .with("what theme does the user like", vec![0.8, 0.2, 0.0, 0.0])
}
