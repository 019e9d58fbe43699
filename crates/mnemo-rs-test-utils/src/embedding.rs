use mnemo_rs_memory::{EmbeddingError, EmbeddingProvider};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Bag-of-words embedder: each lowercase token adds 1.0 to a hashed bucket.
///
/// Texts sharing words get positive similarity; texts without shared words
/// are orthogonal unless buckets collide.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in token.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        (hash % self.dimension as u64) as usize
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            vector[self.bucket(&token.to_lowercase())] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    fn model_name(&self) -> &str {
        "hashing"
    }
}

/// Embedder with a fixed text-to-vector table, falling back to hashing.
#[derive(Debug)]
pub struct FixedEmbedder {
    table: RwLock<HashMap<String, Vec<f32>>>,
    fallback: HashingEmbedder,
}

impl FixedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            table: RwLock::new(HashMap::new()),
            fallback: HashingEmbedder::new(dimension),
        }
    }

    /// Add a table entry (builder form).
    pub fn with(self, text: &str, vector: Vec<f32>) -> Self {
        self.insert(text, vector);
        self
    }

    /// Add or replace a table entry.
    pub fn insert(&self, text: &str, vector: Vec<f32>) {
        self.table.write().insert(text.to_string(), vector);
    }
}

impl EmbeddingProvider for FixedEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(vector) = self.table.read().get(text) {
            return Ok(vector.clone());
        }
        self.fallback.embed(text)
    }

    fn dimension(&self) -> Option<usize> {
        self.fallback.dimension()
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

/// Embedder that is never available.
#[derive(Debug, Clone, Default)]
pub struct FailingEmbedder;

impl EmbeddingProvider for FailingEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Unavailable("model not installed".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

/// Wraps a provider and can be switched off at runtime.
#[derive(Debug)]
pub struct SwitchableEmbedder<E> {
    inner: E,
    available: AtomicBool,
}

impl<E: EmbeddingProvider> SwitchableEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), EmbeddingError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(EmbeddingError::Unavailable("switched off".to_string()))
        }
    }
}

impl<E: EmbeddingProvider> EmbeddingProvider for SwitchableEmbedder<E> {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.check()?;
        self.inner.embed(text)
    }

    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.check()?;
        self.inner.embed_many(texts)
    }

    fn dimension(&self) -> Option<usize> {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Wraps a provider and counts single and batch calls.
#[derive(Debug)]
pub struct CountingEmbedder<E> {
    inner: E,
    single_calls: AtomicUsize,
    batch_calls: AtomicUsize,
}

impl<E: EmbeddingProvider> CountingEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            single_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
        }
    }

    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

impl<E: EmbeddingProvider> EmbeddingProvider for CountingEmbedder<E> {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text)
    }

    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        texts.iter().map(|text| self.inner.embed(text)).collect()
    }

    fn dimension(&self) -> Option<usize> {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
