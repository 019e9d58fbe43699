//! SQLite-backed memory store with hybrid retrieval.
//!
//! One database file holds the record table and its FTS5 shadow index. Every
//! write mirrors into the index inside the same transaction, serialized by a
//! single writer connection. Reads open their own connection and never take
//! the write lock.

use crate::codec;
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::error::MemoryError;
use crate::keyword::{KeywordHit, KeywordIndex};
use crate::model::{MemoryCategory, MemoryId, MemoryRecord};
use crate::outcome::{SearchOutcome, SignalStatus};
use crate::ranker::{self, Candidate, HybridWeights};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Default number of hits returned by search.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;
/// Default number of records returned by listing.
pub const DEFAULT_LIST_LIMIT: usize = 100;
/// Keyword candidates fetched per requested hit.
pub const DEFAULT_KEYWORD_CANDIDATE_MULTIPLIER: usize = 3;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const RECORD_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS memories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT 'fact',
    embedding BLOB,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_memories_created_at ON memories(created_at);
"#;

const RECORD_COLUMNS: &str =
    "id, content, category, embedding IS NOT NULL, created_at, updated_at";

/// Tuning knobs for a store instance.
#[derive(Debug, Clone)]
pub struct MemoryStoreOptions {
    /// Fixed vector dimension; learned from the first vector when unset.
    pub dimension: Option<usize>,
    /// Weights for the hybrid score.
    pub weights: HybridWeights,
    /// Keyword breadth as a multiple of the requested limit.
    pub keyword_candidate_multiplier: usize,
    /// Persist keyword-only records when embedding fails instead of erroring.
    pub store_without_embedding: bool,
}

impl Default for MemoryStoreOptions {
    fn default() -> Self {
        Self {
            dimension: None,
            weights: HybridWeights::default(),
            keyword_candidate_multiplier: DEFAULT_KEYWORD_CANDIDATE_MULTIPLIER,
            store_without_embedding: true,
        }
    }
}

/// Input for batch saves.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMemory {
    pub content: String,
    pub category: MemoryCategory,
}

impl NewMemory {
    pub fn new(content: impl Into<String>, category: MemoryCategory) -> Self {
        Self {
            content: content.into(),
            category,
        }
    }
}

/// Persistent memory store.
pub struct MemoryStore {
    path: PathBuf,
    writer: Mutex<Connection>,
    provider: Arc<dyn EmbeddingProvider>,
    options: MemoryStoreOptions,
    dimension: OnceLock<usize>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("path", &self.path)
            .field("provider", &self.provider.model_name())
            .field("dimension", &self.dimension.get())
            .finish()
    }
}

impl MemoryStore {
    /// Open (or create) a store at `path` with default options.
    pub fn open(
        path: impl AsRef<Path>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, MemoryError> {
        Self::open_with_options(path, provider, MemoryStoreOptions::default())
    }

    /// Open (or create) a store at `path`.
    pub fn open_with_options(
        path: impl AsRef<Path>,
        provider: Arc<dyn EmbeddingProvider>,
        options: MemoryStoreOptions,
    ) -> Result<Self, MemoryError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let journal: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.execute_batch(RECORD_SCHEMA)?;
        KeywordIndex::ensure_schema(&conn)?;

        let dimension = OnceLock::new();
        if let Some(dim) = options.dimension.or_else(|| provider.dimension()) {
            let _ = dimension.set(dim);
        }
        info!(
            "opened memory store (path={}, journal={}, model={}, dimension={:?})",
            path.display(),
            journal,
            provider.model_name(),
            dimension.get()
        );
        Ok(Self {
            path,
            writer: Mutex::new(conn),
            provider,
            options,
            dimension,
        })
    }

    /// Database path backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Vector dimension, once fixed by config or the first vector seen.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension.get().copied()
    }

    /// Save a memory and return its id.
    ///
    /// When the embedding provider is unavailable, or its vector is rejected,
    /// the record is stored keyword-only (`embedded == false`) unless the
    /// store is configured to refuse such writes.
    pub fn save(&self, content: &str, category: MemoryCategory) -> Result<MemoryId, MemoryError> {
        if content.trim().is_empty() {
            return Err(MemoryError::InvalidContent);
        }
        let embedding = match self.provider.embed(content) {
            Ok(vector) => self.accept_write_vector(vector)?,
            Err(err) => {
                if !self.options.store_without_embedding {
                    return Err(err.into());
                }
                warn!("saving memory without embedding (error={err})");
                None
            }
        };

        let now = Utc::now();
        let mut conn = self.writer.lock();
        let tx = conn.transaction()?;
        let id = insert_record(&tx, content, category, embedding.as_deref(), now)?;
        tx.commit()?;
        info!(
            "memory saved (id={}, category={}, embedded={}, content_len={})",
            id,
            category,
            embedding.is_some(),
            content.len()
        );
        Ok(id)
    }

    /// Save several memories in one transaction, embedding them as a batch.
    ///
    /// Validation happens before anything is written; one invalid item
    /// rejects the whole batch.
    pub fn save_many(&self, items: &[NewMemory]) -> Result<Vec<MemoryId>, MemoryError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        if items.iter().any(|item| item.content.trim().is_empty()) {
            return Err(MemoryError::InvalidContent);
        }
        let texts: Vec<&str> = items.iter().map(|item| item.content.as_str()).collect();
        let embeddings: Vec<Option<Vec<f32>>> = match self.provider.embed_many(&texts) {
            Ok(vectors) if vectors.len() == items.len() => vectors
                .into_iter()
                .map(|vector| self.accept_write_vector(vector))
                .collect::<Result<_, _>>()?,
            Ok(vectors) => {
                let err = MemoryError::EmbeddingUnavailable(format!(
                    "provider returned {} vectors for {} texts",
                    vectors.len(),
                    items.len()
                ));
                if !self.options.store_without_embedding {
                    return Err(err);
                }
                warn!("saving batch without embeddings (error={err})");
                vec![None; items.len()]
            }
            Err(err) => {
                if !self.options.store_without_embedding {
                    return Err(err.into());
                }
                warn!("saving batch without embeddings (error={err})");
                vec![None; items.len()]
            }
        };

        let now = Utc::now();
        let mut conn = self.writer.lock();
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(items.len());
        for (item, embedding) in items.iter().zip(&embeddings) {
            ids.push(insert_record(
                &tx,
                &item.content,
                item.category,
                embedding.as_deref(),
                now,
            )?);
        }
        tx.commit()?;
        info!(
            "memory batch saved (count={}, embedded={})",
            ids.len(),
            embeddings.iter().filter(|e| e.is_some()).count()
        );
        Ok(ids)
    }

    /// Hybrid search: vector similarity blended with keyword rank.
    pub fn search(&self, query: &str, limit: usize) -> Result<SearchOutcome, MemoryError> {
        if query.is_empty() {
            return Err(MemoryError::InvalidQuery);
        }
        let (query_vector, vector_status) = self.query_vector(query);
        if limit == 0 {
            return Ok(SearchOutcome {
                hits: Vec::new(),
                vector: vector_status,
                keyword: SignalStatus::Available,
                skipped_vectors: 0,
            });
        }

        let conn = self.reader()?;
        let mut candidates: HashMap<MemoryId, Candidate> = HashMap::new();
        let mut skipped_vectors = 0;
        if let Some(query_vector) = query_vector.as_deref() {
            skipped_vectors = self.scan_vectors(&conn, query_vector, &mut candidates)?;
        }

        let breadth = limit.saturating_mul(self.options.keyword_candidate_multiplier.max(1));
        let keyword = KeywordIndex::query(&conn, query, breadth);
        attach_keyword_hits(&conn, &keyword.hits, &mut candidates)?;

        let mut hits = ranker::rank(candidates.into_values().collect(), self.options.weights);
        hits.truncate(limit);
        debug!(
            "memory search complete (limit={}, returned={}, vector={}, keyword={}, skipped_vectors={})",
            limit,
            hits.len(),
            vector_status.is_available(),
            keyword.status.is_available(),
            skipped_vectors
        );
        Ok(SearchOutcome {
            hits,
            vector: vector_status,
            keyword: keyword.status,
            skipped_vectors,
        })
    }

    /// List records, newest first.
    pub fn get_all(&self, limit: usize) -> Result<Vec<MemoryRecord>, MemoryError> {
        let conn = self.reader()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM memories ORDER BY created_at DESC, id DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit as i64], record_from_row)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        debug!("listed memories (limit={}, returned={})", limit, records.len());
        Ok(records)
    }

    /// Fetch one record by id.
    pub fn get(&self, id: MemoryId) -> Result<Option<MemoryRecord>, MemoryError> {
        let conn = self.reader()?;
        Ok(fetch_record(&conn, id)?)
    }

    /// Delete a record and its index entry. Returns whether it existed.
    pub fn delete(&self, id: MemoryId) -> Result<bool, MemoryError> {
        let mut conn = self.writer.lock();
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM memories WHERE id = ?1", params![id])?;
        let indexed = KeywordIndex::remove(&tx, id)?;
        tx.commit()?;
        if removed > 0 && !indexed {
            warn!("deleted memory had no keyword entry (id={id})");
        }
        debug!("memory delete (id={}, existed={})", id, removed > 0);
        Ok(removed > 0)
    }

    /// Number of live records.
    pub fn count(&self) -> Result<usize, MemoryError> {
        let conn = self.reader()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    fn reader(&self) -> Result<Connection, MemoryError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Embed the query, reporting degradation instead of failing.
    fn query_vector(&self, query: &str) -> (Option<Vec<f32>>, SignalStatus) {
        match self.provider.embed(query) {
            Ok(vector) => match self.accept_vector(vector) {
                Some(vector) => (Some(vector), SignalStatus::Available),
                None => (
                    None,
                    SignalStatus::Degraded("query vector rejected".to_string()),
                ),
            },
            Err(err) => {
                warn!("semantic search unavailable; using keyword-only ranking (error={err})");
                let EmbeddingError::Unavailable(reason) = err;
                (None, SignalStatus::Degraded(reason))
            }
        }
    }

    /// Like [`Self::accept_vector`], but strict stores refuse a rejected vector.
    fn accept_write_vector(&self, vector: Vec<f32>) -> Result<Option<Vec<f32>>, MemoryError> {
        let dimension = vector.len();
        match self.accept_vector(vector) {
            Some(vector) => Ok(Some(vector)),
            None if self.options.store_without_embedding => Ok(None),
            None => Err(MemoryError::EmbeddingUnavailable(format!(
                "embedding rejected (dimension={dimension}, expected={:?})",
                self.dimension.get()
            ))),
        }
    }

    /// Check a freshly produced vector against the store dimension.
    fn accept_vector(&self, vector: Vec<f32>) -> Option<Vec<f32>> {
        if vector.is_empty() {
            warn!("embedding provider returned an empty vector; ignoring it");
            return None;
        }
        if vector.iter().any(|value| !value.is_finite()) {
            warn!("embedding contains non-finite values; ignoring it");
            return None;
        }
        let expected = *self.dimension.get_or_init(|| vector.len());
        if vector.len() != expected {
            warn!(
                "embedding dimension mismatch; ignoring vector (expected={}, actual={})",
                expected,
                vector.len()
            );
            return None;
        }
        Some(vector)
    }

    /// Score every stored vector against the query. Returns skipped count.
    fn scan_vectors(
        &self,
        conn: &Connection,
        query_vector: &[f32],
        candidates: &mut HashMap<MemoryId, Candidate>,
    ) -> Result<usize, MemoryError> {
        let dimension = query_vector.len();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS}, embedding FROM memories WHERE embedding IS NOT NULL"
        ))?;
        let mut rows = stmt.query([])?;
        let mut skipped = 0;
        while let Some(row) = rows.next()? {
            let record = record_from_row(row)?;
            let blob: Vec<u8> = row.get(6)?;
            let vector = match codec::decode_with_dimension(&blob, dimension) {
                Ok(vector) => vector,
                Err(err) => {
                    let err = MemoryError::from(err);
                    warn!("skipping stored vector (id={}, error={err})", record.id);
                    skipped += 1;
                    continue;
                }
            };
            let similarity = ranker::cosine_similarity(query_vector, &vector);
            candidates.insert(
                record.id,
                Candidate {
                    record,
                    similarity,
                    keyword_rank: None,
                },
            );
        }
        Ok(skipped)
    }
}

fn insert_record(
    conn: &Connection,
    content: &str,
    category: MemoryCategory,
    embedding: Option<&[f32]>,
    now: DateTime<Utc>,
) -> Result<MemoryId, MemoryError> {
    let blob = embedding.map(codec::encode);
    conn.execute(
        "INSERT INTO memories (content, category, embedding, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![content, category.as_str(), blob, now, now],
    )?;
    let id = conn.last_insert_rowid();
    KeywordIndex::index(conn, id, content, category)?;
    Ok(id)
}

fn fetch_record(conn: &Connection, id: MemoryId) -> rusqlite::Result<Option<MemoryRecord>> {
    conn.query_row(
        &format!("SELECT {RECORD_COLUMNS} FROM memories WHERE id = ?1"),
        params![id],
        record_from_row,
    )
    .optional()
}

/// Merge keyword hits into the candidate set, loading records not seen by the vector scan.
fn attach_keyword_hits(
    conn: &Connection,
    hits: &[KeywordHit],
    candidates: &mut HashMap<MemoryId, Candidate>,
) -> Result<(), MemoryError> {
    for hit in hits {
        if let Some(candidate) = candidates.get_mut(&hit.id) {
            candidate.keyword_rank = Some(hit.rank);
            continue;
        }
        let Some(record) = fetch_record(conn, hit.id)? else {
            warn!("keyword hit without a stored record (id={})", hit.id);
            continue;
        };
        candidates.insert(
            hit.id,
            Candidate {
                record,
                similarity: None,
                keyword_rank: Some(hit.rank),
            },
        );
    }
    Ok(())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MemoryRecord> {
    let category: String = row.get(2)?;
    Ok(MemoryRecord {
        id: row.get(0)?,
        content: row.get(1)?,
        category: category.parse().unwrap_or_else(|_| {
            warn!("unknown stored category; treating as fact (category={category})");
            MemoryCategory::Fact
        }),
        embedded: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
