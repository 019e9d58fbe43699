//! Full-text keyword index over memory content (SQLite FTS5).
//!
//! The index lives in the same database as the record table and is written
//! by the store inside the same transaction as the record itself. Queries
//! never fail: backend errors degrade to an empty hit list with the reason
//! attached.

use crate::model::{MemoryCategory, MemoryId};
use crate::outcome::SignalStatus;
use log::{debug, warn};
use regex::Regex;
use rusqlite::{Connection, params};
use std::sync::OnceLock;

const FTS_SCHEMA: &str = "CREATE VIRTUAL TABLE IF NOT EXISTS memories_fts USING fts5(\
     content, category, tokenize='unicode61')";

/// One keyword match. Lower `rank` is a better match (FTS5 bm25).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeywordHit {
    pub id: MemoryId,
    pub rank: f64,
}

/// Result of a keyword query.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordOutcome {
    pub hits: Vec<KeywordHit>,
    pub status: SignalStatus,
}

impl KeywordOutcome {
    fn empty() -> Self {
        Self {
            hits: Vec::new(),
            status: SignalStatus::Available,
        }
    }

    fn degraded(reason: String) -> Self {
        Self {
            hits: Vec::new(),
            status: SignalStatus::Degraded(reason),
        }
    }
}

/// Keyword index operations against an open connection or transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIndex;

impl KeywordIndex {
    /// Create the FTS table if it does not exist.
    pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(FTS_SCHEMA)
    }

    /// Insert or replace the indexed terms for a record.
    pub fn index(
        conn: &Connection,
        id: MemoryId,
        content: &str,
        category: MemoryCategory,
    ) -> rusqlite::Result<()> {
        conn.execute("DELETE FROM memories_fts WHERE rowid = ?1", params![id])?;
        conn.execute(
            "INSERT INTO memories_fts(rowid, content, category) VALUES (?1, ?2, ?3)",
            params![id, content, category.as_str()],
        )?;
        Ok(())
    }

    /// Remove the indexed terms for a record. Returns whether an entry existed.
    pub fn remove(conn: &Connection, id: MemoryId) -> rusqlite::Result<bool> {
        let removed = conn.execute("DELETE FROM memories_fts WHERE rowid = ?1", params![id])?;
        Ok(removed > 0)
    }

    /// Best `limit` matches for free text, best first.
    pub fn query(conn: &Connection, text: &str, limit: usize) -> KeywordOutcome {
        let Some(expression) = match_expression(text) else {
            debug!("keyword query empty after sanitizing; skipping");
            return KeywordOutcome::empty();
        };
        if limit == 0 {
            return KeywordOutcome::empty();
        }
        match run_query(conn, &expression, limit) {
            Ok(hits) => {
                debug!(
                    "keyword query complete (terms={}, hits={})",
                    expression, hits.len()
                );
                KeywordOutcome {
                    hits,
                    status: SignalStatus::Available,
                }
            }
            Err(err) => {
                warn!("keyword search failed; falling back to vector-only (error={err})");
                KeywordOutcome::degraded(err.to_string())
            }
        }
    }
}

fn run_query(
    conn: &Connection,
    expression: &str,
    limit: usize,
) -> rusqlite::Result<Vec<KeywordHit>> {
    let mut stmt = conn.prepare(
        "SELECT rowid, rank FROM memories_fts \
         WHERE memories_fts MATCH ?1 ORDER BY rank, rowid LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![expression, limit as i64], |row| {
        Ok(KeywordHit {
            id: row.get(0)?,
            rank: row.get(1)?,
        })
    })?;
    rows.collect()
}

static UNSAFE_CHARS: OnceLock<Option<Regex>> = OnceLock::new();

/// Strip characters that are meaningless or unsafe for the FTS query syntax.
pub fn sanitize_query(text: &str) -> String {
    let Some(regex) = UNSAFE_CHARS.get_or_init(|| Regex::new(r"[^\w\s]").ok()) else {
        warn!("keyword sanitizer unavailable; skipping keyword query");
        return String::new();
    };
    regex
        .replace_all(text, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build an FTS5 MATCH expression: each term quoted, any term may match.
fn match_expression(text: &str) -> Option<String> {
    let sanitized = sanitize_query(text);
    if sanitized.is_empty() {
        return None;
    }
    Some(
        sanitized
            .split(' ')
            .map(|term| format!("\"{term}\""))
            .collect::<Vec<_>>()
            .join(" OR "),
    )
}

#[cfg(test)]
mod tests {
    use super::{KeywordIndex, match_expression, sanitize_query};
    use crate::model::MemoryCategory;
    use crate::outcome::SignalStatus;
    use pretty_assertions::assert_eq;
    use rusqlite::Connection;

    fn indexed() -> Connection {
        let conn = Connection::open_in_memory().expect("open");
        KeywordIndex::ensure_schema(&conn).expect("schema");
        KeywordIndex::index(&conn, 1, "User prefers dark mode", MemoryCategory::Preference)
            .expect("index 1");
        KeywordIndex::index(&conn, 2, "Deploy on Fridays is risky", MemoryCategory::Lesson)
            .expect("index 2");
        KeywordIndex::index(&conn, 3, "Dark roast coffee in the mode of", MemoryCategory::Fact)
            .expect("index 3");
        conn
    }

    #[test]
    fn sanitize_strips_query_syntax() {
        assert_eq!(sanitize_query("dark-mode? \"yes\" (NEAR)"), "dark mode yes NEAR");
        assert_eq!(sanitize_query("  ***  "), "");
        assert_eq!(sanitize_query("snake_case ok"), "snake_case ok");
        assert_eq!(sanitize_query("café/naïve"), "café naïve");
    }

    #[test]
    fn match_expression_quotes_each_term() {
        assert_eq!(
            match_expression("dark AND mode").as_deref(),
            Some("\"dark\" OR \"AND\" OR \"mode\"")
        );
        assert_eq!(match_expression("?!"), None);
    }

    #[test]
    fn query_orders_best_match_first() {
        let conn = indexed();
        let outcome = KeywordIndex::query(&conn, "dark mode", 10);
        assert_eq!(outcome.status, SignalStatus::Available);
        let ids: Vec<_> = outcome.hits.iter().map(|hit| hit.id).collect();
        assert!(ids.contains(&1));
        assert!(ids.contains(&3));
        assert!(!ids.contains(&2));
        assert!(outcome.hits.windows(2).all(|pair| pair[0].rank <= pair[1].rank));
    }

    #[test]
    fn query_respects_limit() {
        let conn = indexed();
        let outcome = KeywordIndex::query(&conn, "dark mode", 1);
        assert_eq!(outcome.hits.len(), 1);
        assert!(KeywordIndex::query(&conn, "dark", 0).hits.is_empty());
    }

    #[test]
    fn empty_query_short_circuits() {
        let conn = indexed();
        let outcome = KeywordIndex::query(&conn, "!!!", 5);
        assert!(outcome.hits.is_empty());
        assert_eq!(outcome.status, SignalStatus::Available);
    }

    #[test]
    fn remove_drops_terms() {
        let conn = indexed();
        assert!(KeywordIndex::remove(&conn, 2).expect("remove"));
        assert!(!KeywordIndex::remove(&conn, 2).expect("remove again"));
        assert!(KeywordIndex::query(&conn, "Fridays", 5).hits.is_empty());
    }

    #[test]
    fn missing_index_degrades_instead_of_failing() {
        let conn = Connection::open_in_memory().expect("open");
        let outcome = KeywordIndex::query(&conn, "anything", 5);
        assert!(outcome.hits.is_empty());
        assert!(matches!(outcome.status, SignalStatus::Degraded(_)));
    }
}
