//! SQLite index store
//!
//! Three tables: `Words` (unique normalized words), `Paragraphs` (original and
//! normalized text) and `WordsToParagraphs` (first position of each word in
//! each paragraph). Uses r2d2 connection pooling so the dispatcher worker and
//! the calling thread read through separate connections.

use crate::index::IndexStore;
use crate::interface::{MatchKind, SearchError};
use crate::models::{ParagraphId, ParagraphOccurrence, StoredParagraph, WordId};
use parking_lot::RwLock;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OpenFlags};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Word ids bound per statement when expanding occurrence lookups.
/// Keeps well under SQLite's host parameter limit.
const MAX_IDS_PER_QUERY: usize = 500;

/// Connections kept open for an in-memory index
const MEMORY_POOL_SIZE: u32 = 4;

/// Distinguishes the in-memory databases opened by one process
static MEMORY_DB_SEQ: AtomicUsize = AtomicUsize::new(0);

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database closed")]
    Unavailable,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Seed file error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Escape LIKE wildcards so the token is matched literally (ESCAPE '\')
fn escape_like(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len());
    for c in token.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn memory_manager(name: &str) -> SqliteConnectionManager {
    SqliteConnectionManager::file(format!("file:{}?mode=memory&cache=shared", name))
        .with_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys=ON;")?;
            Ok(())
        })
}

/// Thread-safe index database using connection pooling
///
/// The pool sits behind a lock so `close()` can take the store offline while
/// other threads still hold a reference; afterwards every lookup reports the
/// store as unavailable.
pub struct IndexDatabase {
    pool: RwLock<Option<Pool<SqliteConnectionManager>>>,
}

impl IndexDatabase {
    /// Open or create an index database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DatabaseResult<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| {
                conn.execute_batch("
                    PRAGMA journal_mode=WAL;
                    PRAGMA synchronous=NORMAL;
                    PRAGMA foreign_keys=ON;
                    PRAGMA cache_size=-32000;
                ")?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(8)
            .build(manager)?;

        let db = Self { pool: RwLock::new(Some(pool)) };
        db.setup_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (tests, demos)
    pub fn open_in_memory() -> DatabaseResult<Self> {
        let name = format!(
            "seek-{}-{}",
            std::process::id(),
            MEMORY_DB_SEQ.fetch_add(1, Ordering::Relaxed)
        );
        Self::open_shared_memory(&name)
    }

    /// Named shared-cache memory database. Every pooled connection sees the
    /// same data, which lives as long as one connection stays open, so pool
    /// connections are never retired.
    fn open_shared_memory(name: &str) -> DatabaseResult<Self> {
        let pool = Pool::builder()
            .max_size(MEMORY_POOL_SIZE)
            .max_lifetime(None)
            .idle_timeout(None)
            .build(memory_manager(name))?;

        let db = Self { pool: RwLock::new(Some(pool)) };
        db.setup_schema()?;
        Ok(db)
    }

    /// Take the store offline. Subsequent lookups fail with `Unavailable`.
    pub fn close(&self) {
        if self.pool.write().take().is_some() {
            tracing::info!("index database closed");
        }
    }

    /// Get a connection from the pool
    fn get_conn(&self) -> DatabaseResult<PooledConnection<SqliteConnectionManager>> {
        // Clone the handle so the lock is not held while waiting on the pool
        let pool = self.pool.read().clone().ok_or(DatabaseError::Unavailable)?;
        Ok(pool.get()?)
    }

    fn setup_schema(&self) -> DatabaseResult<()> {
        let conn = self.get_conn()?;

        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS Words (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                word TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS Paragraphs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                original_text TEXT NOT NULL,
                normalized_text TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS WordsToParagraphs (
                word_id INTEGER NOT NULL REFERENCES Words(id) ON DELETE CASCADE,
                paragraph_id INTEGER NOT NULL REFERENCES Paragraphs(id) ON DELETE CASCADE,
                word_position INTEGER NOT NULL,
                PRIMARY KEY (word_id, paragraph_id)
            );

            CREATE INDEX IF NOT EXISTS idx_word_id ON WordsToParagraphs(word_id);
            CREATE INDEX IF NOT EXISTS idx_paragraph_id ON WordsToParagraphs(paragraph_id);
        "#)?;

        Ok(())
    }

    /// Get the database size in bytes
    pub fn database_size(&self) -> DatabaseResult<i64> {
        let conn = self.get_conn()?;
        let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
        let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
        Ok(page_count * page_size)
    }

    pub fn paragraph_count(&self) -> DatabaseResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM Paragraphs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn word_count(&self) -> DatabaseResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM Words", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bulk load / maintenance
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a single paragraph and its occurrences. Returns the paragraph id.
    pub fn insert_paragraph(&self, paragraph: &StoredParagraph) -> DatabaseResult<ParagraphId> {
        let ids = self.insert_paragraphs(std::slice::from_ref(paragraph))?;
        Ok(ids[0])
    }

    /// Insert paragraphs in one transaction, returning their ids in input order.
    ///
    /// Words are created on first sight; an existing word keeps its id.
    pub fn insert_paragraphs(&self, paragraphs: &[StoredParagraph]) -> DatabaseResult<Vec<ParagraphId>> {
        #[cfg(feature = "perf-log")]
        let t0 = std::time::Instant::now();

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let mut ids = Vec::with_capacity(paragraphs.len());

        {
            let mut insert_paragraph = tx.prepare_cached(
                "INSERT INTO Paragraphs (original_text, normalized_text) VALUES (?1, ?2)",
            )?;
            let mut insert_word = tx.prepare_cached(
                "INSERT INTO Words (word) VALUES (?1) ON CONFLICT(word) DO NOTHING",
            )?;
            let mut select_word = tx.prepare_cached("SELECT id FROM Words WHERE word = ?1")?;
            let mut insert_occurrence = tx.prepare_cached(
                "INSERT OR IGNORE INTO WordsToParagraphs (word_id, paragraph_id, word_position) VALUES (?1, ?2, ?3)",
            )?;

            for paragraph in paragraphs {
                insert_paragraph.execute(params![paragraph.original_text(), paragraph.normalized_text()])?;
                let paragraph_id = tx.last_insert_rowid();

                for (word, position) in paragraph.word_positions() {
                    insert_word.execute([word])?;
                    let word_id: WordId = select_word.query_row([word], |row| row.get(0))?;
                    insert_occurrence.execute(params![word_id, paragraph_id, position as i64])?;
                }
                ids.push(paragraph_id);
            }
        }

        tx.commit()?;

        #[cfg(feature = "perf-log")]
        tracing::debug!(
            elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0,
            paragraphs = ids.len(),
            "[perf] bulk insert"
        );

        Ok(ids)
    }

    /// Load a JSON seed file (array of paragraph strings).
    /// Paragraphs that fail normalization are skipped with a warning.
    pub fn load_seed_file<P: AsRef<Path>>(&self, path: P, max_len: usize) -> DatabaseResult<usize> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let texts: Vec<String> = serde_json::from_str(&raw)?;

        let paragraphs: Vec<StoredParagraph> = texts
            .iter()
            .filter_map(|text| match StoredParagraph::new(text, max_len) {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping seed paragraph");
                    None
                }
            })
            .collect();

        let ids = self.insert_paragraphs(&paragraphs)?;
        self.analyze()?;
        tracing::info!(
            path = %path.as_ref().display(),
            loaded = ids.len(),
            skipped = texts.len() - ids.len(),
            "loaded seed paragraphs"
        );
        Ok(ids.len())
    }

    /// Refresh SQLite planner statistics after a bulk load
    pub fn analyze(&self) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch("ANALYZE Words; ANALYZE Paragraphs; ANALYZE WordsToParagraphs;")?;
        Ok(())
    }

    /// Delete a paragraph and its occurrences, then drop words no paragraph uses.
    /// Returns false when no paragraph had that id.
    pub fn delete_paragraph(&self, id: ParagraphId) -> DatabaseResult<bool> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let deleted = tx.execute("DELETE FROM Paragraphs WHERE id = ?1", [id])?;
        tx.execute(
            "DELETE FROM Words WHERE id NOT IN (SELECT DISTINCT word_id FROM WordsToParagraphs)",
            [],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Delete everything. Ids are never reused afterwards (AUTOINCREMENT).
    pub fn clear(&self) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            "DELETE FROM WordsToParagraphs; DELETE FROM Paragraphs; DELETE FROM Words;",
        )?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Word ids matching `token`, ascending
    pub fn query_word_ids(&self, token: &str, kind: MatchKind) -> DatabaseResult<Vec<WordId>> {
        let conn = self.get_conn()?;
        let (sql, arg) = match kind {
            MatchKind::Exact => ("SELECT id FROM Words WHERE word = ?1 ORDER BY id", token.to_string()),
            MatchKind::BeginsWith | MatchKind::Contains => (
                r#"SELECT id FROM Words WHERE word LIKE ?1 ESCAPE '\' ORDER BY id"#,
                kind.like_pattern(&escape_like(token)),
            ),
        };

        let mut stmt = conn.prepare_cached(sql)?;
        let ids = stmt
            .query_map([arg], |row| row.get::<_, WordId>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Paragraphs containing any of `word_ids`, each with its full ordered word list
    pub fn query_occurrences(&self, word_ids: &[WordId]) -> DatabaseResult<Vec<ParagraphOccurrence>> {
        if word_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids = word_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let conn = self.get_conn()?;
        let mut occurrences = Vec::new();

        for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
            let placeholders = chunk.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let sql = format!(
                r#"SELECT matched.paragraph_id, p.original_text, matched.word_id, wtp.word_id
                   FROM WordsToParagraphs matched
                   JOIN Paragraphs p ON p.id = matched.paragraph_id
                   JOIN WordsToParagraphs wtp ON wtp.paragraph_id = matched.paragraph_id
                   WHERE matched.word_id IN ({})
                   ORDER BY matched.paragraph_id, matched.word_id, wtp.word_position"#,
                placeholders
            );

            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(rusqlite::params_from_iter(chunk.iter()))?;

            while let Some(row) = rows.next()? {
                let paragraph_id: ParagraphId = row.get(0)?;
                let matched_word_id: WordId = row.get(2)?;
                let word_id: WordId = row.get(3)?;

                match occurrences.last_mut() {
                    Some(ParagraphOccurrence { paragraph_id: p, matched_word_id: m, word_ids, .. })
                        if *p == paragraph_id && *m == matched_word_id =>
                    {
                        word_ids.push(word_id);
                    }
                    _ => occurrences.push(ParagraphOccurrence {
                        paragraph_id,
                        original_text: row.get(1)?,
                        matched_word_id,
                        word_ids: vec![word_id],
                    }),
                }
            }
        }

        // Chunks are each ordered; restore the global order across them
        if ids.len() > MAX_IDS_PER_QUERY {
            occurrences.sort_by_key(|o| (o.paragraph_id, o.matched_word_id));
        }

        Ok(occurrences)
    }

    /// Original texts for `ids`, preserving input order and skipping unknown ids
    pub fn original_texts(&self, ids: &[ParagraphId]) -> DatabaseResult<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let mut by_id: HashMap<ParagraphId, String> = HashMap::with_capacity(ids.len());

        for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
            let placeholders = chunk.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let sql = format!(
                "SELECT id, original_text FROM Paragraphs WHERE id IN ({})",
                placeholders
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, ParagraphId>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (id, text) = row?;
                by_id.insert(id, text);
            }
        }

        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }

    /// SQLite query plan for the word lookup used by `kind`
    pub fn explain_word_lookup(&self, kind: MatchKind) -> DatabaseResult<Vec<String>> {
        let conn = self.get_conn()?;
        let (sql, arg) = match kind {
            MatchKind::Exact => ("EXPLAIN QUERY PLAN SELECT id FROM Words WHERE word = ?1", "a".to_string()),
            _ => (
                r#"EXPLAIN QUERY PLAN SELECT id FROM Words WHERE word LIKE ?1 ESCAPE '\'"#,
                kind.like_pattern("a"),
            ),
        };
        let mut stmt = conn.prepare(sql)?;
        let details = stmt
            .query_map([arg], |row| row.get::<_, String>(3))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(details)
    }
}

impl IndexStore for IndexDatabase {
    fn is_valid(&self) -> bool {
        self.pool.read().is_some()
    }

    fn find_word_ids(&self, token: &str, kind: MatchKind) -> Result<Vec<WordId>, SearchError> {
        Ok(self.query_word_ids(token, kind)?)
    }

    fn occurrences_for_words(
        &self,
        word_ids: &[WordId],
    ) -> Result<Vec<ParagraphOccurrence>, SearchError> {
        Ok(self.query_occurrences(word_ids)?)
    }
}
