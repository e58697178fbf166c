//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! Every write opens its own transaction; a transaction that is dropped
//! without `commit` rolls back, so an early return or a panic never leaves a
//! half-written unit behind.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    ArticleRecord, CommentRecord, NewArticle, NewComment, RunRecord, RunStatus, TIMESTAMP_FORMAT,
};
use crate::HarvestError;
use chrono::{Local, NaiveDateTime};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = init_database(path)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Returns true if the error is a UNIQUE constraint violation
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}

fn article_from_row(row: &Row<'_>) -> rusqlite::Result<ArticleRecord> {
    let timestamp: Option<String> = row.get(1)?;
    Ok(ArticleRecord {
        id: row.get(0)?,
        timestamp: timestamp
            .and_then(|t| NaiveDateTime::parse_from_str(&t, TIMESTAMP_FORMAT).ok()),
        board: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        link: row.get(5)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        mode: row.get(1)?,
        config_hash: row.get(2)?,
        started_at: row.get(3)?,
        finished_at: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(RunStatus::Running),
    })
}

impl Storage for SqliteStorage {
    // ===== Articles =====

    fn insert_article(&mut self, article: &NewArticle) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO articles (timestamp, board, title, content, link) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                article.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                article.board,
                article.title,
                article.content,
                article.link
            ],
        );

        if let Err(e) = inserted {
            // tx is dropped here and rolls back
            if is_unique_violation(&e) {
                return Err(StorageError::Duplicate {
                    link: article.link.clone(),
                });
            }
            return Err(e.into());
        }

        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    fn get_article(&self, article_id: i64) -> StorageResult<ArticleRecord> {
        self.conn
            .query_row(
                "SELECT id, timestamp, board, title, content, link FROM articles WHERE id = ?1",
                params![article_id],
                article_from_row,
            )
            .optional()?
            .ok_or(StorageError::ArticleNotFound(article_id))
    }

    fn get_article_by_link(&self, link: &str) -> StorageResult<Option<ArticleRecord>> {
        let article = self
            .conn
            .query_row(
                "SELECT id, timestamp, board, title, content, link FROM articles WHERE link = ?1",
                params![link],
                article_from_row,
            )
            .optional()?;
        Ok(article)
    }

    fn delete_article(&mut self, article_id: i64) -> StorageResult<bool> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM articles WHERE id = ?1", params![article_id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    // ===== Comments =====

    fn insert_comments(
        &mut self,
        article_id: i64,
        comments: &[NewComment],
    ) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO comments (article_id, tag, user_id, content, raw_time) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for comment in comments {
                stmt.execute(params![
                    article_id,
                    comment.tag,
                    comment.user_id,
                    comment.content,
                    comment.raw_time
                ])?;
            }
        }
        tx.commit()?;
        Ok(comments.len())
    }

    fn get_comments(&self, article_id: i64) -> StorageResult<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, article_id, tag, user_id, content, raw_time FROM comments
             WHERE article_id = ?1 ORDER BY id",
        )?;

        let comments = stmt
            .query_map(params![article_id], |row| {
                Ok(CommentRecord {
                    id: row.get(0)?,
                    article_id: row.get(1)?,
                    tag: row.get(2)?,
                    user_id: row.get(3)?,
                    content: row.get(4)?,
                    raw_time: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    // ===== Runs =====

    fn create_run(&mut self, mode: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string();
        self.conn.execute(
            "INSERT INTO runs (mode, config_hash, started_at, status) VALUES (?1, ?2, ?3, ?4)",
            params![mode, config_hash, now, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, mode, config_hash, started_at, finished_at, status
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    // ===== Statistics =====

    fn count_articles(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_comments(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_articles_by_board(&self) -> StorageResult<BTreeMap<String, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT board, COUNT(*) FROM articles GROUP BY board")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let (board, count) = row?;
            counts.insert(board, count as u64);
        }

        Ok(counts)
    }
}

/// Initializes or opens a database at the given path
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(Connection)` - Successfully opened/created database
/// * `Err(rusqlite::Error)` - Failed to open database
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}
