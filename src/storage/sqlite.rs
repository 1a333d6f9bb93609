//! SQLite-backed [`JobStore`]
//!
//! Companies are normalized into their own table. Review actions live in a
//! side table keyed by job so clearing a status is a delete.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::{InsertOutcome, JobStore, StorageError, StoredJob};
use crate::job::JobPosting;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL,
    location TEXT
);

CREATE TABLE IF NOT EXISTS jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    company_id INTEGER NOT NULL,
    time_posted TEXT,
    link TEXT,
    type TEXT,
    description TEXT,
    is_new INTEGER NOT NULL DEFAULT 1,
    UNIQUE(title, company_id),
    FOREIGN KEY (company_id) REFERENCES companies(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_jobs_review_order ON jobs(is_new DESC, time_posted DESC);

CREATE TABLE IF NOT EXISTS user_actions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id INTEGER UNIQUE NOT NULL,
    status TEXT,
    timestamp TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY (job_id) REFERENCES jobs(id) ON DELETE CASCADE
);
"#;

#[derive(Clone)]
pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    /// Open the database at `path`, creating it and its parent directory if
    /// missing.
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA_SQL).execute(&pool).await?;
        debug!("Opened job store at {}", path.display());

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn insert(&self, job: &JobPosting) -> Result<InsertOutcome, StorageError> {
        if !job.is_complete() {
            return Err(StorageError::InvalidInput(
                "title and company must not be empty".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO companies (name, location) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
            .bind(&job.company)
            .bind(&job.location)
            .execute(&mut *tx)
            .await?;

        let (company_id,): (i64,) = sqlx::query_as("SELECT id FROM companies WHERE name = ?")
            .bind(&job.company)
            .fetch_one(&mut *tx)
            .await?;

        let result = sqlx::query(
            r#"
            INSERT INTO jobs (title, company_id, time_posted, link, type, description)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(title, company_id) DO NOTHING
            "#,
        )
        .bind(&job.title)
        .bind(company_id)
        .bind(&job.posted_at)
        .bind(&job.link)
        .bind(&job.job_type)
        .bind(&job.description)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Ok(InsertOutcome::Duplicate);
        }
        Ok(InsertOutcome::Inserted {
            id: result.last_insert_rowid(),
        })
    }

    async fn list(&self, limit: Option<u32>) -> Result<Vec<StoredJob>, StorageError> {
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map_or(-1, i64::from);

        let rows = sqlx::query(
            r#"
            SELECT j.id, j.title, c.name AS company, c.location, j.time_posted,
                   j.link, j.type, j.description, j.is_new, ua.status
            FROM jobs j
            JOIN companies c ON j.company_id = c.id
            LEFT JOIN user_actions ua ON ua.job_id = j.id
            ORDER BY j.is_new DESC, j.time_posted DESC, j.id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<StoredJob, StorageError> {
                Ok(StoredJob {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    company: row.try_get("company")?,
                    location: row.try_get("location")?,
                    posted_at: row.try_get("time_posted")?,
                    link: row.try_get("link")?,
                    job_type: row.try_get("type")?,
                    description: row.try_get("description")?,
                    status: row.try_get("status")?,
                    is_new: row.try_get::<i64, _>("is_new")? != 0,
                })
            })
            .collect()
    }

    async fn mark_seen(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("UPDATE jobs SET is_new = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_status(&self, id: i64, status: Option<&str>) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE jobs SET is_new = 0 WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Ok(false);
        }

        match status {
            Some(status) => {
                sqlx::query(
                    r#"
                    INSERT INTO user_actions (job_id, status) VALUES (?, ?)
                    ON CONFLICT(job_id) DO UPDATE SET
                        status = excluded.status,
                        timestamp = datetime('now')
                    "#,
                )
                .bind(id)
                .bind(status)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM user_actions WHERE job_id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
