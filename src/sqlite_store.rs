//! SQLite-backed [`Store`] implementation.
//!
//! Maps each [`Store`] operation onto a single SQL statement against the
//! `mistake_book` table, so every primitive is atomic on its own:
//!
//! - `upsert_incorrect` is one `INSERT … ON CONFLICT(storage_path,
//!   question_id) DO UPDATE … RETURNING`.
//! - `compare_and_set` is one `UPDATE … WHERE id = ? AND <old progress>`.
//!
//! Timestamps are stored as unix milliseconds; `options` as a JSON array.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use mistake_book_core::models::{IncorrectAnswer, LedgerStats, MistakeRecord, Progress};
use mistake_book_core::store::Store;

const RECORD_COLUMNS: &str = "id, storage_path, file_name, question_id, question, options, \
     answer, wrong_count, correct_streak, mastered, last_seen_at, created_at";

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn from_millis(ms: i64, column: &str) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| anyhow!("{column} out of range: {ms}"))
}

fn to_u32(value: i64, column: &str) -> Result<u32> {
    u32::try_from(value).with_context(|| format!("{column} out of range: {value}"))
}

fn row_to_record(row: &SqliteRow) -> Result<MistakeRecord> {
    let options_json: String = row.try_get("options")?;
    let options: Vec<String> =
        serde_json::from_str(&options_json).context("options column is not a JSON array")?;

    Ok(MistakeRecord {
        id: row.try_get("id")?,
        document_ref: row.try_get("storage_path")?,
        document_name: row.try_get("file_name")?,
        question_id: row.try_get("question_id")?,
        question_text: row.try_get("question")?,
        options,
        correct_answer: row.try_get("answer")?,
        wrong_count: to_u32(row.try_get("wrong_count")?, "wrong_count")?,
        correct_streak: to_u32(row.try_get("correct_streak")?, "correct_streak")?,
        mastered: row.try_get("mastered")?,
        last_seen_at: from_millis(row.try_get("last_seen_at")?, "last_seen_at")?,
        created_at: from_millis(row.try_get("created_at")?, "created_at")?,
    })
}

fn sql_limit(limit: Option<usize>) -> i64 {
    // SQLite treats a negative LIMIT as unbounded.
    limit
        .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
        .unwrap_or(-1)
}

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_incorrect(
        &self,
        item: &IncorrectAnswer,
        now: DateTime<Utc>,
    ) -> Result<MistakeRecord> {
        let fresh = MistakeRecord::first_miss(item, now);
        let options_json = serde_json::to_string(&fresh.options)?;
        let now_ms = now.timestamp_millis();

        let sql = format!(
            r#"
            INSERT INTO mistake_book (id, storage_path, file_name, question_id, question,
                                      options, answer, wrong_count, correct_streak, mastered,
                                      last_seen_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 1, 0, 0, ?, ?)
            ON CONFLICT(storage_path, question_id) DO UPDATE SET
                wrong_count = mistake_book.wrong_count + 1,
                correct_streak = 0,
                mastered = 0,
                last_seen_at = excluded.last_seen_at
            RETURNING {RECORD_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(&fresh.id)
            .bind(&fresh.document_ref)
            .bind(&fresh.document_name)
            .bind(fresh.question_id)
            .bind(&fresh.question_text)
            .bind(&options_json)
            .bind(&fresh.correct_answer)
            .bind(now_ms)
            .bind(now_ms)
            .fetch_one(&self.pool)
            .await
            .with_context(|| {
                format!(
                    "upserting mistake for {} question {}",
                    item.document_ref, item.question_id
                )
            })?;

        row_to_record(&row)
    }

    async fn get_record(&self, id: &str) -> Result<Option<MistakeRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM mistake_book WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn compare_and_set(
        &self,
        id: &str,
        expected: Progress,
        next: Progress,
        last_seen_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE mistake_book
            SET correct_streak = ?, wrong_count = ?, mastered = ?, last_seen_at = ?
            WHERE id = ? AND correct_streak = ? AND wrong_count = ? AND mastered = ?
            "#,
        )
        .bind(i64::from(next.correct_streak))
        .bind(i64::from(next.wrong_count))
        .bind(next.mastered)
        .bind(last_seen_at.timestamp_millis())
        .bind(id)
        .bind(i64::from(expected.correct_streak))
        .bind(i64::from(expected.wrong_count))
        .bind(expected.mastered)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_active(&self, limit: Option<usize>) -> Result<Vec<MistakeRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM mistake_book WHERE mastered = 0 \
             ORDER BY created_at ASC, rowid ASC LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(sql_limit(limit))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn list_all(&self, limit: Option<usize>) -> Result<Vec<MistakeRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM mistake_book ORDER BY created_at ASC, rowid ASC LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(sql_limit(limit))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn delete_record(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM mistake_book WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<LedgerStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(mastered), 0) AS mastered,
                   COALESCE(SUM(wrong_count), 0) AS total_wrong
            FROM mistake_book
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let total = u64::try_from(row.try_get::<i64, _>("total")?)?;
        let mastered = u64::try_from(row.try_get::<i64, _>("mastered")?)?;
        Ok(LedgerStats {
            active: total.saturating_sub(mastered),
            mastered,
            total,
            total_wrong: u64::try_from(row.try_get::<i64, _>("total_wrong")?)?,
        })
    }
}
