//! Schema migrations.
//!
//! Creates the `mistake_book` table. The composite business key
//! `(storage_path, question_id)` is a `UNIQUE` constraint so the upsert in
//! [`SqliteStore`](crate::sqlite_store::SqliteStore) can rely on
//! `ON CONFLICT`. Every statement is idempotent.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Apply the schema to an open pool.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mistake_book (
            id TEXT PRIMARY KEY,
            storage_path TEXT NOT NULL,
            file_name TEXT NOT NULL DEFAULT '',
            question_id INTEGER NOT NULL,
            question TEXT NOT NULL,
            options TEXT NOT NULL DEFAULT '[]',
            answer TEXT NOT NULL,
            wrong_count INTEGER NOT NULL DEFAULT 1,
            correct_streak INTEGER NOT NULL DEFAULT 0,
            mastered INTEGER NOT NULL DEFAULT 0,
            last_seen_at INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE(storage_path, question_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_mistake_book_active ON mistake_book(mastered, created_at)",
    )
    .execute(pool)
    .await?;

    tracing::debug!("mistake_book schema ready");
    Ok(())
}
