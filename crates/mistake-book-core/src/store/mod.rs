//! Storage abstraction for Mistake Book.
//!
//! The [`Store`] trait exposes the atomic primitives the ledger needs. The
//! composite key `(document_ref, question_id)` is owned by the backend: an
//! upsert must never be a check-then-insert in application code, and
//! progress writes go through compare-and-set so concurrent answers for the
//! same question cannot lose an update.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{IncorrectAnswer, LedgerStats, MistakeRecord, Progress};

/// Abstract storage backend for mistake records.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_incorrect`](Store::upsert_incorrect) | Atomic find-or-create on the composite key, recording a miss |
/// | [`get_record`](Store::get_record) | Fetch a record by id |
/// | [`compare_and_set`](Store::compare_and_set) | Write new progress if the stored progress is unchanged |
/// | [`list_active`](Store::list_active) | Unmastered records, oldest first |
/// | [`list_all`](Store::list_all) | Every record, oldest first |
/// | [`delete_record`](Store::delete_record) | Remove a record by id |
/// | [`stats`](Store::stats) | Aggregate counts |
#[async_trait]
pub trait Store: Send + Sync {
    /// Record a miss for `item`.
    ///
    /// An existing record gets `wrong_count + 1`, `correct_streak = 0`,
    /// `mastered = false` and `last_seen_at = now`; its question snapshot is
    /// left untouched. Otherwise a new record is inserted with
    /// `wrong_count = 1`. Returns the stored record.
    async fn upsert_incorrect(
        &self,
        item: &IncorrectAnswer,
        now: DateTime<Utc>,
    ) -> Result<MistakeRecord>;

    async fn get_record(&self, id: &str) -> Result<Option<MistakeRecord>>;

    /// Replace the progress of record `id` with `next` if its stored
    /// progress still equals `expected`. Returns `false` when the record
    /// changed underneath (or no longer exists).
    async fn compare_and_set(
        &self,
        id: &str,
        expected: Progress,
        next: Progress,
        last_seen_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Records with `mastered = false`, ascending `created_at` with
    /// insertion order breaking ties. `limit` caps the row count.
    async fn list_active(&self, limit: Option<usize>) -> Result<Vec<MistakeRecord>>;

    /// All records in the same order as [`list_active`](Store::list_active).
    async fn list_all(&self, limit: Option<usize>) -> Result<Vec<MistakeRecord>>;

    /// Returns whether a record was removed.
    async fn delete_record(&self, id: &str) -> Result<bool>;

    async fn stats(&self) -> Result<LedgerStats>;
}
