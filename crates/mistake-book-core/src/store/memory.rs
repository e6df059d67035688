//! In-memory [`Store`] implementation for tests and embedding.
//!
//! Records live in a `Vec` behind a `std::sync::RwLock`; the write lock makes
//! every upsert and compare-and-set atomic. Vector position doubles as
//! insertion order for `created_at` ties.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{IncorrectAnswer, LedgerStats, MistakeRecord, Progress};

use super::Store;

/// In-memory store for testing.
pub struct InMemoryStore {
    records: RwLock<Vec<MistakeRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Insert a record verbatim, bypassing the ingest rules. Replaces any
    /// record with the same composite key.
    pub fn seed(&self, record: MistakeRecord) -> Result<()> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.retain(|r| {
            !(r.document_ref == record.document_ref && r.question_id == record.question_id)
        });
        records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

fn ordered(
    records: &[MistakeRecord],
    active_only: bool,
    limit: Option<usize>,
) -> Vec<MistakeRecord> {
    let mut out: Vec<MistakeRecord> = records
        .iter()
        .filter(|r| !active_only || !r.mastered)
        .cloned()
        .collect();
    // Stable sort keeps insertion order for equal timestamps.
    out.sort_by_key(|r| r.created_at);
    if let Some(limit) = limit {
        out.truncate(limit);
    }
    out
}

#[async_trait]
impl Store for InMemoryStore {
    async fn upsert_incorrect(
        &self,
        item: &IncorrectAnswer,
        now: DateTime<Utc>,
    ) -> Result<MistakeRecord> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        if let Some(existing) = records
            .iter_mut()
            .find(|r| r.document_ref == item.document_ref && r.question_id == item.question_id)
        {
            existing.wrong_count = existing.wrong_count.saturating_add(1);
            existing.correct_streak = 0;
            existing.mastered = false;
            existing.last_seen_at = now;
            return Ok(existing.clone());
        }

        let record = MistakeRecord::first_miss(item, now);
        records.push(record.clone());
        Ok(record)
    }

    async fn get_record(&self, id: &str) -> Result<Option<MistakeRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn compare_and_set(
        &self,
        id: &str,
        expected: Progress,
        next: Progress,
        last_seen_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        if record.progress() != expected {
            return Ok(false);
        }
        record.correct_streak = next.correct_streak;
        record.wrong_count = next.wrong_count;
        record.mastered = next.mastered;
        record.last_seen_at = last_seen_at;
        Ok(true)
    }

    async fn list_active(&self, limit: Option<usize>) -> Result<Vec<MistakeRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(ordered(&records, true, limit))
    }

    async fn list_all(&self, limit: Option<usize>) -> Result<Vec<MistakeRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(ordered(&records, false, limit))
    }

    async fn delete_record(&self, id: &str) -> Result<bool> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() != before)
    }

    async fn stats(&self) -> Result<LedgerStats> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mastered = records.iter().filter(|r| r.mastered).count() as u64;
        let total = records.len() as u64;
        Ok(LedgerStats {
            active: total - mastered,
            mastered,
            total,
            total_wrong: records.iter().map(|r| u64::from(r.wrong_count)).sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn item(doc: &str, qid: i64) -> IncorrectAnswer {
        IncorrectAnswer {
            document_ref: doc.to_string(),
            document_name: format!("{doc}.pdf"),
            question_id: qid,
            question_text: format!("question {qid}"),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: "a".into(),
        }
    }

    async fn miss(store: &InMemoryStore, doc: &str, qid: i64, at: DateTime<Utc>) -> MistakeRecord {
        store.upsert_incorrect(&item(doc, qid), at).await.unwrap()
    }

    #[tokio::test]
    async fn upsert_creates_then_increments() {
        let store = InMemoryStore::new();
        let now = Utc::now();

        let first = miss(&store, "doc", 1, now).await;
        assert_eq!(first.wrong_count, 1);

        let later = now + Duration::seconds(5);
        let second = miss(&store, "doc", 1, later).await;
        assert_eq!(second.id, first.id);
        assert_eq!(second.wrong_count, 2);
        assert_eq!(second.created_at, now);
        assert_eq!(second.last_seen_at, later);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn upsert_keeps_question_snapshot() {
        let store = InMemoryStore::new();
        let first = miss(&store, "doc", 1, Utc::now()).await;

        let mut regenerated = item("doc", 1);
        regenerated.question_text = "a rewritten question".into();
        regenerated.correct_answer = "c".into();
        let second = store
            .upsert_incorrect(&regenerated, Utc::now())
            .await
            .unwrap();

        assert_eq!(second.question_text, first.question_text);
        assert_eq!(second.correct_answer, "a");
    }

    #[tokio::test]
    async fn same_question_id_in_other_document_is_distinct() {
        let store = InMemoryStore::new();
        let a = miss(&store, "doc-a", 1, Utc::now()).await;
        let b = miss(&store, "doc-b", 1, Utc::now()).await;
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn compare_and_set_rejects_stale_expectation() {
        let store = InMemoryStore::new();
        let rec = miss(&store, "doc", 1, Utc::now()).await;
        let expected = rec.progress();
        let next = Progress {
            correct_streak: 1,
            ..expected
        };

        let now = Utc::now();
        let written = store.compare_and_set(&rec.id, expected, next, now).await;
        assert!(written.unwrap());
        // Same expectation again is now stale.
        let stale = store.compare_and_set(&rec.id, expected, next, now).await;
        assert!(!stale.unwrap());
        let missing = store.compare_and_set("missing", expected, next, now).await;
        assert!(!missing.unwrap());
    }

    #[tokio::test]
    async fn list_active_is_oldest_first_and_skips_mastered() {
        let store = InMemoryStore::new();
        let base = Utc::now();
        let newer = miss(&store, "doc", 2, base + Duration::seconds(10)).await;
        let older = miss(&store, "doc", 1, base).await;
        let mut done = MistakeRecord::first_miss(&item("doc", 3), base - Duration::seconds(10));
        done.correct_streak = 3;
        done.mastered = true;
        store.seed(done).unwrap();

        let active = store.list_active(None).await.unwrap();
        let ids: Vec<&str> = active.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![older.id.as_str(), newer.id.as_str()]);

        assert_eq!(store.list_all(None).await.unwrap().len(), 3);
        assert_eq!(store.list_active(Some(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_removed() {
        let store = InMemoryStore::new();
        let rec = miss(&store, "doc", 1, Utc::now()).await;
        assert!(store.delete_record(&rec.id).await.unwrap());
        assert!(!store.delete_record(&rec.id).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn stats_counts() {
        let store = InMemoryStore::new();
        miss(&store, "doc", 1, Utc::now()).await;
        miss(&store, "doc", 1, Utc::now()).await;
        let mut done = MistakeRecord::first_miss(&item("doc", 2), Utc::now());
        done.correct_streak = 3;
        done.mastered = true;
        store.seed(done).unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.active, 1);
        assert_eq!(stats.mastered, 1);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.total_wrong, 3);
    }
}
