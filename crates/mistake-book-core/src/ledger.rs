//! Mistake ledger operations.
//!
//! [`MistakeLedger`] is the single owner of read/write access to mistake
//! records. It combines a [`Store`] backend with the [`MasteryPolicy`]:
//!
//! ```text
//! quiz submitted ──▶ ingest_batch ──▶ Store::upsert_incorrect (per item)
//! review answer  ──▶ record_outcome ─▶ MasteryPolicy::next ─▶ Store::compare_and_set
//! review queue   ◀── list_active  ◀── Store::list_active (mastered = false)
//! ```
//!
//! A mastered record only returns to the review queue through
//! [`ingest_batch`](MistakeLedger::ingest_batch), i.e. by being missed again
//! in a fresh quiz. [`record_outcome`](MistakeLedger::record_outcome) only
//! refreshes `last_seen_at` on mastered records unless
//! [`LedgerOptions::redrill_mastered`] is set.

use chrono::Utc;

use crate::error::LedgerError;
use crate::mastery::{MasteryPolicy, Transition};
use crate::models::{
    IncorrectAnswer, IngestReport, LedgerStats, MistakeRecord, OutcomeFeedback, Progress,
};
use crate::store::Store;

/// Operational knobs for the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerOptions {
    /// Fail `list_active` instead of returning more than this many rows.
    pub max_active_records: Option<usize>,
    /// Let `record_outcome` transition records that are already mastered.
    pub redrill_mastered: bool,
    /// Read-modify-write attempts before a contended update gives up.
    pub max_cas_attempts: u32,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            max_active_records: None,
            redrill_mastered: false,
            max_cas_attempts: 8,
        }
    }
}

pub struct MistakeLedger<S: Store> {
    store: S,
    policy: MasteryPolicy,
    options: LedgerOptions,
}

impl<S: Store> MistakeLedger<S> {
    pub fn new(store: S, policy: MasteryPolicy) -> Self {
        Self::with_options(store, policy, LedgerOptions::default())
    }

    pub fn with_options(store: S, policy: MasteryPolicy, options: LedgerOptions) -> Self {
        Self {
            store,
            policy,
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> MasteryPolicy {
        self.policy
    }

    /// The active review set, oldest miss first.
    pub async fn list_active(&self) -> Result<Vec<MistakeRecord>, LedgerError> {
        let Some(limit) = self.options.max_active_records else {
            return self.store.list_active(None).await.map_err(LedgerError::storage);
        };

        // One extra row tells us the guard was exceeded.
        let rows = self
            .store
            .list_active(Some(limit.saturating_add(1)))
            .await
            .map_err(LedgerError::storage)?;
        if rows.len() > limit {
            tracing::warn!(limit, "active mistake set exceeds configured limit");
            return Err(LedgerError::ResultTooLarge { limit });
        }
        Ok(rows)
    }

    /// Every record including mastered ones, oldest first.
    pub async fn list_all(&self) -> Result<Vec<MistakeRecord>, LedgerError> {
        self.store.list_all(None).await.map_err(LedgerError::storage)
    }

    pub async fn get(&self, id: &str) -> Result<MistakeRecord, LedgerError> {
        self.store
            .get_record(id)
            .await
            .map_err(LedgerError::storage)?
            .ok_or_else(|| LedgerError::NotFound(format!("mistake record {id}")))
    }

    /// Record the misses from one quiz attempt.
    ///
    /// Each item is validated and upserted on its own. A failing item is
    /// reported in its result slot and does not undo earlier writes.
    pub async fn ingest_batch(&self, items: &[IncorrectAnswer]) -> IngestReport {
        let mut report = IngestReport::default();

        for (index, item) in items.iter().enumerate() {
            match self.ingest_one(item).await {
                Ok(record) => report.push_ok(index, record.id),
                Err(e) => {
                    tracing::warn!(index, error = %e, "failed to record miss");
                    report.push_err(index, e.to_string());
                }
            }
        }

        report.finish();
        tracing::info!(
            ingested = report.ingested,
            failed = report.failed,
            "ingested incorrect answers"
        );
        report
    }

    /// Validate and upsert a single incorrect answer.
    pub async fn ingest_one(&self, item: &IncorrectAnswer) -> Result<MistakeRecord, LedgerError> {
        item.validate()?;

        let record = self
            .store
            .upsert_incorrect(item, Utc::now())
            .await
            .map_err(LedgerError::storage)?;
        tracing::debug!(
            record_id = %record.id,
            document_ref = %record.document_ref,
            question_id = record.question_id,
            wrong_count = record.wrong_count,
            "recorded miss"
        );
        Ok(record)
    }

    /// Apply one review answer to record `id`.
    pub async fn record_outcome(
        &self,
        id: &str,
        correct: bool,
    ) -> Result<OutcomeFeedback, LedgerError> {
        let threshold = self.policy.threshold;

        for attempt in 1..=self.options.max_cas_attempts.max(1) {
            let record = self.get(id).await?;
            let now = Utc::now();

            // Mastered records only get their timestamp refreshed.
            let frozen = record.mastered && !self.options.redrill_mastered;
            let t = if frozen {
                Transition {
                    next_streak: record.correct_streak,
                    next_wrong_count: record.wrong_count,
                    mastered: true,
                    last_seen_at: now,
                }
            } else {
                self.policy
                    .next(record.correct_streak, record.wrong_count, correct, now)
            };
            let next = Progress {
                correct_streak: t.next_streak,
                wrong_count: t.next_wrong_count,
                mastered: t.mastered,
            };

            let written = self
                .store
                .compare_and_set(id, record.progress(), next, t.last_seen_at)
                .await
                .map_err(LedgerError::storage)?;
            if written {
                if frozen {
                    tracing::debug!(record_id = %id, "outcome ignored for mastered record");
                } else if t.mastered && !record.mastered {
                    tracing::info!(record_id = %id, streak = t.next_streak, "question mastered");
                }
                return Ok(OutcomeFeedback {
                    mastered: t.mastered,
                    new_streak: t.next_streak,
                    threshold,
                });
            }

            tracing::debug!(record_id = %id, attempt, "concurrent update, retrying");
        }

        Err(LedgerError::Storage(format!(
            "mistake record {id} kept changing; gave up after {} attempts",
            self.options.max_cas_attempts.max(1)
        )))
    }

    /// Remove record `id`. Returns `false` when there was nothing to delete.
    pub async fn delete(&self, id: &str) -> Result<bool, LedgerError> {
        let deleted = self
            .store
            .delete_record(id)
            .await
            .map_err(LedgerError::storage)?;
        if deleted {
            tracing::info!(record_id = %id, "deleted mistake record");
        }
        Ok(deleted)
    }

    pub async fn stats(&self) -> Result<LedgerStats, LedgerError> {
        self.store.stats().await.map_err(LedgerError::storage)
    }
}
