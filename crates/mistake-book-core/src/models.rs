//! Data models shared by every store backend and the HTTP / CLI surfaces.
//!
//! JSON uses camelCase field names. Ingest tuples also accept the persisted
//! column names (`storage_path`, `file_name`, `question`, `answer`) so rows
//! exported from the `mistake_book` table can be replayed directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// One row per `(document_ref, question_id)` pair ever answered incorrectly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MistakeRecord {
    pub id: String,
    pub document_ref: String,
    pub document_name: String,
    pub question_id: i64,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub wrong_count: u32,
    pub correct_streak: u32,
    pub mastered: bool,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl MistakeRecord {
    /// Build a first-miss record for `item`.
    pub fn first_miss(item: &IncorrectAnswer, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_ref: item.document_ref.clone(),
            document_name: item.document_name.clone(),
            question_id: item.question_id,
            question_text: item.question_text.clone(),
            options: item.options.clone(),
            correct_answer: item.correct_answer.clone(),
            wrong_count: 1,
            correct_streak: 0,
            mastered: false,
            last_seen_at: now,
            created_at: now,
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            correct_streak: self.correct_streak,
            wrong_count: self.wrong_count,
            mastered: self.mastered,
        }
    }
}

/// The mutable part of a record, used for compare-and-set writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub correct_streak: u32,
    pub wrong_count: u32,
    pub mastered: bool,
}

/// A question the user just got wrong, as submitted after a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncorrectAnswer {
    #[serde(alias = "storage_path", alias = "storagePath")]
    pub document_ref: String,
    #[serde(default, alias = "file_name", alias = "fileName")]
    pub document_name: String,
    #[serde(alias = "question_id")]
    pub question_id: i64,
    #[serde(alias = "question")]
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(alias = "answer")]
    pub correct_answer: String,
}

impl IncorrectAnswer {
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.document_ref.trim().is_empty() {
            return Err(LedgerError::InvalidInput(
                "documentRef must not be empty".to_string(),
            ));
        }
        if self.question_text.trim().is_empty() {
            return Err(LedgerError::InvalidInput(format!(
                "questionText must not be empty (question {} of {})",
                self.question_id, self.document_ref
            )));
        }
        Ok(())
    }
}

/// Returned to the quiz client after a single answer is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeFeedback {
    pub mastered: bool,
    pub new_streak: u32,
    pub threshold: u32,
}

/// Result of one tuple inside a batch ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestItemResult {
    pub index: usize,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a batch ingest. Items are independent: a failed item does not
/// undo the ones written before it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub success: bool,
    pub ingested: usize,
    pub failed: usize,
    pub results: Vec<IngestItemResult>,
}

impl IngestReport {
    pub fn push_ok(&mut self, index: usize, record_id: String) {
        self.ingested += 1;
        self.results.push(IngestItemResult {
            index,
            ok: true,
            record_id: Some(record_id),
            error: None,
        });
    }

    pub fn push_err(&mut self, index: usize, error: String) {
        self.failed += 1;
        self.results.push(IngestItemResult {
            index,
            ok: false,
            record_id: None,
            error: Some(error),
        });
    }

    /// Settle the aggregate flag once every item has a result.
    pub fn finish(&mut self) {
        self.success = self.failed == 0;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub active: u64,
    pub mastered: u64,
    pub total: u64,
    pub total_wrong: u64,
}
