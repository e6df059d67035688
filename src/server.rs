//! HTTP API for the mistake book.
//!
//! Exposes the ledger operations to a quiz client as a JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `GET`    | `/mistakes` | Active review set, oldest first (`?all=true` includes mastered) |
//! | `GET`    | `/mistakes/stats` | Active / mastered / total counts |
//! | `POST`   | `/mistakes/batch` | Record the wrong answers of a finished quiz |
//! | `GET`    | `/mistakes/{id}` | One record |
//! | `PATCH`  | `/mistakes/{id}` | Record a review answer: `{ "correct": true }` |
//! | `DELETE` | `/mistakes/{id}` | Remove a record (missing ids are not an error) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "not found: mistake record 42" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `timeout` (408),
//! `storage_failure` (500), `result_too_large` (500).
//!
//! Every ledger call is bounded by `[server].request_timeout_ms`. Batch
//! ingest is the exception to the 408: it always answers with a per-item
//! report, marking items it did not get to as `timeout`.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use mistake_book_core::ledger::MistakeLedger;
use mistake_book_core::models::{
    IncorrectAnswer, IngestReport, LedgerStats, MistakeRecord, OutcomeFeedback,
};
use mistake_book_core::store::Store;
use mistake_book_core::LedgerError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::ingest::IngestPayload;
use crate::ledger::open_ledger;

/// Shared application state passed to all route handlers.
pub struct AppState<S: Store> {
    ledger: Arc<MistakeLedger<S>>,
    request_timeout: Duration,
}

impl<S: Store> AppState<S> {
    pub fn new(ledger: Arc<MistakeLedger<S>>, request_timeout: Duration) -> Self {
        Self {
            ledger,
            request_timeout,
        }
    }
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            request_timeout: self.request_timeout,
        }
    }
}

/// Starts the HTTP server on `[server].bind`.
///
/// Opens (and migrates) the configured database, then serves until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let ledger = Arc::new(open_ledger(config).await?);
    let state = AppState::new(
        ledger,
        Duration::from_millis(config.server.request_timeout_ms),
    );

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(bind = %config.server.bind, "mistake book API listening");
    println!("Mistake book API listening on http://{}", config.server.bind);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Build the API router over any [`Store`] backend.
pub fn router<S: Store + 'static>(state: AppState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/mistakes", get(handle_list::<S>))
        .route("/mistakes/stats", get(handle_stats::<S>))
        .route("/mistakes/batch", post(handle_ingest::<S>))
        .route(
            "/mistakes/{id}",
            get(handle_get::<S>)
                .patch(handle_record_outcome::<S>)
                .delete(handle_delete::<S>),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn timeout_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::REQUEST_TIMEOUT,
        code: "timeout".to_string(),
        message: message.into(),
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::Storage(_) | LedgerError::ResultTooLarge { .. } => {
                tracing::error!(error = %err, "ledger operation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Run a ledger call under the request deadline.
async fn bounded<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, LedgerError>>,
) -> Result<T, AppError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "ledger call timed out");
            Err(timeout_error(format!(
                "storage operation timed out after {} ms",
                limit.as_millis()
            )))
        }
    }
}

fn json_body(
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<serde_json::Value, AppError> {
    body.map(|Json(v)| v)
        .map_err(|e| bad_request(format!("malformed JSON body: {}", e.body_text())))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /mistakes ============

#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    all: bool,
}

#[derive(Serialize)]
struct ListResponse {
    mistakes: Vec<MistakeRecord>,
}

async fn handle_list<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, AppError> {
    let mistakes = if params.all {
        bounded(state.request_timeout, state.ledger.list_all()).await?
    } else {
        bounded(state.request_timeout, state.ledger.list_active()).await?
    };
    Ok(Json(ListResponse { mistakes }))
}

// ============ GET /mistakes/stats ============

async fn handle_stats<S: Store + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<LedgerStats>, AppError> {
    let stats = bounded(state.request_timeout, state.ledger.stats()).await?;
    Ok(Json(stats))
}

// ============ POST /mistakes/batch ============

async fn handle_ingest<S: Store + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<IngestReport>, AppError> {
    let payload: IngestPayload = serde_json::from_value(json_body(body)?).map_err(|e| {
        bad_request(format!(
            "expected an array of incorrect answers or {{\"items\": [...]}}: {}",
            e
        ))
    })?;
    let items = payload.into_items();

    let report = ingest_within(&state.ledger, &items, state.request_timeout).await;
    Ok(Json(report))
}

/// Ingest `items` one at a time under a shared deadline.
///
/// The item in flight when the deadline passes, and every item after it,
/// is reported as `timeout`. Items written before that keep their `ok`
/// result, so a client can resubmit exactly the failed slots.
async fn ingest_within<S: Store>(
    ledger: &MistakeLedger<S>,
    items: &[IncorrectAnswer],
    limit: Duration,
) -> IngestReport {
    let deadline = tokio::time::Instant::now() + limit;
    let mut report = IngestReport::default();

    for (index, item) in items.iter().enumerate() {
        match tokio::time::timeout_at(deadline, ledger.ingest_one(item)).await {
            Ok(Ok(record)) => report.push_ok(index, record.id),
            Ok(Err(e)) => {
                tracing::warn!(index, error = %e, "failed to record miss");
                report.push_err(index, e.to_string());
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = limit.as_millis() as u64,
                    pending = items.len() - index,
                    "batch ingest timed out"
                );
                for pending in index..items.len() {
                    report.push_err(pending, "timeout".to_string());
                }
                break;
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

// ============ GET /mistakes/{id} ============

async fn handle_get<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<MistakeRecord>, AppError> {
    let record = bounded(state.request_timeout, state.ledger.get(&id)).await?;
    Ok(Json(record))
}

// ============ PATCH /mistakes/{id} ============

/// Reads the `correct` flag, rejecting anything that is not a JSON boolean.
fn parse_correct(body: &serde_json::Value) -> Result<bool, AppError> {
    match body.get("correct") {
        Some(serde_json::Value::Bool(b)) => Ok(*b),
        Some(other) => Err(bad_request(format!(
            "correct must be a boolean, got {}",
            other
        ))),
        None => Err(bad_request("missing required field: correct")),
    }
}

async fn handle_record_outcome<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<OutcomeFeedback>, AppError> {
    let correct = parse_correct(&json_body(body)?)?;
    let feedback = bounded(
        state.request_timeout,
        state.ledger.record_outcome(&id, correct),
    )
    .await?;
    Ok(Json(feedback))
}

// ============ DELETE /mistakes/{id} ============

#[derive(Serialize)]
struct DeleteResponse {
    success: bool,
    deleted: bool,
}

async fn handle_delete<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let deleted = bounded(state.request_timeout, state.ledger.delete(&id)).await?;
    Ok(Json(DeleteResponse {
        success: true,
        deleted,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use mistake_book_core::mastery::MasteryPolicy;
    use mistake_book_core::models::Progress;
    use mistake_book_core::store::memory::InMemoryStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn parse_correct_accepts_booleans_only() {
        assert!(parse_correct(&json!({ "correct": true })).unwrap());
        assert!(!parse_correct(&json!({ "correct": false })).unwrap());

        let err = parse_correct(&json!({ "correct": "yes" })).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let err = parse_correct(&json!({ "correct": 1 })).unwrap_err();
        assert_eq!(err.code, "bad_request");
        let err = parse_correct(&json!({})).unwrap_err();
        assert!(err.message.contains("missing"));
    }

    #[test]
    fn ledger_errors_map_to_status_codes() {
        let e = AppError::from(LedgerError::NotFound("x".into()));
        assert_eq!(e.status, StatusCode::NOT_FOUND);
        let e = AppError::from(LedgerError::InvalidInput("x".into()));
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        let e = AppError::from(LedgerError::Storage("db gone".into()));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.code, "storage_failure");
        let e = AppError::from(LedgerError::ResultTooLarge { limit: 5 });
        assert_eq!(e.code, "result_too_large");
    }

    /// Sleeps before the upsert with the given ordinal (1-based).
    struct SlowStore {
        inner: InMemoryStore,
        calls: AtomicUsize,
        slow_call: usize,
        delay: Duration,
    }

    #[async_trait]
    impl Store for SlowStore {
        async fn upsert_incorrect(
            &self,
            item: &IncorrectAnswer,
            now: DateTime<Utc>,
        ) -> anyhow::Result<MistakeRecord> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.slow_call {
                tokio::time::sleep(self.delay).await;
            }
            self.inner.upsert_incorrect(item, now).await
        }

        async fn get_record(&self, id: &str) -> anyhow::Result<Option<MistakeRecord>> {
            self.inner.get_record(id).await
        }

        async fn compare_and_set(
            &self,
            id: &str,
            expected: Progress,
            next: Progress,
            last_seen_at: DateTime<Utc>,
        ) -> anyhow::Result<bool> {
            self.inner
                .compare_and_set(id, expected, next, last_seen_at)
                .await
        }

        async fn list_active(&self, limit: Option<usize>) -> anyhow::Result<Vec<MistakeRecord>> {
            self.inner.list_active(limit).await
        }

        async fn list_all(&self, limit: Option<usize>) -> anyhow::Result<Vec<MistakeRecord>> {
            self.inner.list_all(limit).await
        }

        async fn delete_record(&self, id: &str) -> anyhow::Result<bool> {
            self.inner.delete_record(id).await
        }

        async fn stats(&self) -> anyhow::Result<LedgerStats> {
            self.inner.stats().await
        }
    }

    fn quiz_item(qid: i64) -> IncorrectAnswer {
        IncorrectAnswer {
            document_ref: "uploads/geo.pdf".into(),
            document_name: "geo.pdf".into(),
            question_id: qid,
            question_text: format!("Capital question {qid}"),
            options: vec!["Paris".into(), "Rome".into()],
            correct_answer: "Paris".into(),
        }
    }

    #[tokio::test]
    async fn batch_ingest_reports_items_cut_off_by_deadline() {
        let store = SlowStore {
            inner: InMemoryStore::new(),
            calls: AtomicUsize::new(0),
            slow_call: 2,
            delay: Duration::from_millis(200),
        };
        let ledger = MistakeLedger::new(store, MasteryPolicy::default());
        let items = vec![quiz_item(1), quiz_item(2), quiz_item(3)];

        let report = ingest_within(&ledger, &items, Duration::from_millis(50)).await;

        assert!(!report.success);
        assert_eq!(report.ingested, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.results.len(), 3);
        assert!(report.results[0].ok);
        assert!(report.results[0].record_id.is_some());
        for (slot, result) in report.results.iter().enumerate().skip(1) {
            assert_eq!(result.index, slot);
            assert!(!result.ok);
            assert_eq!(result.error.as_deref(), Some("timeout"));
        }

        let stored = ledger.list_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].question_id, 1);
        assert_eq!(stored[0].wrong_count, 1);

        // Resubmitting only the timed-out slots leaves question 1 untouched.
        let retry: Vec<IncorrectAnswer> = report
            .results
            .iter()
            .filter(|r| !r.ok)
            .map(|r| items[r.index].clone())
            .collect();
        let report = ingest_within(&ledger, &retry, Duration::from_secs(5)).await;
        assert!(report.success);

        let counts: Vec<(i64, u32)> = ledger
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(|r| (r.question_id, r.wrong_count))
            .collect();
        assert_eq!(counts, vec![(1, 1), (2, 1), (3, 1)]);
    }

    #[tokio::test]
    async fn batch_ingest_within_deadline_matches_ledger() {
        let ledger = MistakeLedger::new(InMemoryStore::new(), MasteryPolicy::default());
        let mut blank = quiz_item(2);
        blank.question_text = " ".into();

        let report = ingest_within(
            &ledger,
            &[quiz_item(1), blank, quiz_item(3)],
            Duration::from_secs(5),
        )
        .await;
        assert!(!report.success);
        assert_eq!(report.ingested, 2);
        assert!(report.results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("questionText"));
    }

    #[tokio::test]
    async fn bounded_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, LedgerError>(())
        };
        let err = bounded(Duration::from_millis(10), slow).await.unwrap_err();
        assert_eq!(err.status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(err.code, "timeout");
    }
}
