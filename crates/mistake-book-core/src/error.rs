//! Error taxonomy for ledger operations.

/// Errors surfaced by [`MistakeLedger`](crate::ledger::MistakeLedger).
///
/// Every failure is scoped to a single request; nothing here is fatal to
/// the process.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Malformed request or a missing / mistyped field.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The persistence layer failed. Carries the underlying message.
    #[error("storage failure: {0}")]
    Storage(String),
    /// The active set is larger than the configured guard allows.
    #[error("result exceeds the configured limit of {limit} records")]
    ResultTooLarge { limit: usize },
}

impl LedgerError {
    /// Wraps a backend error, keeping its full context chain.
    pub fn storage(err: anyhow::Error) -> Self {
        Self::Storage(format!("{err:#}"))
    }

    /// Machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage_failure",
            Self::ResultTooLarge { .. } => "result_too_large",
        }
    }
}
