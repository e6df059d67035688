//! Wiring between configuration, the SQLite store and the core ledger.

use anyhow::Result;
use mistake_book_core::ledger::MistakeLedger;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// The ledger as used by the CLI and the HTTP server.
pub type SqliteLedger = MistakeLedger<SqliteStore>;

/// Connect to the configured database, make sure the schema exists, and
/// build a ledger with the configured mastery threshold and options.
pub async fn open_ledger(config: &Config) -> Result<SqliteLedger> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;
    Ok(MistakeLedger::with_options(
        SqliteStore::new(pool),
        config.mastery_policy(),
        config.ledger_options(),
    ))
}

/// Close the pool behind a ledger opened with [`open_ledger`].
pub async fn close_ledger(ledger: SqliteLedger) {
    ledger.store().pool().close().await;
}
