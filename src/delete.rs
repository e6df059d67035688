//! `mbook delete`: remove a mistake record.
//!
//! Deleting an id that does not exist is reported, not treated as a failure.

use anyhow::Result;

use crate::config::Config;
use crate::ledger::{close_ledger, open_ledger};

pub async fn run_delete(config: &Config, id: &str) -> Result<bool> {
    let ledger = open_ledger(config).await?;
    let deleted = ledger.delete(id).await;
    close_ledger(ledger).await;
    let deleted = deleted?;

    if deleted {
        println!("deleted {}", id);
    } else {
        println!("no record {} (nothing to delete)", id);
    }
    Ok(deleted)
}
