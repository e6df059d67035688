//! `mbook stats`: summary of the mistake book.
//!
//! Shows how many questions are still in review, how many have been
//! mastered, and the total number of recorded misses.

use anyhow::Result;
use mistake_book_core::models::LedgerStats;

use crate::config::Config;
use crate::ledger::{close_ledger, open_ledger};

pub async fn run_stats(config: &Config, json: bool) -> Result<LedgerStats> {
    let ledger = open_ledger(config).await?;
    let threshold = ledger.policy().threshold;
    let stats = ledger.stats().await;
    close_ledger(ledger).await;
    let stats = stats?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(stats);
    }

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Mistake Book — Stats");
    println!("====================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!("  Threshold:   {} correct in a row", threshold);
    println!();
    println!("  Active:      {}", stats.active);
    println!("  Mastered:    {}", stats.mastered);
    println!(
        "  Total:       {} ({}% mastered)",
        stats.total,
        mastered_percent(&stats)
    );
    println!("  Misses:      {}", stats.total_wrong);
    println!();

    Ok(stats)
}

fn mastered_percent(stats: &LedgerStats) -> u64 {
    if stats.total > 0 {
        (stats.mastered * 100) / stats.total
    } else {
        0
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
