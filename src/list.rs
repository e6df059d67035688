//! `mbook list`: print the review queue.

use anyhow::Result;
use mistake_book_core::models::MistakeRecord;

use crate::config::Config;
use crate::ledger::{close_ledger, open_ledger};

pub async fn run_list(config: &Config, all: bool, json: bool) -> Result<()> {
    let ledger = open_ledger(config).await?;
    let records = if all {
        ledger.list_all().await
    } else {
        ledger.list_active().await
    };
    close_ledger(ledger).await;
    let records = records?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!(
            "{}",
            if all {
                "No mistakes recorded."
            } else {
                "No active mistakes. Nothing to review."
            }
        );
        return Ok(());
    }

    print_table(&records);
    println!();
    println!("{} record(s)", records.len());
    Ok(())
}

fn print_table(records: &[MistakeRecord]) {
    println!(
        "{:<36}  {:<24} {:>5} {:>6} {:>7}  {:<8}  {}",
        "ID", "DOCUMENT", "Q#", "WRONG", "STREAK", "STATE", "LAST SEEN"
    );
    println!("{}", "-".repeat(110));
    for r in records {
        println!(
            "{:<36}  {:<24} {:>5} {:>6} {:>7}  {:<8}  {}",
            r.id,
            truncate(display_name(r), 24),
            r.question_id,
            r.wrong_count,
            r.correct_streak,
            if r.mastered { "mastered" } else { "active" },
            r.last_seen_at.format("%Y-%m-%d %H:%M")
        );
    }
}

fn display_name(r: &MistakeRecord) -> &str {
    if r.document_name.is_empty() {
        &r.document_ref
    } else {
        &r.document_name
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
