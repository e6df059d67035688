//! `mbook get`: show one mistake record with its question snapshot.

use anyhow::Result;

use crate::config::Config;
use crate::ledger::{close_ledger, open_ledger};

pub async fn run_get(config: &Config, id: &str, json: bool) -> Result<()> {
    let ledger = open_ledger(config).await?;
    let threshold = ledger.policy().threshold;
    let record = ledger.get(id).await;
    close_ledger(ledger).await;
    let r = record?;

    if json {
        println!("{}", serde_json::to_string_pretty(&r)?);
        return Ok(());
    }

    println!("--- Mistake ---");
    println!("id:             {}", r.id);
    println!("document:       {}", r.document_ref);
    if !r.document_name.is_empty() {
        println!("document_name:  {}", r.document_name);
    }
    println!("question_id:    {}", r.question_id);
    println!("wrong_count:    {}", r.wrong_count);
    println!("correct_streak: {} / {}", r.correct_streak, threshold);
    println!("mastered:       {}", r.mastered);
    println!("created_at:     {}", r.created_at.to_rfc3339());
    println!("last_seen_at:   {}", r.last_seen_at.to_rfc3339());
    println!();

    println!("--- Question ---");
    println!("{}", r.question_text);
    for (i, opt) in r.options.iter().enumerate() {
        let marker = if *opt == r.correct_answer { "*" } else { " " };
        println!(" {} {}. {}", marker, i + 1, opt);
    }
    println!();
    println!("answer: {}", r.correct_answer);

    Ok(())
}
