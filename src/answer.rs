//! `mbook answer`: record one review answer and report mastery progress.

use anyhow::Result;
use mistake_book_core::models::OutcomeFeedback;

use crate::config::Config;
use crate::ledger::{close_ledger, open_ledger};

pub async fn run_answer(config: &Config, id: &str, correct: bool) -> Result<OutcomeFeedback> {
    let ledger = open_ledger(config).await?;
    let feedback = ledger.record_outcome(id, correct).await;
    close_ledger(ledger).await;
    let feedback = feedback?;

    println!("streak: {} / {}", feedback.new_streak, feedback.threshold);
    if feedback.mastered {
        println!("mastered: yes (removed from review)");
    } else {
        println!(
            "mastered: no ({} more correct answer(s) needed)",
            feedback.threshold.saturating_sub(feedback.new_streak)
        );
    }
    Ok(feedback)
}
