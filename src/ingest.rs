//! `mbook ingest`: record the wrong answers from a finished quiz.
//!
//! Input is a JSON array of incorrect-answer tuples, or an object with an
//! `items` array, read from a file or from stdin when the path is `-`.

use anyhow::{Context, Result};
use mistake_book_core::models::{IncorrectAnswer, IngestReport};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::config::Config;
use crate::ledger::{close_ledger, open_ledger};

/// Accepted shapes of an ingest payload.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IngestPayload {
    Items(Vec<IncorrectAnswer>),
    Wrapped { items: Vec<IncorrectAnswer> },
}

impl IngestPayload {
    pub fn into_items(self) -> Vec<IncorrectAnswer> {
        match self {
            Self::Items(items) | Self::Wrapped { items } => items,
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read ingest payload from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ingest file: {}", path.display()))
}

pub fn parse_payload(raw: &str) -> Result<Vec<IncorrectAnswer>> {
    let payload: IngestPayload = serde_json::from_str(raw)
        .context("Ingest payload must be a JSON array of incorrect answers or {\"items\": [...]}")?;
    Ok(payload.into_items())
}

pub async fn run_ingest(config: &Config, path: &Path, json: bool) -> Result<IngestReport> {
    let items = parse_payload(&read_input(path)?)?;
    let ledger = open_ledger(config).await?;
    let report = ledger.ingest_batch(&items).await;
    close_ledger(ledger).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("ingest {}", path.display());
        println!("  items:    {}", items.len());
        println!("  recorded: {}", report.ingested);
        println!("  failed:   {}", report.failed);
        for r in report.results.iter().filter(|r| !r.ok) {
            println!(
                "    [{}] {}",
                r.index,
                r.error.as_deref().unwrap_or("unknown error")
            );
        }
        println!("{}", if report.success { "ok" } else { "partial" });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_array() {
        let items = parse_payload(
            r#"[{"documentRef":"a.pdf","questionId":1,"questionText":"q","options":["x"],"correctAnswer":"x"}]"#,
        )
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].document_name, "");
    }

    #[test]
    fn parses_wrapped_items() {
        let items = parse_payload(
            r#"{"items":[{"storage_path":"a.pdf","file_name":"A","question_id":2,"question":"q","options":[],"answer":"y"}]}"#,
        )
        .unwrap();
        assert_eq!(items[0].document_ref, "a.pdf");
        assert_eq!(items[0].question_id, 2);
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(parse_payload(r#"[{"documentRef":"a.pdf"}]"#).is_err());
        assert!(parse_payload("not json").is_err());
    }
}
