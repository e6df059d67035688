//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/mbook.sqlite"
//!
//! [mastery]
//! threshold = 3
//!
//! [ledger]
//! max_active_records = 500
//! redrill_mastered = false
//!
//! [server]
//! bind = "127.0.0.1:7340"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Only `[db]` is required; every other section falls back to defaults.

use anyhow::{Context, Result};
use mistake_book_core::ledger::LedgerOptions;
use mistake_book_core::mastery::{MasteryPolicy, MASTERY_THRESHOLD};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub mastery: MasteryConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    5
}
fn default_busy_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct MasteryConfig {
    #[serde(default = "default_threshold")]
    pub threshold: u32,
}

impl Default for MasteryConfig {
    fn default() -> Self {
        Self {
            threshold: MASTERY_THRESHOLD,
        }
    }
}

fn default_threshold() -> u32 {
    MASTERY_THRESHOLD
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    #[serde(default)]
    pub max_active_records: Option<usize>,
    /// Allow single answers to move a mastered record back to active.
    #[serde(default)]
    pub redrill_mastered: bool,
    #[serde(default = "default_max_cas_attempts")]
    pub max_cas_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_active_records: None,
            redrill_mastered: false,
            max_cas_attempts: default_max_cas_attempts(),
        }
    }
}

fn default_max_cas_attempts() -> u32 {
    8
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn mastery_policy(&self) -> MasteryPolicy {
        MasteryPolicy::new(self.mastery.threshold)
    }

    pub fn ledger_options(&self) -> LedgerOptions {
        LedgerOptions {
            max_active_records: self.ledger.max_active_records,
            redrill_mastered: self.ledger.redrill_mastered,
            max_cas_attempts: self.ledger.max_cas_attempts,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be >= 1");
    }

    if config.mastery.threshold == 0 {
        anyhow::bail!("mastery.threshold must be >= 1");
    }

    if config.ledger.max_active_records == Some(0) {
        anyhow::bail!("ledger.max_active_records must be >= 1 when set");
    }

    if config.ledger.max_cas_attempts == 0 {
        anyhow::bail!("ledger.max_cas_attempts must be >= 1");
    }

    if config.server.request_timeout_ms == 0 {
        anyhow::bail!("server.request_timeout_ms must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn db_section_alone_is_enough() {
        let cfg = parse("[db]\npath = \"/tmp/m.sqlite\"\n").unwrap();
        assert_eq!(cfg.mastery.threshold, 3);
        assert_eq!(cfg.db.max_connections, 5);
        assert!(!cfg.ledger.redrill_mastered);
        assert_eq!(cfg.ledger.max_active_records, None);
        assert_eq!(cfg.server.bind, "127.0.0.1:7340");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn rejects_zero_threshold() {
        let err = parse("[db]\npath = \"x\"\n[mastery]\nthreshold = 0\n").unwrap_err();
        assert!(err.to_string().contains("mastery.threshold"));
    }

    #[test]
    fn rejects_zero_active_limit() {
        let err = parse("[db]\npath = \"x\"\n[ledger]\nmax_active_records = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_active_records"));
    }

    #[test]
    fn ledger_options_follow_config() {
        let cfg = parse(
            "[db]\npath = \"x\"\n[mastery]\nthreshold = 5\n[ledger]\nmax_active_records = 10\nredrill_mastered = true\n",
        )
        .unwrap();
        assert_eq!(cfg.mastery_policy().threshold, 5);
        let opts = cfg.ledger_options();
        assert_eq!(opts.max_active_records, Some(10));
        assert!(opts.redrill_mastered);
        assert_eq!(opts.max_cas_attempts, 8);
    }

    #[test]
    fn load_config_reports_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
