//! # Mistake Book CLI (`mbook`)
//!
//! ## Usage
//!
//! ```bash
//! mbook --config ./config/mbook.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mbook init` | Create the SQLite database and run schema migrations |
//! | `mbook ingest <file>` | Record the wrong answers of a finished quiz |
//! | `mbook list` | Print the active review queue |
//! | `mbook get <id>` | Show one record with its question |
//! | `mbook answer <id> --correct` | Record a review answer |
//! | `mbook delete <id>` | Remove a record |
//! | `mbook stats` | Summary counts |
//! | `mbook serve` | Start the HTTP API |
//! | `mbook completions <shell>` | Print shell completions |

use clap::{ArgGroup, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use mistake_book::{answer, config, delete, get, ingest, list, logging, migrate, server, stats};

/// Mistake Book CLI: track missed quiz questions until they are mastered.
#[derive(Parser)]
#[command(
    name = "mbook",
    about = "Mistake Book — track missed quiz questions until they are mastered",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mbook.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `mistake_book` table.
    /// Running it more than once is safe.
    Init,

    /// Record wrong answers from a finished quiz.
    ///
    /// Reads a JSON array of incorrect answers (or `{"items": [...]}`).
    /// Each item is recorded independently; failures are listed per item.
    Ingest {
        /// Path to the JSON payload, or `-` for stdin.
        path: PathBuf,

        /// Print the per-item report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List mistakes still under review, oldest first.
    List {
        /// Include mastered records.
        #[arg(long)]
        all: bool,

        /// Print records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a single record and its question snapshot.
    Get {
        /// Record id.
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// Record a review answer for a record.
    #[command(group(ArgGroup::new("outcome").required(true).args(["correct", "incorrect"])))]
    Answer {
        /// Record id.
        id: String,

        /// The question was answered correctly.
        #[arg(long)]
        correct: bool,

        /// The question was answered incorrectly.
        #[arg(long)]
        incorrect: bool,
    },

    /// Delete a record. Unknown ids are reported but not treated as errors.
    Delete {
        /// Record id.
        id: String,
    },

    /// Show summary counts.
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP API on `[server].bind`.
    Serve,

    /// Print shell completion script.
    Completions {
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "mbook", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    logging::init_tracing(&cfg.logging.level);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { path, json } => {
            ingest::run_ingest(&cfg, &path, json).await?;
        }
        Commands::List { all, json } => {
            list::run_list(&cfg, all, json).await?;
        }
        Commands::Get { id, json } => {
            get::run_get(&cfg, &id, json).await?;
        }
        Commands::Answer { id, correct, .. } => {
            answer::run_answer(&cfg, &id, correct).await?;
        }
        Commands::Delete { id } => {
            delete::run_delete(&cfg, &id).await?;
        }
        Commands::Stats { json } => {
            stats::run_stats(&cfg, json).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
