//! # Mistake Book
//!
//! Keeps track of the quiz questions a learner got wrong and drills them
//! until they are mastered.
//!
//! Every wrong answer from a finished quiz is recorded against its
//! `(document, question)` pair. Review answers move a record's correct
//! streak; once the streak reaches the mastery threshold the record leaves
//! the review queue. Missing the question again in a later quiz brings it
//! back.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────┐   ┌─────────────┐
//! │   CLI    │──▶│  MistakeLedger   │──▶│   SQLite     │
//! │ (mbook)  │   │ + MasteryPolicy  │   │ mistake_book │
//! └──────────┘   └──────────────────┘   └─────────────┘
//!                        ▲
//! ┌──────────┐           │
//! │   HTTP   │───────────┘
//! │  (axum)  │
//! └──────────┘
//! ```
//!
//! The ledger and mastery engine live in `mistake-book-core`; this crate
//! provides the SQLite store, configuration, CLI and HTTP API.
//!
//! ## Quick Start
//!
//! ```bash
//! mbook init                         # create database
//! mbook ingest quiz-misses.json      # record wrong answers
//! mbook list                         # review queue, oldest first
//! mbook answer <id> --correct        # record a review answer
//! mbook serve                        # start HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite implementation of the core `Store` trait |
//! | [`ledger`] | Ledger construction from config |
//! | [`server`] | HTTP API |
//! | [`logging`] | Tracing subscriber setup |

pub mod answer;
pub mod config;
pub mod db;
pub mod delete;
pub mod get;
pub mod ingest;
pub mod ledger;
pub mod list;
pub mod logging;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
pub mod stats;
