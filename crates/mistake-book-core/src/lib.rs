//! # Mistake Book Core
//!
//! Runtime-agnostic logic for Mistake Book: the mistake record model, the
//! mastery engine, the store abstraction, and the ledger operations built on
//! top of it.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. Storage backends implement [`store::Store`];
//! an in-memory backend ships in [`store::memory`].
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`mastery`] | Pure streak / wrong-count / mastery transition |
//! | [`models`] | Records, ingest tuples, feedback and report types |
//! | [`store`] | Storage trait and the in-memory backend |
//! | [`ledger`] | List, ingest, record-outcome, delete and stats operations |
//! | [`error`] | Error taxonomy surfaced to callers |

pub mod error;
pub mod ledger;
pub mod mastery;
pub mod models;
pub mod store;

pub use error::LedgerError;
pub use ledger::{LedgerOptions, MistakeLedger};
pub use mastery::{MasteryPolicy, Transition, MASTERY_THRESHOLD};
pub use models::{IncorrectAnswer, MistakeRecord, OutcomeFeedback};
