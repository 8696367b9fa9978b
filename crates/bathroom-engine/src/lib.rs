//! Bathroom Now Engine - Reconciliation of restroom state
//!
//! This crate merges restroom records from the geodata source, the local
//! cache and the user's own writes into one in-memory collection, and drives
//! the optimistic write protocol against the remote store.

pub mod engine;
pub mod error;
pub mod notice;
pub mod reconcile;
pub mod scheduler;
pub mod settings;

mod cache_writer;

pub use engine::{FetchOutcome, ReconciliationEngine};
pub use error::EngineError;
pub use notice::{LocationFix, Notice};
pub use reconcile::{merge, merge_into, MergeStats};
pub use scheduler::{Debouncer, TimerHandle};
pub use settings::EngineSettings;
