//! # Telemetry Module
//!
//! Optional record of discrete pointer actions.
//!
//! This module handles:
//! - Formatting each click as one JSON line (JSONL)
//! - Appending to the journal file configured under `[journal]`
//!
//! Scroll and movement are too frequent to be useful here and are not
//! recorded.

pub mod journal;

pub use journal::{ActionJournal, JournalEntry};
