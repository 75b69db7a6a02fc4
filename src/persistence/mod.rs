//! Persistence layer for the race ledger.
//!
//! # Architecture
//!
//! - **Ledger**: append-only, comma-delimited, one line per trial submission.
//!   The sole source of truth for attempts once an event is under way.
//! - **Roster document**: JSON description of groups, competitors and
//!   (optionally) the plan, written atomically.
//!
//! # Recovery
//!
//! On startup:
//! 1. Load the roster document (groups, plan if present)
//! 2. If the ledger has records, drop document attempts and results
//! 3. Replay the ledger front to back through the live record/accept path
//! 4. Open the ledger for append with the sequence counter past the last record
//!
//! # Crash Safety
//!
//! - Ledger: every line is fsynced before in-memory state changes
//! - Documents and reports: write-to-temp, fsync, rename, fsync directory

pub mod document;
pub mod durable;
pub mod ledger;

pub use document::{
    DocumentError, RosterDocument, SCHEMA_VERSION, load_document, save_document,
    try_load_document,
};
pub use durable::{fsync_dir, fsync_file, write_atomic};
pub use ledger::{
    Appended, LaneSample, Ledger, LedgerError, LedgerFile, LedgerRecord, LedgerSink,
};
