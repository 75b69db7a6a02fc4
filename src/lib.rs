//! Race Ledger - lane-rotation scheduling and a crash-safe results ledger for
//! timed heat races.
//!
//! This library provides the domain types, the scheduler, the append-only
//! ledger and the event state machine that ties them together.

pub mod config;
pub mod event;
pub mod persistence;
pub mod report;
pub mod schedule;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;
