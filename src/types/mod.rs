//! Core domain types for the race ledger.
//!
//! Competitors live inside groups; scheduled races refer to them by
//! `(group, name)` so the plan survives group re-sorting and serialization.

pub mod competitor;
pub mod group;
pub mod ids;
pub mod race;

// Re-export commonly used types at the module level
pub use competitor::{Competitor, LaneResult};
pub use group::{EMPTY_GROUP_NAME, Group, is_sentinel_name, sort_groups};
pub use ids::{CompetitorName, GroupName, InvalidName, LedgerSeq};
pub use race::{Attempt, LaneAssignment, RaceState, ScheduledRace};
