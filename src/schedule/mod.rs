//! Pure scheduling logic: lane rotation and placements.
//!
//! Nothing here touches the ledger or mutates an event; the event module
//! calls into these functions and owns the results.

pub mod ranking;
pub mod rotation;

pub use ranking::placements;
pub use rotation::{build_plan, filler_count, padded_roster};
