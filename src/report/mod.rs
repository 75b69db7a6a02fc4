//! Operator-facing text output: standings and plan listings.

pub mod plan;
pub mod standings;

pub use plan::{format_plan, format_status};
pub use standings::{Standing, format_standings, standings, write_report};
