//! Event configuration.

use std::path::{Path, PathBuf};

/// Default number of lanes on the track.
pub const DEFAULT_LANES: usize = 4;

/// Default timer clock rate: counts per second reported by the lane timers.
pub const DEFAULT_CLOCK_RATE_HZ: f64 = 2000.0;

/// Where trial submissions are logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerMode {
    /// Append to the ledger file at this path, replaying it on open.
    Append(PathBuf),

    /// Run without a ledger. Results will not survive a restart; only chosen
    /// explicitly by the operator.
    Disabled,
}

/// Configuration for an event.
#[derive(Debug, Clone)]
pub struct EventConfig {
    /// Number of lanes raced in parallel.
    pub n_lanes: usize,

    /// Timer counts per second, used to turn raw counts into seconds.
    pub clock_rate_hz: f64,

    /// Ledger location, or explicit opt-out.
    pub ledger: LedgerMode,

    /// Rebuild the plan after every roster change until the plan is frozen.
    pub regenerate_on_roster_change: bool,
}

impl EventConfig {
    /// Configuration with defaults, logging to `ledger_path`.
    pub fn new(ledger_path: impl Into<PathBuf>) -> Self {
        EventConfig {
            n_lanes: DEFAULT_LANES,
            clock_rate_hz: DEFAULT_CLOCK_RATE_HZ,
            ledger: LedgerMode::Append(ledger_path.into()),
            regenerate_on_roster_change: true,
        }
    }

    /// Configuration with defaults and logging disabled.
    pub fn unlogged() -> Self {
        EventConfig {
            ledger: LedgerMode::Disabled,
            ..EventConfig::new(PathBuf::new())
        }
    }

    pub fn with_lanes(mut self, n_lanes: usize) -> Self {
        self.n_lanes = n_lanes;
        self
    }

    pub fn with_clock_rate(mut self, clock_rate_hz: f64) -> Self {
        self.clock_rate_hz = clock_rate_hz;
        self
    }

    /// Path of the ledger file, if logging is enabled.
    pub fn ledger_path(&self) -> Option<&Path> {
        match &self.ledger {
            LedgerMode::Append(path) => Some(path),
            LedgerMode::Disabled => None,
        }
    }

    /// Converts a raw timer count to seconds.
    pub fn count_to_seconds(&self, count: i64) -> f64 {
        if self.clock_rate_hz > 0.0 {
            count as f64 / self.clock_rate_hz
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_track() {
        let config = EventConfig::new("race_log.csv");
        assert_eq!(config.n_lanes, 4);
        assert_eq!(config.clock_rate_hz, 2000.0);
        assert_eq!(config.ledger_path(), Some(Path::new("race_log.csv")));
        assert!(config.regenerate_on_roster_change);
    }

    #[test]
    fn unlogged_has_no_ledger_path() {
        let config = EventConfig::unlogged().with_lanes(6);
        assert_eq!(config.ledger, LedgerMode::Disabled);
        assert_eq!(config.ledger_path(), None);
        assert_eq!(config.n_lanes, 6);
    }

    #[test]
    fn counts_convert_at_clock_rate() {
        let config = EventConfig::unlogged();
        assert_eq!(config.count_to_seconds(8000), 4.0);
        assert_eq!(config.with_clock_rate(0.0).count_to_seconds(8000), 0.0);
    }
}
