//! Staging of raw timer counts for the trial in progress.
//!
//! Lane timers report over a serial link with three messages:
//!
//! - `<Ready to Race.>` the lane is armed
//! - `<GO!>` the start gate dropped
//! - `<Track count:N>` the lane finished after `N` clock counts
//!
//! Counts accumulate here until the operator records the trial. Filler lanes
//! start complete and never take a count.

use std::str::FromStr;

/// A message from a lane timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    Ready,
    Started,
    Count(i64),
}

impl FromStr for TimerSignal {
    type Err = String;

    fn from_str(message: &str) -> Result<Self, Self::Err> {
        let body = message
            .trim()
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim();

        if body.starts_with("Ready") || body.eq_ignore_ascii_case("ready") {
            return Ok(TimerSignal::Ready);
        }
        if body == "GO!" || body.eq_ignore_ascii_case("started") {
            return Ok(TimerSignal::Started);
        }
        let count = body
            .strip_prefix("Track count:")
            .or_else(|| body.strip_prefix("count:"));
        if let Some(count) = count {
            return count
                .trim()
                .parse::<i64>()
                .map(TimerSignal::Count)
                .map_err(|e| format!("bad count in {message:?}: {e}"));
        }
        Err(format!("unrecognized timer message {message:?}"))
    }
}

/// Where a lane is in the current trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneStatus {
    Idle,
    Ready,
    Running,
    Complete,
}

/// Counts and lane status for the trial being run on the current race.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialStaging {
    counts: Vec<i64>,
    status: Vec<LaneStatus>,
    fillers: Vec<bool>,
}

impl TrialStaging {
    pub fn new(n_lanes: usize) -> Self {
        TrialStaging {
            counts: vec![0; n_lanes],
            status: vec![LaneStatus::Idle; n_lanes],
            fillers: vec![false; n_lanes],
        }
    }

    /// Clears all counts and arms the lanes for a race with these filler flags.
    pub fn reset(&mut self, fillers: Vec<bool>) {
        let n_lanes = self.counts.len();
        self.fillers = fillers;
        self.fillers.resize(n_lanes, false);
        self.counts = vec![0; n_lanes];
        self.status = self
            .fillers
            .iter()
            .map(|filler| {
                if *filler {
                    LaneStatus::Complete
                } else {
                    LaneStatus::Idle
                }
            })
            .collect();
    }

    pub fn counts(&self) -> &[i64] {
        &self.counts
    }

    pub fn status(&self, lane: usize) -> Option<LaneStatus> {
        self.status.get(lane).copied()
    }

    /// Applies a timer message for `lane`. Returns false if it was ignored.
    pub fn apply(&mut self, lane: usize, signal: TimerSignal) -> bool {
        if lane >= self.counts.len() {
            return false;
        }
        let filler = self.fillers[lane];
        match signal {
            TimerSignal::Ready => {
                self.counts[lane] = 0;
                self.status[lane] = if filler {
                    LaneStatus::Complete
                } else {
                    LaneStatus::Ready
                };
            }
            TimerSignal::Started => {
                if !filler {
                    self.status[lane] = LaneStatus::Running;
                }
            }
            TimerSignal::Count(count) => {
                if filler {
                    return false;
                }
                self.counts[lane] = count;
                self.status[lane] = LaneStatus::Complete;
            }
        }
        true
    }

    /// Overrides one lane's count by hand. Filler lanes are left alone.
    pub fn set_count(&mut self, lane: usize, count: i64) -> bool {
        match self.fillers.get(lane) {
            Some(false) => {
                self.counts[lane] = count;
                self.status[lane] = LaneStatus::Complete;
                true
            }
            _ => false,
        }
    }

    /// Returns true once every lane has reported (fillers always have).
    pub fn all_lanes_complete(&self) -> bool {
        self.status.iter().all(|s| *s == LaneStatus::Complete)
    }

    /// Returns true if any real lane holds a non-zero count.
    pub fn has_counts(&self) -> bool {
        self.counts.iter().any(|c| *c != 0)
    }
}
