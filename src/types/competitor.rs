//! Competitors and their per-lane result slots.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::{CompetitorName, GroupName, LedgerSeq};

/// The accepted result a competitor earned in one lane.
///
/// Slots are indexed by lane, not by plan position: a competitor who raced
/// lane 2 always writes slot 2, whichever scheduled race it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneResult {
    /// Elapsed time in seconds. Zero means no result.
    pub elapsed_time: f64,

    /// Raw timer count the elapsed time was derived from.
    pub raw_count: i64,

    /// Finishing position within the race, `None` for a non-finisher.
    pub placement: Option<u32>,

    /// Plan index of the scheduled race the result came from.
    pub scheduled_race: Option<usize>,

    /// Ledger entry of the accepted attempt.
    pub ledger_entry: Option<LedgerSeq>,
}

impl LaneResult {
    /// Returns true if the slot holds a positive time.
    pub fn is_recorded(&self) -> bool {
        self.elapsed_time > 0.0
    }
}

/// A single entrant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: CompetitorName,

    /// Rank or category label (scout rank, age class, ...). Free-form.
    #[serde(default)]
    pub rank: String,

    /// Free-form inspection/eligibility record (weight, inspected-by, ...).
    #[serde(default)]
    pub eligibility: BTreeMap<String, String>,

    /// One slot per lane.
    #[serde(default)]
    results: Vec<LaneResult>,

    /// Owning group. Maintained by the event, not serialized.
    #[serde(skip)]
    group: Option<GroupName>,

    /// Position within the owning group.
    #[serde(skip)]
    index: usize,
}

impl Competitor {
    /// Creates an unassigned competitor with empty result slots.
    pub fn new(name: CompetitorName, rank: impl Into<String>, n_lanes: usize) -> Self {
        Competitor {
            name,
            rank: rank.into(),
            eligibility: BTreeMap::new(),
            results: vec![LaneResult::default(); n_lanes],
            group: None,
            index: 0,
        }
    }

    /// The group this competitor belongs to, if it has been placed in one.
    pub fn group(&self) -> Option<&GroupName> {
        self.group.as_ref()
    }

    /// Index within the owning group.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn results(&self) -> &[LaneResult] {
        &self.results
    }

    /// Moves the competitor into a group.
    ///
    /// Results are cleared first. Clearing after the assignment would wipe the
    /// slot the new group has just been given, and keeping them would carry
    /// stale cross-group data.
    pub fn rehome(&mut self, group: GroupName, index: usize) {
        self.clear_results();
        self.group = Some(group);
        self.index = index;
    }

    /// Updates only the position within the current group (after a removal).
    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Restores the back-reference after deserialization without touching results.
    pub(crate) fn attach(&mut self, group: GroupName, index: usize, n_lanes: usize) {
        self.group = Some(group);
        self.index = index;
        self.results.resize(n_lanes, LaneResult::default());
    }

    /// Writes an accepted result into the slot for `lane`.
    ///
    /// Lanes outside the slot array are ignored; the plan never produces them.
    pub fn post_result(&mut self, lane: usize, result: LaneResult) {
        if let Some(slot) = self.results.get_mut(lane) {
            *slot = result;
        }
    }

    /// Resets every slot to empty, keeping the slot count.
    pub fn clear_results(&mut self) {
        for slot in &mut self.results {
            *slot = LaneResult::default();
        }
    }

    fn positive_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.results
            .iter()
            .map(|r| r.elapsed_time)
            .filter(|t| *t > 0.0)
    }

    /// Fastest positive time, or 0.0 if nothing has been recorded.
    pub fn best_time(&self) -> f64 {
        self.positive_times().reduce(f64::min).unwrap_or(0.0)
    }

    /// Mean of the positive times, or 0.0 if nothing has been recorded.
    pub fn average_time(&self) -> f64 {
        let (sum, n) = self
            .positive_times()
            .fold((0.0, 0usize), |(sum, n), t| (sum + t, n + 1));
        if n == 0 { 0.0 } else { sum / n as f64 }
    }

    /// Slowest time across all slots (0.0 when empty).
    pub fn worst_time(&self) -> f64 {
        self.results
            .iter()
            .map(|r| r.elapsed_time)
            .fold(0.0, f64::max)
    }

    /// Returns true if any slot holds a result.
    pub fn has_results(&self) -> bool {
        self.results.iter().any(LaneResult::is_recorded)
    }
}
