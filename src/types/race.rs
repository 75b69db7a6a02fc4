//! Scheduled races, lane assignments and recorded attempts.

use serde::{Deserialize, Serialize};

use super::ids::{CompetitorName, GroupName, LedgerSeq};
use crate::persistence::ledger::Appended;

/// Who occupies a lane in a scheduled race.
///
/// Serialized with internal tagging:
/// `{"kind": "entry", "group": "Wolves", "competitor": "Ada"}` or
/// `{"kind": "filler", "slot": 0}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LaneAssignment {
    /// A real competitor.
    Entry {
        group: GroupName,
        competitor: CompetitorName,
    },

    /// A synthetic placeholder from the sentinel group; `slot` indexes its members.
    Filler { slot: usize },
}

impl LaneAssignment {
    pub fn entry(group: GroupName, competitor: CompetitorName) -> Self {
        LaneAssignment::Entry { group, competitor }
    }

    pub fn is_filler(&self) -> bool {
        matches!(self, LaneAssignment::Filler { .. })
    }

    /// Name written to the ledger for this lane.
    pub fn ledger_name(&self) -> String {
        match self {
            LaneAssignment::Entry { competitor, .. } => competitor.to_string(),
            LaneAssignment::Filler { slot } => format!("empty {}", slot + 1),
        }
    }
}

/// One recorded timing trial against a scheduled race.
///
/// Only constructible from the [`Appended`] receipt a ledger sink hands back,
/// so an attempt can never exist in memory before its ledger line does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    seq: LedgerSeq,
    elapsed_times: Vec<f64>,
    raw_counts: Vec<i64>,
    placements: Vec<Option<u32>>,
}

impl Attempt {
    pub(crate) fn new(
        receipt: Appended,
        elapsed_times: Vec<f64>,
        raw_counts: Vec<i64>,
        placements: Vec<Option<u32>>,
    ) -> Self {
        Attempt {
            seq: receipt.seq(),
            elapsed_times,
            raw_counts,
            placements,
        }
    }

    /// The ledger sequence number this attempt was written under.
    pub fn seq(&self) -> LedgerSeq {
        self.seq
    }

    pub fn elapsed_times(&self) -> &[f64] {
        &self.elapsed_times
    }

    pub fn raw_counts(&self) -> &[i64] {
        &self.raw_counts
    }

    pub fn placements(&self) -> &[Option<u32>] {
        &self.placements
    }
}

/// Where a scheduled race sits in the acceptance state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceState {
    /// Nothing recorded yet.
    NoAttempt,

    /// One or more attempts recorded, none accepted.
    Unaccepted { attempts: usize },

    /// The attempt at `index` is the official result.
    Accepted { index: usize },
}

/// A planned slot assigning one competitor (or filler) per lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledRace {
    /// Sequential number within the plan.
    pub plan_number: usize,

    /// Exactly `n_lanes` entries, in lane order.
    pub lanes: Vec<LaneAssignment>,

    #[serde(default)]
    attempts: Vec<Attempt>,

    /// Index into `attempts` of the official result.
    #[serde(default)]
    accepted_attempt: Option<usize>,
}

impl ScheduledRace {
    pub fn new(plan_number: usize, lanes: Vec<LaneAssignment>) -> Self {
        ScheduledRace {
            plan_number,
            lanes,
            attempts: Vec::new(),
            accepted_attempt: None,
        }
    }

    pub fn n_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Parallel flags marking synthetic filler lanes.
    pub fn filler_flags(&self) -> Vec<bool> {
        self.lanes.iter().map(LaneAssignment::is_filler).collect()
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn latest_attempt(&self) -> Option<&Attempt> {
        self.attempts.last()
    }

    pub fn accepted_attempt_index(&self) -> Option<usize> {
        self.accepted_attempt
    }

    pub fn accepted_attempt(&self) -> Option<&Attempt> {
        self.accepted_attempt.and_then(|i| self.attempts.get(i))
    }

    /// Finds the attempt recorded under ledger entry `seq`.
    pub fn attempt_index_for(&self, seq: LedgerSeq) -> Option<usize> {
        self.attempts.iter().position(|a| a.seq() == seq)
    }

    pub fn state(&self) -> RaceState {
        match (self.accepted_attempt, self.attempts.len()) {
            (Some(index), _) => RaceState::Accepted { index },
            (None, 0) => RaceState::NoAttempt,
            (None, attempts) => RaceState::Unaccepted { attempts },
        }
    }

    /// Appends an attempt and returns its index.
    pub(crate) fn push_attempt(&mut self, attempt: Attempt) -> usize {
        self.attempts.push(attempt);
        self.attempts.len() - 1
    }

    pub(crate) fn set_accepted(&mut self, index: usize) {
        self.accepted_attempt = Some(index);
    }

    /// Drops recorded attempts and acceptance, keeping the lane assignment.
    pub(crate) fn clear_attempts(&mut self) {
        self.attempts.clear();
        self.accepted_attempt = None;
    }

    /// Returns true if any lane is occupied by `competitor` of `group`.
    pub fn includes(&self, group: &GroupName, competitor: &CompetitorName) -> bool {
        self.lanes.iter().any(|lane| {
            matches!(lane, LaneAssignment::Entry { group: g, competitor: c } if g == group && c == competitor)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(group: &str, name: &str) -> LaneAssignment {
        LaneAssignment::entry(
            GroupName::parse(group).unwrap(),
            CompetitorName::parse(name).unwrap(),
        )
    }

    #[test]
    fn lane_assignment_serializes_with_kind_tag() {
        let json = serde_json::to_string(&entry("Wolves", "Ada")).unwrap();
        assert_eq!(json, r#"{"kind":"entry","group":"Wolves","competitor":"Ada"}"#);

        let json = serde_json::to_string(&LaneAssignment::Filler { slot: 1 }).unwrap();
        assert_eq!(json, r#"{"kind":"filler","slot":1}"#);
    }

    #[test]
    fn filler_flags_follow_lanes() {
        let race = ScheduledRace::new(
            0,
            vec![
                entry("Wolves", "Ada"),
                LaneAssignment::Filler { slot: 0 },
                entry("Wolves", "Bo"),
                LaneAssignment::Filler { slot: 1 },
            ],
        );
        assert_eq!(race.filler_flags(), vec![false, true, false, true]);
        assert_eq!(race.lanes[3].ledger_name(), "empty 2");
    }

    #[test]
    fn fresh_race_has_no_attempt() {
        let race = ScheduledRace::new(3, vec![entry("Wolves", "Ada")]);
        assert_eq!(race.state(), RaceState::NoAttempt);
        assert!(race.accepted_attempt().is_none());
    }

    #[test]
    fn includes_matches_group_and_name() {
        let race = ScheduledRace::new(0, vec![entry("Wolves", "Ada")]);
        let wolves = GroupName::parse("Wolves").unwrap();
        let bears = GroupName::parse("Bears").unwrap();
        let ada = CompetitorName::parse("Ada").unwrap();
        assert!(race.includes(&wolves, &ada));
        assert!(!race.includes(&bears, &ada));
    }
}
