//! Race navigation and the acceptance state machine.
//!
//! Each scheduled race moves `NoAttempt -> Unaccepted -> Accepted`. Every
//! transition that records or accepts data writes its ledger line through the
//! supplied [`LedgerSink`] first and only then mutates the book; the
//! receipt the sink hands back is what lets an [`Attempt`] be built at all.
//!
//! Navigation never fails: indices are clamped into the plan.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::book::RaceBook;
use super::staging::TimerSignal;
use crate::config::EventConfig;
use crate::persistence::ledger::{LaneSample, LedgerError, LedgerRecord, LedgerSink, Replay};
use crate::schedule::placements;
use crate::types::{Attempt, LaneAssignment, LaneResult, LedgerSeq, ScheduledRace};

/// Errors from recording and accepting attempts.
#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error("the plan has no races")]
    EmptyPlan,

    #[error("race {plan_index} has no attempt {attempt}")]
    UnknownAttempt { plan_index: usize, attempt: usize },

    #[error("race {plan_index} has no attempt recorded under ledger entry {seq}")]
    UnknownLedgerEntry { plan_index: usize, seq: LedgerSeq },

    #[error("expected {expected} lane values, got {got}")]
    LaneCountMismatch { expected: usize, got: usize },

    #[error("no counts staged for the current race")]
    NothingStaged,

    #[error("ledger append failed: {0}")]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, NavigatorError>;

impl RaceBook {
    // ─── Position ───

    /// Index of the current race, `None` while the plan is empty.
    pub fn current_plan_index(&self) -> Option<usize> {
        (!self.plan.is_empty()).then_some(self.cursor)
    }

    pub fn current_race(&self) -> Option<&ScheduledRace> {
        self.plan.get(self.cursor)
    }

    /// Index of the last race, `None` while the plan is empty.
    pub fn last_plan_index(&self) -> Option<usize> {
        self.plan.len().checked_sub(1)
    }

    /// Moves to `index`, clamped into the plan.
    pub fn goto(&mut self, index: usize) {
        self.move_cursor(index);
    }

    pub fn goto_next(&mut self) {
        self.move_cursor(self.cursor.saturating_add(1));
    }

    pub fn goto_prev(&mut self) {
        self.move_cursor(self.cursor.saturating_sub(1));
    }

    pub(crate) fn move_cursor(&mut self, index: usize) {
        let target = index.min(self.plan.len().saturating_sub(1));
        if target != self.cursor {
            self.cursor = target;
            self.reset_staging();
        }
    }

    pub(crate) fn reset_staging(&mut self) {
        let fillers = self
            .current_race()
            .map(ScheduledRace::filler_flags)
            .unwrap_or_default();
        self.staging.reset(fillers);
    }

    // ─── Recording ───

    /// Records one trial against the current race and optionally accepts it.
    ///
    /// The ledger line is written before anything else changes. Returns the
    /// new attempt's index within the race.
    pub fn record_result<S: LedgerSink + ?Sized>(
        &mut self,
        sink: &mut S,
        times: &[f64],
        counts: &[i64],
        accept: bool,
    ) -> Result<usize> {
        let plan_index = self.current_plan_index().ok_or(NavigatorError::EmptyPlan)?;
        self.check_lane_count(times.len())?;
        self.check_lane_count(counts.len())?;

        let race = &self.plan[plan_index];
        let record = LedgerRecord {
            seq: self.next_seq,
            plan_index,
            lanes: samples(&race.lanes, times, counts),
            accepted: accept,
        };
        let fillers = race.filler_flags();

        // A failed append may still have reached the disk; never reuse its number.
        self.next_seq = record.seq.next();
        let receipt = sink.append(&record)?;

        let attempt = Attempt::new(
            receipt,
            times.to_vec(),
            counts.to_vec(),
            placements(counts, &fillers),
        );
        let index = self.plan[plan_index].push_attempt(attempt);
        self.frozen = true;
        debug!(plan_index, attempt = index, seq = %record.seq, accept, "Recorded attempt");

        if accept {
            self.apply_acceptance(plan_index, index);
        }
        Ok(index)
    }

    /// Accepts attempt `attempt_index` of the current race.
    pub fn accept_attempt<S: LedgerSink + ?Sized>(
        &mut self,
        sink: &mut S,
        attempt_index: usize,
    ) -> Result<()> {
        let plan_index = self.current_plan_index().ok_or(NavigatorError::EmptyPlan)?;
        self.accept_attempt_at(sink, plan_index, attempt_index)
    }

    /// Accepts attempt `attempt_index` of race `plan_index`.
    ///
    /// Writes an ACCEPTED line carrying the attempt's own sequence number,
    /// posts lane values into competitors' result slots and moves to the
    /// following race. Accepting the attempt that is already accepted writes
    /// nothing and reposts nothing.
    pub fn accept_attempt_at<S: LedgerSink + ?Sized>(
        &mut self,
        sink: &mut S,
        plan_index: usize,
        attempt_index: usize,
    ) -> Result<()> {
        let race = self.plan.get(plan_index).ok_or(NavigatorError::UnknownAttempt {
            plan_index,
            attempt: attempt_index,
        })?;
        let attempt = race
            .attempts()
            .get(attempt_index)
            .ok_or(NavigatorError::UnknownAttempt {
                plan_index,
                attempt: attempt_index,
            })?;

        if race.accepted_attempt_index() == Some(attempt_index) {
            debug!(plan_index, attempt = attempt_index, "Attempt already accepted");
            self.move_cursor(plan_index.saturating_add(1));
            return Ok(());
        }

        let record = LedgerRecord {
            seq: attempt.seq(),
            plan_index,
            lanes: samples(&race.lanes, attempt.elapsed_times(), attempt.raw_counts()),
            accepted: true,
        };
        sink.append(&record)?;

        self.apply_acceptance(plan_index, attempt_index);
        Ok(())
    }

    /// Accepts the attempt of the current race written under ledger entry `seq`.
    ///
    /// This is how an earlier attempt is revised into the official result: a
    /// new ACCEPTED line repeats the old sequence number and the old line is
    /// left as it was.
    pub fn accept_ledger_entry<S: LedgerSink + ?Sized>(
        &mut self,
        sink: &mut S,
        seq: LedgerSeq,
    ) -> Result<()> {
        let plan_index = self.current_plan_index().ok_or(NavigatorError::EmptyPlan)?;
        let attempt_index = self.plan[plan_index]
            .attempt_index_for(seq)
            .ok_or(NavigatorError::UnknownLedgerEntry { plan_index, seq })?;
        self.accept_attempt_at(sink, plan_index, attempt_index)
    }

    fn apply_acceptance(&mut self, plan_index: usize, attempt_index: usize) {
        let race = &mut self.plan[plan_index];
        race.set_accepted(attempt_index);
        let lanes = race.lanes.clone();
        let attempt = race.attempts()[attempt_index].clone();

        for (lane, assignment) in lanes.iter().enumerate() {
            let LaneAssignment::Entry { group, competitor } = assignment else {
                continue;
            };
            let result = LaneResult {
                elapsed_time: attempt.elapsed_times()[lane],
                raw_count: attempt.raw_counts()[lane],
                placement: attempt.placements()[lane],
                scheduled_race: Some(plan_index),
                ledger_entry: Some(attempt.seq()),
            };
            match self.competitor_mut(group, competitor) {
                Some(c) => c.post_result(lane, result),
                None => warn!(
                    plan_index,
                    group = %group,
                    competitor = %competitor,
                    "Accepted race names a competitor no longer on the roster"
                ),
            }
        }

        info!(plan_index, attempt = attempt_index, seq = %attempt.seq(), "Accepted attempt");
        self.move_cursor(plan_index.saturating_add(1));
        self.reset_staging();
    }

    // ─── Staging ───

    /// Feeds a timer message for `lane` into the staged trial.
    pub fn apply_signal(&mut self, lane: usize, signal: TimerSignal) -> bool {
        self.staging.apply(lane, signal)
    }

    /// Overrides the staged count for one lane of the current race.
    pub fn set_counts_for_race(&mut self, lane: usize, count: i64) -> bool {
        self.staging.set_count(lane, count)
    }

    /// Counts for race `plan_index`: the accepted attempt's, else the latest
    /// attempt's, else zeros.
    pub fn get_counts_for_race(&self, plan_index: usize) -> Vec<i64> {
        let index = plan_index.min(self.plan.len().saturating_sub(1));
        self.plan
            .get(index)
            .and_then(|race| race.accepted_attempt().or_else(|| race.latest_attempt()))
            .map(|attempt| attempt.raw_counts().to_vec())
            .unwrap_or_else(|| vec![0; self.n_lanes])
    }

    /// Records the staged counts as an attempt on the current race and clears
    /// staging. An all-zero staging is refused.
    pub fn record_staged<S: LedgerSink + ?Sized>(
        &mut self,
        sink: &mut S,
        config: &EventConfig,
        accept: bool,
    ) -> Result<usize> {
        if !self.staging.has_counts() {
            return Err(NavigatorError::NothingStaged);
        }
        let counts = self.staging.counts().to_vec();
        let times: Vec<f64> = counts.iter().map(|c| config.count_to_seconds(*c)).collect();
        let index = self.record_result(sink, &times, &counts, accept)?;
        self.reset_staging();
        Ok(index)
    }

    /// Abandons the staged trial without writing anything.
    pub fn discard_staged(&mut self) {
        self.reset_staging();
    }

    // ─── Replay ───

    /// Re-applies one ledger line through the live record/accept path.
    ///
    /// Returns the reason as a string; the caller attaches the line number.
    pub(crate) fn replay_record(&mut self, record: &LedgerRecord) -> std::result::Result<(), String> {
        if record.plan_index >= self.plan.len() {
            return Err(format!(
                "plan index {} out of range, plan has {} races",
                record.plan_index,
                self.plan.len()
            ));
        }
        if record.lanes.len() != self.n_lanes {
            return Err(format!(
                "{} lanes recorded, track has {}",
                record.lanes.len(),
                self.n_lanes
            ));
        }

        self.goto(record.plan_index);
        let race = &self.plan[record.plan_index];
        for (lane, (assignment, sample)) in race.lanes.iter().zip(&record.lanes).enumerate() {
            let expected = assignment.ledger_name();
            if expected != sample.name {
                warn!(
                    seq = %record.seq,
                    plan_index = record.plan_index,
                    lane,
                    expected = %expected,
                    found = %sample.name,
                    "Ledger lane name disagrees with the plan"
                );
            }
        }

        match race.attempt_index_for(record.seq) {
            Some(index) if record.accepted => self
                .accept_attempt_at(&mut Replay, record.plan_index, index)
                .map_err(|e| e.to_string()),
            Some(_) => Err(format!(
                "sequence {} repeats an attempt without accepting it",
                record.seq
            )),
            None if record.seq < self.next_seq => Err(format!(
                "sequence {} reused, next expected {}",
                record.seq, self.next_seq
            )),
            None => {
                self.next_seq = record.seq;
                self.record_result(
                    &mut Replay,
                    &record.times(),
                    &record.counts(),
                    record.accepted,
                )
                .map(|_| ())
                .map_err(|e| e.to_string())
            }
        }
    }

    fn check_lane_count(&self, got: usize) -> Result<()> {
        if got != self.n_lanes {
            return Err(NavigatorError::LaneCountMismatch {
                expected: self.n_lanes,
                got,
            });
        }
        Ok(())
    }
}

fn samples(lanes: &[LaneAssignment], times: &[f64], counts: &[i64]) -> Vec<LaneSample> {
    lanes
        .iter()
        .zip(times.iter().zip(counts))
        .map(|(lane, (value, count))| LaneSample {
            name: lane.ledger_name(),
            value: *value,
            count: *count,
        })
        .collect()
}
