//! The event: roster, plan, navigation and the ledger that makes them durable.
//!
//! # Ownership
//!
//! [`Event`] owns a [`RaceBook`] (all in-memory state) and a [`Ledger`]
//! side by side. Operations that must be logged borrow the ledger and the
//! book separately and go through the navigator, which appends before it
//! mutates.
//!
//! # Startup
//!
//! 1. Check the document was built for the configured lane count
//! 2. Read every ledger record (a malformed line is fatal)
//! 3. Build the book from the document; if the ledger has records the
//!    document's attempts and results are dropped
//! 4. Replay each record through the live record/accept path
//! 5. Open the ledger for append; failure to open is fatal

pub mod book;
pub mod navigator;
pub mod roster;
pub mod staging;

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

pub use book::RaceBook;
pub use navigator::NavigatorError;
pub use roster::{RaceLocation, RosterError};
pub use staging::{LaneStatus, TimerSignal, TrialStaging};

use crate::config::EventConfig;
use crate::persistence::{
    DocumentError, Ledger, LedgerError, LedgerFile, LedgerRecord, RosterDocument, save_document,
};
use crate::report::{self, Standing};
use crate::types::{
    Competitor, CompetitorName, Group, GroupName, LedgerSeq, ScheduledRace, sort_groups,
};

/// Errors surfaced by [`Event`].
#[derive(Debug, Error)]
pub enum EventError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Navigator(#[from] NavigatorError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("cannot open ledger {path:?} for append: {source}")]
    LedgerUnavailable { path: PathBuf, source: io::Error },

    #[error("ledger line {line}: {reason}")]
    Replay { line: usize, reason: String },

    #[error("document was saved for {document} lanes, event is configured for {configured}")]
    LaneMismatch { document: usize, configured: usize },

    #[error("roster document rejected: {0}")]
    InvalidDocument(RosterError),

    #[error("report could not be written: {0}")]
    Report(io::Error),
}

pub type Result<T> = std::result::Result<T, EventError>;

/// A running event.
#[derive(Debug)]
pub struct Event {
    config: EventConfig,
    book: RaceBook,
    ledger: Ledger,
}

impl Event {
    /// Opens an event from an optional roster document, replaying the ledger.
    pub fn open(config: EventConfig, document: Option<RosterDocument>) -> Result<Self> {
        if let Some(doc) = document.as_ref().filter(|d| d.n_lanes != config.n_lanes) {
            return Err(EventError::LaneMismatch {
                document: doc.n_lanes,
                configured: config.n_lanes,
            });
        }

        let records = match config.ledger_path() {
            Some(path) => LedgerFile::read_records(path).map_err(|e| match e {
                LedgerError::Malformed { line, reason } => EventError::Replay { line, reason },
                other => EventError::Ledger(other),
            })?,
            None => Vec::new(),
        };

        let keep_results = records.is_empty();
        let mut book = match document {
            Some(doc) => book_from_document(doc, &config, keep_results)?,
            None => RaceBook::new(config.n_lanes, config.regenerate_on_roster_change),
        };

        replay(&mut book, &records)?;

        let ledger = match config.ledger_path() {
            Some(path) => Ledger::File(LedgerFile::open(path).map_err(|source| {
                EventError::LedgerUnavailable {
                    path: path.to_path_buf(),
                    source,
                }
            })?),
            None => {
                warn!("Ledger disabled; results will not survive a restart");
                Ledger::Disabled
            }
        };

        info!(
            n_lanes = config.n_lanes,
            competitors = book.competitor_count(),
            races = book.plan().len(),
            next_seq = %book.next_seq(),
            "Event opened"
        );
        Ok(Event {
            config,
            book,
            ledger,
        })
    }

    pub fn config(&self) -> &EventConfig {
        &self.config
    }

    /// Read access to roster, plan and navigation state.
    pub fn book(&self) -> &RaceBook {
        &self.book
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // ─── Roster ───

    pub fn add_group(&mut self, name: GroupName, ability_rank: i64) -> Result<()> {
        Ok(self.book.add_group(name, ability_rank)?)
    }

    pub fn remove_group(&mut self, name: &GroupName) -> Result<Group> {
        Ok(self.book.remove_group(name)?)
    }

    pub fn add_competitor(&mut self, group: &GroupName, competitor: Competitor) -> Result<()> {
        Ok(self.book.add_competitor(group, competitor)?)
    }

    pub fn remove_competitor(
        &mut self,
        group: &GroupName,
        name: &CompetitorName,
    ) -> Result<Competitor> {
        Ok(self.book.remove_competitor(group, name)?)
    }

    pub fn move_competitor(
        &mut self,
        from: &GroupName,
        name: &CompetitorName,
        to: &GroupName,
    ) -> Result<()> {
        Ok(self.book.move_competitor(from, name, to)?)
    }

    pub fn sort_groups(&mut self) {
        self.book.sort_groups();
    }

    pub fn add_race(&mut self, race: ScheduledRace, location: RaceLocation) -> Result<usize> {
        Ok(self.book.add_race(race, location)?)
    }

    pub fn remove_race(&mut self, index: usize) -> Result<ScheduledRace> {
        Ok(self.book.remove_race(index)?)
    }

    pub fn regenerate_plan(&mut self) -> Result<()> {
        Ok(self.book.regenerate_plan()?)
    }

    pub fn freeze_plan(&mut self) {
        self.book.freeze_plan();
    }

    // ─── Navigation ───

    pub fn goto(&mut self, index: usize) {
        self.book.goto(index);
    }

    pub fn goto_next(&mut self) {
        self.book.goto_next();
    }

    pub fn goto_prev(&mut self) {
        self.book.goto_prev();
    }

    // ─── Recording ───

    /// Records a trial against the current race. See [`RaceBook::record_result`].
    pub fn record_result(&mut self, times: &[f64], counts: &[i64], accept: bool) -> Result<usize> {
        Ok(self
            .book
            .record_result(&mut self.ledger, times, counts, accept)?)
    }

    pub fn accept_attempt(&mut self, attempt_index: usize) -> Result<()> {
        Ok(self.book.accept_attempt(&mut self.ledger, attempt_index)?)
    }

    pub fn accept_attempt_at(&mut self, plan_index: usize, attempt_index: usize) -> Result<()> {
        Ok(self
            .book
            .accept_attempt_at(&mut self.ledger, plan_index, attempt_index)?)
    }

    pub fn accept_ledger_entry(&mut self, seq: LedgerSeq) -> Result<()> {
        Ok(self.book.accept_ledger_entry(&mut self.ledger, seq)?)
    }

    // ─── Staging ───

    pub fn apply_signal(&mut self, lane: usize, signal: TimerSignal) -> bool {
        self.book.apply_signal(lane, signal)
    }

    pub fn set_counts_for_race(&mut self, lane: usize, count: i64) -> bool {
        self.book.set_counts_for_race(lane, count)
    }

    pub fn get_counts_for_race(&self, plan_index: usize) -> Vec<i64> {
        self.book.get_counts_for_race(plan_index)
    }

    /// Records the staged counts, converting at the configured clock rate.
    pub fn record_staged(&mut self, accept: bool) -> Result<usize> {
        Ok(self
            .book
            .record_staged(&mut self.ledger, &self.config, accept)?)
    }

    pub fn discard_staged(&mut self) {
        self.book.discard_staged();
    }

    // ─── Output ───

    /// Snapshot of roster and plan in document form.
    pub fn to_document(&self) -> RosterDocument {
        let groups = self.book.real_groups().cloned().collect();
        let plan = (!self.book.plan().is_empty()).then(|| self.book.plan().to_vec());
        RosterDocument::new(self.config.n_lanes, groups, plan)
    }

    pub fn save_document(&self, path: &Path) -> Result<()> {
        save_document(path, &self.to_document())?;
        info!(path = %path.display(), "Saved roster document");
        Ok(())
    }

    pub fn standings(&self) -> Vec<Standing> {
        report::standings(self.book.groups())
    }

    pub fn write_report(&self, path: &Path) -> Result<()> {
        let rows = self.standings();
        report::write_report(path, &rows).map_err(EventError::Report)?;
        info!(path = %path.display(), competitors = rows.len(), "Wrote standings report");
        Ok(())
    }
}

/// Builds a book from a loaded document, validating names and plan references.
fn book_from_document(
    document: RosterDocument,
    config: &EventConfig,
    keep_results: bool,
) -> Result<RaceBook> {
    let n_lanes = config.n_lanes;
    let mut book = RaceBook::new(n_lanes, config.regenerate_on_roster_change);

    for mut group in document.groups {
        if group.is_sentinel() {
            return Err(EventError::InvalidDocument(RosterError::ReservedGroup(
                group.name,
            )));
        }
        if book.group_index(&group.name).is_some() {
            return Err(EventError::InvalidDocument(RosterError::DuplicateGroup(
                group.name,
            )));
        }
        let mut seen = HashSet::new();
        for (index, competitor) in group.competitors.iter_mut().enumerate() {
            if !seen.insert(competitor.name.clone()) {
                return Err(EventError::InvalidDocument(
                    RosterError::DuplicateCompetitor {
                        group: group.name.clone(),
                        competitor: competitor.name.clone(),
                    },
                ));
            }
            competitor.attach(group.name.clone(), index, n_lanes);
            if !keep_results {
                competitor.clear_results();
            }
        }
        book.groups.push(group);
    }
    sort_groups(&mut book.groups);

    match document.plan {
        Some(mut plan) => {
            for race in &mut plan {
                book.validate_race(race)
                    .map_err(EventError::InvalidDocument)?;
                if !keep_results {
                    race.clear_attempts();
                }
            }
            book.plan = plan;
            book.renumber_plan();
            book.frozen = true;
            book.next_seq = book
                .max_recorded_seq()
                .map_or(LedgerSeq(0), LedgerSeq::next);
            book.reset_staging();
        }
        None => book.rebuild_plan(),
    }
    Ok(book)
}

/// Re-applies ledger records in order. Any inconsistency is fatal.
fn replay(book: &mut RaceBook, records: &[(usize, LedgerRecord)]) -> Result<()> {
    for (line, record) in records {
        book.replay_record(record)
            .map_err(|reason| EventError::Replay {
                line: *line,
                reason,
            })?;
    }
    if !records.is_empty() {
        book.freeze_plan();
        info!(
            records = records.len(),
            next_seq = %book.next_seq(),
            "Replayed ledger"
        );
    }
    Ok(())
}
