//! In-memory state of an event: roster, plan, cursor and sequence counter.
//!
//! Everything here is mutated only through the navigator and roster
//! operations; the ledger itself lives on [`super::Event`] and is handed in
//! by reference so that state changes always follow a successful append.

use crate::types::{
    Competitor, CompetitorName, Group, GroupName, LedgerSeq, ScheduledRace,
};

use super::staging::TrialStaging;

/// Roster, plan and navigation state for one event.
#[derive(Debug, Clone)]
pub struct RaceBook {
    pub(crate) n_lanes: usize,

    /// Real groups in schedule order, sentinel last.
    pub(crate) groups: Vec<Group>,

    pub(crate) plan: Vec<ScheduledRace>,

    /// Current plan index. Always `<= last_plan_index` (0 for an empty plan).
    pub(crate) cursor: usize,

    /// Sequence number the next new attempt will be written under.
    pub(crate) next_seq: LedgerSeq,

    pub(crate) staging: TrialStaging,

    /// Rebuild the plan after roster changes.
    pub(crate) regenerate: bool,

    /// Set once attempts exist or a plan was loaded; stops regeneration.
    pub(crate) frozen: bool,
}

impl RaceBook {
    /// An empty event: just the sentinel group, no plan.
    pub fn new(n_lanes: usize, regenerate: bool) -> Self {
        RaceBook {
            n_lanes,
            groups: vec![Group::sentinel(n_lanes)],
            plan: Vec::new(),
            cursor: 0,
            next_seq: LedgerSeq(0),
            staging: TrialStaging::new(n_lanes),
            regenerate,
            frozen: false,
        }
    }

    pub fn n_lanes(&self) -> usize {
        self.n_lanes
    }

    /// All groups, sentinel included (always last).
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Groups that hold real competitors.
    pub fn real_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|g| !g.is_sentinel())
    }

    pub fn plan(&self) -> &[ScheduledRace] {
        &self.plan
    }

    pub fn next_seq(&self) -> LedgerSeq {
        self.next_seq
    }

    pub fn staging(&self) -> &TrialStaging {
        &self.staging
    }

    /// Returns true once regeneration has been switched off for this event.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Position of the named group.
    pub fn group_index(&self, name: &GroupName) -> Option<usize> {
        self.groups.iter().position(|g| &g.name == name)
    }

    pub fn group(&self, name: &GroupName) -> Option<&Group> {
        self.groups.iter().find(|g| &g.name == name)
    }

    pub(crate) fn group_mut(&mut self, name: &GroupName) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| &g.name == name)
    }

    /// Position of a competitor within its group.
    pub fn competitor_index(&self, group: &GroupName, name: &CompetitorName) -> Option<usize> {
        self.group(group)?.position(name)
    }

    pub fn competitor(&self, group: &GroupName, name: &CompetitorName) -> Option<&Competitor> {
        self.group(group)?.competitor(name)
    }

    pub(crate) fn competitor_mut(
        &mut self,
        group: &GroupName,
        name: &CompetitorName,
    ) -> Option<&mut Competitor> {
        self.group_mut(group)?.competitor_mut(name)
    }

    /// Finds a competitor by name in any real group (first match in schedule order).
    pub fn find_competitor(&self, name: &CompetitorName) -> Option<&Competitor> {
        self.real_groups().find_map(|g| g.competitor(name))
    }

    /// Number of real competitors.
    pub fn competitor_count(&self) -> usize {
        self.real_groups().map(Group::len).sum()
    }

    /// Highest sequence number among recorded attempts, if any.
    pub(crate) fn max_recorded_seq(&self) -> Option<LedgerSeq> {
        self.plan
            .iter()
            .flat_map(|race| race.attempts().iter().map(|a| a.seq()))
            .max()
    }
}
