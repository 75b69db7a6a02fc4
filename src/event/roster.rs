//! Roster management: groups, competitors and hand edits to the plan.
//!
//! Every operation validates fully before touching state, so a rejected
//! call leaves the roster exactly as it was.

use thiserror::Error;
use tracing::{info, warn};

use super::book::RaceBook;
use crate::schedule::build_plan;
use crate::types::{
    Competitor, CompetitorName, Group, GroupName, InvalidName, LaneAssignment, ScheduledRace,
    is_sentinel_name, sort_groups,
};

/// Errors from roster and plan edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("group {0} already exists")]
    DuplicateGroup(GroupName),

    #[error("group name {0} is reserved for lane fillers")]
    ReservedGroup(GroupName),

    #[error("no group named {0}")]
    UnknownGroup(GroupName),

    #[error("{competitor} is already in group {group}")]
    DuplicateCompetitor {
        group: GroupName,
        competitor: CompetitorName,
    },

    #[error("no competitor {competitor} in group {group}")]
    UnknownCompetitor {
        group: GroupName,
        competitor: CompetitorName,
    },

    #[error("filler slot {slot} does not exist on a {n_lanes}-lane track")]
    UnknownFiller { slot: usize, n_lanes: usize },

    #[error("race has {got} lanes, track has {expected}")]
    LaneCountMismatch { expected: usize, got: usize },

    #[error("no race at plan index {0}")]
    UnknownRace(usize),

    #[error("{competitor} of {group} is still named by race {race}")]
    NamedByPlan {
        group: GroupName,
        competitor: CompetitorName,
        race: usize,
    },

    #[error("plan already holds recorded attempts")]
    PlanHasAttempts,

    #[error(transparent)]
    InvalidName(#[from] InvalidName),
}

pub type Result<T> = std::result::Result<T, RosterError>;

/// Where [`RaceBook::add_race`] inserts a hand-built race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceLocation {
    /// Directly after the current race.
    Next,
    /// At this plan index (clamped to the end).
    At(usize),
    End,
}

impl RaceBook {
    // ─── Groups ───

    /// Adds an empty group and re-sorts the roster.
    pub fn add_group(&mut self, name: GroupName, ability_rank: i64) -> Result<()> {
        if is_sentinel_name(&name) {
            return Err(RosterError::ReservedGroup(name));
        }
        if self.group_index(&name).is_some() {
            return Err(RosterError::DuplicateGroup(name));
        }
        self.groups.push(Group::new(name, ability_rank));
        sort_groups(&mut self.groups);
        self.roster_changed();
        Ok(())
    }

    /// Removes a group with all its members. The sentinel cannot be removed,
    /// nor can a group whose members a kept plan still names.
    pub fn remove_group(&mut self, name: &GroupName) -> Result<Group> {
        if is_sentinel_name(name) {
            return Err(RosterError::ReservedGroup(name.clone()));
        }
        let index = self.real_group_index(name)?;
        for competitor in &self.groups[index].competitors {
            self.ensure_unplanned(name, &competitor.name)?;
        }
        let group = self.groups.remove(index);
        self.roster_changed();
        Ok(group)
    }

    /// Re-sorts groups by ability rank, sentinel last.
    pub fn sort_groups(&mut self) {
        sort_groups(&mut self.groups);
        self.roster_changed();
    }

    // ─── Competitors ───

    /// Appends `competitor` to `group`. Any results it carries are cleared.
    pub fn add_competitor(&mut self, group: &GroupName, mut competitor: Competitor) -> Result<()> {
        let n_lanes = self.n_lanes;
        let target = self.real_group_mut(group)?;
        if target.position(&competitor.name).is_some() {
            return Err(RosterError::DuplicateCompetitor {
                group: group.clone(),
                competitor: competitor.name,
            });
        }
        competitor.clear_results();
        competitor.attach(group.clone(), target.len(), n_lanes);
        target.competitors.push(competitor);
        self.roster_changed();
        Ok(())
    }

    /// Removes a competitor and re-indexes the rest of its group.
    ///
    /// Refused while a plan that survives the change still names the
    /// competitor: the saved plan would no longer load.
    pub fn remove_competitor(
        &mut self,
        group: &GroupName,
        name: &CompetitorName,
    ) -> Result<Competitor> {
        let index = self.groups[self.real_group_index(group)?]
            .position(name)
            .ok_or_else(|| RosterError::UnknownCompetitor {
                group: group.clone(),
                competitor: name.clone(),
            })?;
        self.ensure_unplanned(group, name)?;

        let target = self.real_group_mut(group)?;
        let removed = target.competitors.remove(index);
        target.reindex();
        self.roster_changed();
        Ok(removed)
    }

    /// Moves a competitor between groups. Its results are cleared.
    ///
    /// Refused on the same terms as removal, since plan lanes address
    /// competitors by group.
    pub fn move_competitor(
        &mut self,
        from: &GroupName,
        name: &CompetitorName,
        to: &GroupName,
    ) -> Result<()> {
        let source = self.real_group_index(from)?;
        let dest = self.real_group_index(to)?;
        let index = self.groups[source].position(name).ok_or_else(|| {
            RosterError::UnknownCompetitor {
                group: from.clone(),
                competitor: name.clone(),
            }
        })?;
        if source == dest {
            return Ok(());
        }
        if self.groups[dest].position(name).is_some() {
            return Err(RosterError::DuplicateCompetitor {
                group: to.clone(),
                competitor: name.clone(),
            });
        }
        self.ensure_unplanned(from, name)?;

        let mut competitor = self.groups[source].competitors.remove(index);
        self.groups[source].reindex();
        let dest_group = &mut self.groups[dest];
        competitor.rehome(to.clone(), dest_group.len());
        dest_group.competitors.push(competitor);
        self.roster_changed();
        Ok(())
    }

    // ─── Plan ───

    /// Inserts a hand-built race and renumbers the plan. Freezes the plan.
    ///
    /// Ledger lines address races by plan index, so nothing may be inserted
    /// at or before the last race holding attempts.
    pub fn add_race(&mut self, mut race: ScheduledRace, location: RaceLocation) -> Result<usize> {
        self.validate_race(&race)?;

        let index = match location {
            RaceLocation::Next if self.plan.is_empty() => 0,
            RaceLocation::Next => self.cursor + 1,
            RaceLocation::At(i) => i.min(self.plan.len()),
            RaceLocation::End => self.plan.len(),
        };
        self.ensure_unrecorded_from(index)?;
        race.clear_attempts();
        let shifts_current = !self.plan.is_empty() && index <= self.cursor;
        self.plan.insert(index, race);
        if shifts_current {
            self.cursor += 1;
        }
        self.renumber_plan();
        self.frozen = true;
        Ok(index)
    }

    /// Removes a race, renumbers the plan and clamps the cursor.
    ///
    /// Refused at or before the last race holding attempts, like
    /// [`RaceBook::add_race`].
    pub fn remove_race(&mut self, index: usize) -> Result<ScheduledRace> {
        if index >= self.plan.len() {
            return Err(RosterError::UnknownRace(index));
        }
        self.ensure_unrecorded_from(index)?;
        let removed = self.plan.remove(index);
        self.renumber_plan();
        self.frozen = true;
        if index < self.cursor {
            self.cursor -= 1;
        } else if index == self.cursor {
            self.move_cursor(self.cursor);
            self.reset_staging();
        }
        Ok(removed)
    }

    /// Rebuilds the plan from the current roster and rewinds the cursor.
    ///
    /// Refused once any attempt has been recorded, since the ledger refers
    /// to races by plan index.
    pub fn regenerate_plan(&mut self) -> Result<()> {
        if self.plan.iter().any(|race| !race.attempts().is_empty()) {
            return Err(RosterError::PlanHasAttempts);
        }
        self.rebuild_plan();
        Ok(())
    }

    /// Stops automatic regeneration for the rest of the event.
    pub fn freeze_plan(&mut self) {
        self.frozen = true;
    }

    // ─── Internals ───

    pub(crate) fn rebuild_plan(&mut self) {
        self.plan = build_plan(&self.groups, self.n_lanes);
        self.cursor = 0;
        self.reset_staging();
        let competitors = self.competitor_count();
        if self.plan.is_empty() && competitors > 0 {
            warn!(
                competitors,
                n_lanes = self.n_lanes,
                "Too few competitors to fill the track, plan is empty"
            );
        } else {
            info!(races = self.plan.len(), competitors, "Plan generated");
        }
    }

    pub(crate) fn roster_changed(&mut self) {
        if self.regenerate && !self.frozen {
            self.rebuild_plan();
        }
    }

    pub(crate) fn renumber_plan(&mut self) {
        for (number, race) in self.plan.iter_mut().enumerate() {
            race.plan_number = number;
        }
    }

    /// Fails if a plan that outlives roster changes names this competitor.
    fn ensure_unplanned(&self, group: &GroupName, name: &CompetitorName) -> Result<()> {
        if self.regenerate && !self.frozen {
            return Ok(());
        }
        match self.plan.iter().position(|race| race.includes(group, name)) {
            Some(race) => Err(RosterError::NamedByPlan {
                group: group.clone(),
                competitor: name.clone(),
                race,
            }),
            None => Ok(()),
        }
    }

    /// Fails if any race at `index` or later already holds attempts.
    fn ensure_unrecorded_from(&self, index: usize) -> Result<()> {
        let recorded = self
            .plan
            .iter()
            .skip(index)
            .any(|race| !race.attempts().is_empty());
        if recorded {
            return Err(RosterError::PlanHasAttempts);
        }
        Ok(())
    }

    fn real_group_index(&self, name: &GroupName) -> Result<usize> {
        match self.group_index(name) {
            Some(index) if !is_sentinel_name(name) => Ok(index),
            _ => Err(RosterError::UnknownGroup(name.clone())),
        }
    }

    fn real_group_mut(&mut self, name: &GroupName) -> Result<&mut Group> {
        let index = self.real_group_index(name)?;
        Ok(&mut self.groups[index])
    }

    /// Checks lane count and that every lane refers to a roster member.
    pub(crate) fn validate_race(&self, race: &ScheduledRace) -> Result<()> {
        if race.n_lanes() != self.n_lanes {
            return Err(RosterError::LaneCountMismatch {
                expected: self.n_lanes,
                got: race.n_lanes(),
            });
        }
        for lane in &race.lanes {
            match lane {
                LaneAssignment::Entry { group, competitor } => {
                    if self.competitor(group, competitor).is_none() || is_sentinel_name(group) {
                        return Err(RosterError::UnknownCompetitor {
                            group: group.clone(),
                            competitor: competitor.clone(),
                        });
                    }
                }
                LaneAssignment::Filler { slot } if *slot >= self.n_lanes => {
                    return Err(RosterError::UnknownFiller {
                        slot: *slot,
                        n_lanes: self.n_lanes,
                    });
                }
                LaneAssignment::Filler { .. } => {}
            }
        }
        Ok(())
    }
}
