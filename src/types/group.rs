//! Groups (heats) and the reserved sentinel group that supplies lane fillers.

use serde::{Deserialize, Serialize};

use super::competitor::Competitor;
use super::ids::{CompetitorName, GroupName};

/// Name of the reserved sentinel group. Always sorts last, never removed.
pub const EMPTY_GROUP_NAME: &str = "Empty";

/// Rank label given to the sentinel's placeholder competitors.
const EMPTY_RANK_LABEL: &str = "Empty";

/// A named, ability-ranked cohort of competitors.
///
/// Member order defines the in-group rotation offsets used by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: GroupName,

    /// Seed rank; groups are scheduled in ascending order.
    #[serde(default)]
    pub ability_rank: i64,

    #[serde(default)]
    pub competitors: Vec<Competitor>,
}

impl Group {
    pub fn new(name: GroupName, ability_rank: i64) -> Self {
        Group {
            name,
            ability_rank,
            competitors: Vec::new(),
        }
    }

    /// Builds the sentinel group with one placeholder per lane (`empty 1` ...).
    pub fn sentinel(n_lanes: usize) -> Self {
        let name = GroupName::parse(EMPTY_GROUP_NAME).expect("sentinel name is valid");
        let mut group = Group::new(name, 0);
        for slot in 0..n_lanes {
            let placeholder = CompetitorName::parse(format!("empty {}", slot + 1))
                .expect("placeholder names are valid");
            let mut competitor = Competitor::new(placeholder, EMPTY_RANK_LABEL, n_lanes);
            competitor.rehome(group.name.clone(), slot);
            group.competitors.push(competitor);
        }
        group
    }

    /// Returns true if this is the reserved sentinel group.
    pub fn is_sentinel(&self) -> bool {
        is_sentinel_name(&self.name)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.competitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty()
    }

    /// Position of the named member, if present.
    pub fn position(&self, name: &CompetitorName) -> Option<usize> {
        self.competitors.iter().position(|c| &c.name == name)
    }

    pub fn competitor(&self, name: &CompetitorName) -> Option<&Competitor> {
        self.competitors.iter().find(|c| &c.name == name)
    }

    pub fn competitor_mut(&mut self, name: &CompetitorName) -> Option<&mut Competitor> {
        self.competitors.iter_mut().find(|c| &c.name == name)
    }

    /// Re-establishes every member's back-reference after the member list changed.
    pub(crate) fn reindex(&mut self) {
        for (index, competitor) in self.competitors.iter_mut().enumerate() {
            competitor.set_index(index);
        }
    }
}

/// Returns true if `name` is the reserved sentinel group name.
pub fn is_sentinel_name(name: &GroupName) -> bool {
    name.as_str() == EMPTY_GROUP_NAME
}

/// Orders groups ascending by ability rank with the sentinel forced last.
///
/// The sentinel's rank is rewritten to `max(rank) + 1`. The sort is stable, so
/// groups with equal rank keep their insertion order.
pub fn sort_groups(groups: &mut [Group]) {
    let max_rank = groups
        .iter()
        .filter(|g| !g.is_sentinel())
        .map(|g| g.ability_rank)
        .max()
        .unwrap_or(0);
    for group in groups.iter_mut().filter(|g| g.is_sentinel()) {
        group.ability_rank = max_rank.saturating_add(1);
    }
    groups.sort_by_key(|g| (g.is_sentinel(), g.ability_rank));
}
