//! Round-robin lane rotation.
//!
//! The roster of real competitors is padded with fillers from the sentinel
//! group to a length `N'` coprime with the lane count, then race `i` takes
//! roster entries `(i * n_lanes + lane) mod N'` for each lane.
//!
//! # Coverage
//!
//! For a fixed lane `l`, roster entry `p` lands in race `i` exactly when
//! `i * n_lanes ≡ p - l (mod N')`. With `gcd(n_lanes, N') = 1` that
//! congruence has a single solution in `0..N'`, so every entry appears once in
//! every lane and `n_lanes` times in the whole plan.
//!
//! The padding rule keeps `N' mod n_lanes` at `1` (remainder 0 gets one
//! filler) or at `n_lanes - 1` (remainder `r >= 1` gets `n_lanes - 1 - r`).
//! Both residues are coprime with `n_lanes`.

use crate::types::{Group, LaneAssignment, ScheduledRace};

/// Number of fillers appended to a roster of `n_real` entries.
pub fn filler_count(n_real: usize, n_lanes: usize) -> usize {
    if n_lanes == 0 {
        return 0;
    }
    match n_real % n_lanes {
        0 => 1,
        r => n_lanes - 1 - r,
    }
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Flattens the real groups into one roster and appends the fillers.
///
/// Groups are taken in ascending ability rank (stable), members in group
/// order. The sentinel group is never part of the roster; fillers refer to
/// its members by slot.
pub fn padded_roster(groups: &[Group], n_lanes: usize) -> Vec<LaneAssignment> {
    let mut ranked: Vec<&Group> = groups.iter().filter(|g| !g.is_sentinel()).collect();
    ranked.sort_by_key(|g| g.ability_rank);

    let mut roster: Vec<LaneAssignment> = ranked
        .iter()
        .flat_map(|g| {
            g.competitors
                .iter()
                .map(|c| LaneAssignment::entry(g.name.clone(), c.name.clone()))
        })
        .collect();

    let fillers = filler_count(roster.len(), n_lanes);
    roster.extend((0..fillers).map(|slot| LaneAssignment::Filler { slot }));
    roster
}

/// Builds the race plan.
///
/// Returns an empty plan when there are fewer real competitors than lanes or
/// fewer than two lanes; the caller decides how to tell the operator.
pub fn build_plan(groups: &[Group], n_lanes: usize) -> Vec<ScheduledRace> {
    let n_real: usize = groups
        .iter()
        .filter(|g| !g.is_sentinel())
        .map(Group::len)
        .sum();
    if n_lanes < 2 || n_real < n_lanes {
        return Vec::new();
    }

    let roster = padded_roster(groups, n_lanes);
    let n_padded = roster.len();
    if gcd(n_padded, n_lanes) != 1 {
        // Unreachable with the padding rule above.
        return Vec::new();
    }

    (0..n_padded)
        .map(|race| {
            let lanes = (0..n_lanes)
                .map(|lane| roster[(race * n_lanes + lane) % n_padded].clone())
                .collect();
            ScheduledRace::new(race, lanes)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::arb_groups;
    use crate::types::{Competitor, CompetitorName, GroupName};
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn group(name: &str, rank: i64, members: &[&str], n_lanes: usize) -> Group {
        let mut g = Group::new(GroupName::parse(name).unwrap(), rank);
        for (i, m) in members.iter().enumerate() {
            let mut c = Competitor::new(CompetitorName::parse(*m).unwrap(), "", n_lanes);
            c.rehome(g.name.clone(), i);
            g.competitors.push(c);
        }
        g
    }

    #[test]
    fn filler_counts_keep_length_coprime() {
        assert_eq!(filler_count(5, 4), 2);
        assert_eq!(filler_count(4, 4), 1);
        assert_eq!(filler_count(6, 4), 1);
        assert_eq!(filler_count(7, 4), 0);
        assert_eq!(filler_count(9, 2), 0);
        assert_eq!(filler_count(8, 2), 1);
    }

    #[test]
    fn five_competitors_four_lanes_gives_seven_races() {
        let groups = vec![
            group("Wolves", 1, &["A", "B", "C"], 4),
            group("Bears", 2, &["D", "E"], 4),
            Group::sentinel(4),
        ];
        let plan = build_plan(&groups, 4);
        assert_eq!(plan.len(), 7);

        let mut appearances: HashMap<String, usize> = HashMap::new();
        for race in &plan {
            for lane in &race.lanes {
                if let LaneAssignment::Entry { competitor, .. } = lane {
                    *appearances.entry(competitor.to_string()).or_default() += 1;
                }
            }
        }
        assert_eq!(appearances.len(), 5);
        assert!(appearances.values().all(|n| *n == 4));
    }

    #[test]
    fn roster_follows_ability_rank_then_member_order() {
        let groups = vec![
            group("Bears", 2, &["D", "E"], 4),
            Group::sentinel(4),
            group("Wolves", 1, &["A", "B"], 4),
        ];
        let roster = padded_roster(&groups, 4);
        let names: Vec<String> = roster.iter().map(LaneAssignment::ledger_name).collect();
        assert_eq!(names, vec!["A", "B", "D", "E", "empty 1"]);
    }

    #[test]
    fn too_few_competitors_yields_empty_plan() {
        let groups = vec![group("Wolves", 1, &["A", "B", "C"], 4), Group::sentinel(4)];
        assert!(build_plan(&groups, 4).is_empty());
        assert!(build_plan(&[Group::sentinel(4)], 4).is_empty());
    }

    #[test]
    fn single_lane_yields_empty_plan() {
        let groups = vec![group("Wolves", 1, &["A", "B"], 1)];
        assert!(build_plan(&groups, 1).is_empty());
    }

    proptest! {
        /// Every real competitor appears exactly once in every lane.
        #[test]
        fn every_competitor_races_once_per_lane((n_lanes, groups) in (2usize..=8).prop_flat_map(|n| (Just(n), arb_groups(n, n..60)))) {
            let plan = build_plan(&groups, n_lanes);
            let n_real: usize = groups.iter().filter(|g| !g.is_sentinel()).map(Group::len).sum();
            prop_assert_eq!(plan.len(), n_real + filler_count(n_real, n_lanes));

            let mut per_lane: HashMap<(String, String), Vec<usize>> = HashMap::new();
            for race in &plan {
                prop_assert_eq!(race.lanes.len(), n_lanes);
                for (lane, assignment) in race.lanes.iter().enumerate() {
                    if let LaneAssignment::Entry { group, competitor } = assignment {
                        per_lane
                            .entry((group.to_string(), competitor.to_string()))
                            .or_default()
                            .push(lane);
                    }
                }
            }

            prop_assert_eq!(per_lane.len(), n_real);
            for lanes in per_lane.values_mut() {
                lanes.sort_unstable();
                prop_assert_eq!(lanes.clone(), (0..n_lanes).collect::<Vec<_>>());
            }
        }

        /// Regenerating from an unchanged roster yields the identical plan.
        #[test]
        fn plan_is_deterministic((n_lanes, groups) in (2usize..=6).prop_flat_map(|n| (Just(n), arb_groups(n, 0..30)))) {
            prop_assert_eq!(build_plan(&groups, n_lanes), build_plan(&groups, n_lanes));
        }
    }
}
