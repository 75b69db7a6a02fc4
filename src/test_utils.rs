//! Shared test utilities and arbitrary generators for property-based testing.

use std::ops::Range;

use crate::event::RaceBook;
use crate::types::{Competitor, CompetitorName, Group, GroupName};
use proptest::prelude::*;

pub fn gname(name: &str) -> GroupName {
    GroupName::parse(name).unwrap()
}

pub fn cname(name: &str) -> CompetitorName {
    CompetitorName::parse(name).unwrap()
}

/// Real groups plus the sentinel, `total` competitors spread over one to four
/// groups with random ability ranks. Competitor names are unique.
pub fn arb_groups(n_lanes: usize, total: Range<usize>) -> impl Strategy<Value = Vec<Group>> {
    (total, 1usize..=4)
        .prop_flat_map(|(n, k)| {
            (
                prop::collection::vec(0..k, n),
                prop::collection::vec(-5i64..5, k),
            )
        })
        .prop_map(move |(owners, ranks)| {
            let mut groups: Vec<Group> = ranks
                .iter()
                .enumerate()
                .map(|(g, rank)| Group::new(gname(&format!("G{g}")), *rank))
                .collect();
            for (i, owner) in owners.into_iter().enumerate() {
                let group = &mut groups[owner];
                let mut competitor = Competitor::new(cname(&format!("C{i}")), "Cub", n_lanes);
                competitor.rehome(group.name.clone(), group.competitors.len());
                group.competitors.push(competitor);
            }
            groups.push(Group::sentinel(n_lanes));
            groups
        })
}

/// Per-lane counts for one trial, including zeros for non-finishers.
pub fn arb_counts(n_lanes: usize) -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(prop_oneof![1 => Just(0i64), 4 => 1000i64..20_000], n_lanes)
}

/// A book with one group, "Cubs", holding `members` in order.
pub fn roster_book(n_lanes: usize, members: &[&str]) -> RaceBook {
    let mut book = RaceBook::new(n_lanes, true);
    book.add_group(gname("Cubs"), 0).unwrap();
    for name in members {
        book.add_competitor(&gname("Cubs"), Competitor::new(cname(name), "Cub", n_lanes))
            .unwrap();
    }
    book
}

/// Times in seconds for `counts` at the default clock rate.
pub fn seconds(counts: &[i64]) -> Vec<f64> {
    counts.iter().map(|c| *c as f64 / 2000.0).collect()
}
