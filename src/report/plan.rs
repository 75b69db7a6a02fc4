//! Text rendering of the plan for operators.

use crate::event::RaceBook;
use crate::types::{LaneAssignment, RaceState, ScheduledRace};

fn state_label(race: &ScheduledRace) -> String {
    match race.state() {
        RaceState::NoAttempt => "pending".to_string(),
        RaceState::Unaccepted { attempts } => format!("{attempts} unaccepted"),
        RaceState::Accepted { index } => format!("accepted #{index}"),
    }
}

fn lane_label(lane: &LaneAssignment) -> String {
    match lane {
        LaneAssignment::Entry { group, competitor } => format!("{competitor} ({group})"),
        LaneAssignment::Filler { .. } => "-".to_string(),
    }
}

/// One line per race: number, lane occupants, acceptance state. The current
/// race is marked with `>`.
pub fn format_plan(book: &RaceBook) -> String {
    let current = book.current_plan_index();
    let mut out = String::new();
    for (index, race) in book.plan().iter().enumerate() {
        let marker = if current == Some(index) { '>' } else { ' ' };
        let lanes: Vec<String> = race.lanes.iter().map(lane_label).collect();
        out.push_str(&format!(
            "{marker}{:>4}  {}  [{}]\n",
            race.plan_number + 1,
            lanes.join(" | "),
            state_label(race)
        ));
    }
    out
}

/// A short summary of where the event stands.
pub fn format_status(book: &RaceBook) -> String {
    let accepted = book
        .plan()
        .iter()
        .filter(|race| matches!(race.state(), RaceState::Accepted { .. }))
        .count();
    let current = match book.current_plan_index() {
        Some(index) => format!("race {} of {}", index + 1, book.plan().len()),
        None => "no races planned".to_string(),
    };
    format!(
        "{} competitors in {} groups, {} lanes\n{}, {} accepted, next ledger entry {}\n",
        book.competitor_count(),
        book.real_groups().count(),
        book.n_lanes(),
        current,
        accepted,
        book.next_seq()
    )
}
