//! Standings: competitors ordered by average time.

use std::io;
use std::path::Path;

use crate::persistence::write_atomic;
use crate::types::Group;

/// Column widths for the fixed-width report.
const RANK_WIDTH: usize = 8;
const NAME_WIDTH: usize = 30;
const GROUP_WIDTH: usize = 12;
const TIME_WIDTH: usize = 10;

/// One row of the standings.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    /// 1-based position in the standings.
    pub rank: usize,
    pub name: String,
    pub group: String,
    /// Mean of the competitor's positive lane times, in seconds.
    pub average: f64,
}

/// Ranks every real competitor with at least one positive time.
///
/// Sorted ascending by average; equal averages keep roster order.
pub fn standings<'a>(groups: impl IntoIterator<Item = &'a Group>) -> Vec<Standing> {
    let mut rows: Vec<(f64, String, String)> = groups
        .into_iter()
        .filter(|g| !g.is_sentinel())
        .flat_map(|g| {
            g.competitors
                .iter()
                .map(move |c| (c.average_time(), c.name.to_string(), g.name.to_string()))
        })
        .filter(|(average, _, _)| *average > 0.0)
        .collect();
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));

    rows.into_iter()
        .enumerate()
        .map(|(i, (average, name, group))| Standing {
            rank: i + 1,
            name,
            group,
            average,
        })
        .collect()
}

/// Renders standings as right-justified fixed-width text with a header row.
pub fn format_standings(rows: &[Standing]) -> String {
    let mut out = format!(
        "{:>RANK_WIDTH$}{:>NAME_WIDTH$}{:>GROUP_WIDTH$}{:>TIME_WIDTH$}\n",
        "Rank", "Name", "Group", "Time"
    );
    for row in rows {
        out.push_str(&format!(
            "{:>RANK_WIDTH$}{:>NAME_WIDTH$}{:>GROUP_WIDTH$}{:>TIME_WIDTH$.4}\n",
            row.rank, row.name, row.group, row.average
        ));
    }
    out
}

/// Writes the formatted standings to `path` atomically.
pub fn write_report(path: &Path, rows: &[Standing]) -> io::Result<()> {
    write_atomic(path, format_standings(rows).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{cname, gname};
    use crate::types::{Competitor, LaneResult};
    use tempfile::tempdir;

    fn timed(name: &str, times: &[f64]) -> Competitor {
        let mut c = Competitor::new(cname(name), "Cub", 4);
        for (lane, t) in times.iter().enumerate() {
            c.post_result(
                lane,
                LaneResult {
                    elapsed_time: *t,
                    ..Default::default()
                },
            );
        }
        c
    }

    fn group(name: &str, members: Vec<Competitor>) -> Group {
        let mut g = Group::new(gname(name), 0);
        g.competitors = members;
        g
    }

    #[test]
    fn sorted_by_average_skipping_untimed_and_sentinel() {
        let groups = vec![
            group("Cubs", vec![timed("Slow", &[4.0, 4.2]), timed("None", &[])]),
            group("Wolves", vec![timed("Fast", &[3.0, 0.0, 3.2])]),
            Group::sentinel(4),
        ];

        let rows = standings(&groups);
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Fast", "Slow"]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].group, "Wolves");
        assert!((rows[0].average - 3.1).abs() < 1e-9);
    }

    #[test]
    fn equal_averages_keep_roster_order() {
        let groups = vec![group(
            "Cubs",
            vec![timed("First", &[3.5]), timed("Second", &[3.5])],
        )];
        let rows = standings(&groups);
        assert_eq!(rows[0].name, "First");
        assert_eq!(rows[1].name, "Second");
    }

    #[test]
    fn formats_fixed_width_columns() {
        let rows = vec![Standing {
            rank: 1,
            name: "Ada".to_string(),
            group: "Cubs".to_string(),
            average: 3.14159,
        }];
        let text = format_standings(&rows);
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0].len(), 60);
        assert_eq!(lines[1].len(), 60);
        assert!(lines[0].ends_with("      Time"));
        assert!(lines[1].ends_with("    3.1416"));
        assert_eq!(&lines[1][..8], "       1");
    }

    #[test]
    fn report_is_written_atomically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("standings.txt");
        let groups = vec![group("Cubs", vec![timed("Ada", &[3.0])])];

        write_report(&path, &standings(&groups)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Ada"));
        assert!(!dir.path().join("standings.txt.tmp").exists());
    }
}
