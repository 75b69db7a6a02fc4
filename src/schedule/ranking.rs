//! Finishing placements for one attempt.

/// Computes per-lane placements from raw timer counts.
///
/// - Filler lanes and lanes with a non-positive count get `None`.
/// - Remaining lanes rank by ascending count; 1 is fastest.
/// - Equal counts share the better rank and the next distinct count skips
///   ahead (`1, 2, 2, 4`).
///
/// `fillers` shorter than `counts` treats the missing lanes as real.
pub fn placements(counts: &[i64], fillers: &[bool]) -> Vec<Option<u32>> {
    let is_filler = |lane: usize| fillers.get(lane).copied().unwrap_or(false);

    let mut finishers: Vec<(usize, i64)> = counts
        .iter()
        .copied()
        .enumerate()
        .filter(|(lane, count)| !is_filler(*lane) && *count > 0)
        .collect();
    finishers.sort_by_key(|(lane, count)| (*count, *lane));

    let mut out = vec![None; counts.len()];
    let mut previous: Option<(i64, u32)> = None;
    for (position, (lane, count)) in finishers.into_iter().enumerate() {
        let rank = match previous {
            Some((prev_count, prev_rank)) if prev_count == count => prev_rank,
            _ => position as u32 + 1,
        };
        out[lane] = Some(rank);
        previous = Some((count, rank));
    }
    out
}
