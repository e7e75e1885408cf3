/// Bottom-up merge sort of raw hits by (target, target position)
///
/// Hits arrive in one block per query position, each block already ordered
/// when the index was built in target order. Adjacent blocks are merged
/// pairwise, halving the number of blocks every pass. On equal keys the left
/// block wins, so the sort is stable.
use std::cmp::Ordering;

use crate::hits::Hit;

#[inline]
fn key(hit: &Hit) -> (u32, u32) {
    (hit.target, hit.target_pos)
}

/// Merge two ordered runs of hit indices into `out`
fn merge_runs(left: &[usize], right: &[usize], hits: &[Hit], out: &mut [usize]) {
    let (mut i, mut j, mut p) = (0, 0, 0);
    while i < left.len() && j < right.len() {
        if key(&hits[left[i]]) <= key(&hits[right[j]]) {
            out[p] = left[i];
            i += 1;
        } else {
            out[p] = right[j];
            j += 1;
        }
        p += 1;
    }
    let rest_left = left.len() - i;
    out[p..p + rest_left].copy_from_slice(&left[i..]);
    out[p + rest_left..].copy_from_slice(&right[j..]);
}

/// Sort `hits` given the exclusive end of each initial block
///
/// Blocks that are not internally ordered (an index not built in target
/// order) are stably sorted before merging.
pub fn sort_hits(mut hits: Vec<Hit>, group_ends: &[usize]) -> Vec<Hit> {
    let total = hits.len();
    if total < 2 {
        return hits;
    }

    let mut ends: Vec<usize> = group_ends.to_vec();
    if ends.last() != Some(&total) {
        // Treat anything past the last declared block as one more block
        ends.push(total);
    }

    let mut start = 0;
    for &end in &ends {
        let block = &mut hits[start..end];
        if block.windows(2).any(|w| key(&w[0]) > key(&w[1])) {
            block.sort_by(|a, b| key(a).cmp(&key(b)));
        }
        start = end;
    }

    let mut order: Vec<usize> = (0..total).collect();
    let mut next = vec![0usize; total];
    while ends.len() > 1 {
        let mut merged_ends = Vec::with_capacity(ends.len().div_ceil(2));
        let mut start = 0;
        for pair in ends.chunks(2) {
            match *pair {
                [mid, end] => {
                    merge_runs(&order[start..mid], &order[mid..end], &hits, &mut next[start..end]);
                    merged_ends.push(end);
                    start = end;
                }
                [end] => {
                    next[start..end].copy_from_slice(&order[start..end]);
                    merged_ends.push(end);
                    start = end;
                }
                _ => unreachable!("chunks(2) yields one or two ends"),
            }
        }
        std::mem::swap(&mut order, &mut next);
        ends = merged_ends;
    }

    order.into_iter().map(|i| hits[i]).collect()
}

/// Total order used by the sorter, exposed for checking results
pub fn compare_hits(a: &Hit, b: &Hit) -> Ordering {
    key(a).cmp(&key(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(query_pos: u32, target: u32, target_pos: u32) -> Hit {
        Hit {
            query_pos,
            target_pos,
            target,
            score: 1.0,
            add_score: 0.5,
        }
    }

    #[test]
    fn test_sorts_by_target_then_position() {
        let hits = vec![
            hit(0, 2, 5),
            hit(0, 3, 1),
            hit(1, 1, 9),
            hit(2, 2, 1),
            hit(2, 2, 7),
            hit(3, 0, 4),
        ];
        let sorted = sort_hits(hits, &[2, 3, 5, 6]);
        let keys: Vec<(u32, u32)> = sorted.iter().map(key).collect();
        assert_eq!(keys, vec![(0, 4), (1, 9), (2, 1), (2, 5), (2, 7), (3, 1)]);
    }

    #[test]
    fn test_equal_keys_keep_left_first() {
        let hits = vec![hit(0, 1, 3), hit(1, 1, 3), hit(2, 1, 3)];
        let sorted = sort_hits(hits, &[1, 2, 3]);
        let queries: Vec<u32> = sorted.iter().map(|h| h.query_pos).collect();
        assert_eq!(queries, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_groups_and_odd_count() {
        let hits = vec![hit(0, 4, 0), hit(2, 1, 0), hit(4, 0, 0)];
        let sorted = sort_hits(hits, &[1, 1, 2, 2, 3]);
        let targets: Vec<u32> = sorted.iter().map(|h| h.target).collect();
        assert_eq!(targets, vec![0, 1, 4]);
    }

    #[test]
    fn test_unordered_block_is_sorted_first() {
        let hits = vec![hit(0, 1, 9), hit(0, 0, 2), hit(1, 0, 1)];
        let sorted = sort_hits(hits, &[2, 3]);
        let keys: Vec<(u32, u32)> = sorted.iter().map(key).collect();
        assert_eq!(keys, vec![(0, 1), (0, 2), (1, 9)]);
    }
}
