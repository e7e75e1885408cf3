/// Collapse of sorted hits into extended seeds
///
/// Two hits on the same target that are exactly one step apart in both the
/// query and the target are the same seed seen twice: the later hit is
/// dropped and the earliest hit of the run grows by one step.
use crate::hits::Hit;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed {
    pub query_pos: u32,
    pub target_pos: u32,
    pub target: u32,
    /// Letters covered, starting at the word size
    pub len: u32,
    pub score: f64,
}

impl Seed {
    pub fn query_end(&self) -> u32 {
        self.query_pos + self.len - 1
    }

    pub fn target_end(&self) -> u32 {
        self.target_pos + self.len - 1
    }
}

/// Collapse hits sorted by (target, target position) into seeds
///
/// The output keeps the input order of the surviving hits.
pub fn collapse_hits(hits: &[Hit], word_size: usize, step: usize) -> Vec<Seed> {
    let total = hits.len();
    let step = step as i64;
    let mut len = vec![word_size as u32; total];
    let mut score: Vec<f64> = hits.iter().map(|h| h.score).collect();
    let mut origin: Vec<usize> = (0..total).collect();
    let mut keep = vec![true; total];

    // `left` is the first hit that may still be exactly one step behind
    let mut left = 0;
    for current in 1..total {
        if hits[left].target != hits[current].target {
            left = current;
            continue;
        }
        for prev in left..current {
            let delta_target = hits[current].target_pos as i64 - hits[prev].target_pos as i64;
            if delta_target > step {
                left = prev + 1;
            } else if delta_target == step {
                let delta_query = hits[current].query_pos as i64 - hits[prev].query_pos as i64;
                if delta_query == step {
                    let root = origin[prev];
                    keep[current] = false;
                    origin[current] = root;
                    len[root] += step as u32;
                    score[root] += hits[current].add_score;
                    break;
                }
            } else {
                // Positions are sorted, so nothing further is a step behind
                break;
            }
        }
    }

    hits.iter()
        .enumerate()
        .filter(|&(i, _)| keep[i])
        .map(|(i, h)| Seed {
            query_pos: h.query_pos,
            target_pos: h.target_pos,
            target: h.target,
            len: len[i],
            score: score[i],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(query_pos: u32, target: u32, target_pos: u32) -> Hit {
        Hit {
            query_pos,
            target_pos,
            target,
            score: 4.0,
            add_score: 1.0,
        }
    }

    #[test]
    fn test_merges_exact_step() {
        let hits = vec![hit(0, 0, 10), hit(1, 0, 11), hit(2, 0, 12)];
        let seeds = collapse_hits(&hits, 4, 1);
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].len, 6);
        assert_eq!(seeds[0].score, 6.0);
        assert_eq!(seeds[0].query_end(), 5);
        assert_eq!(seeds[0].target_end(), 15);
    }

    #[test]
    fn test_target_gap_prevents_merge() {
        let hits = vec![hit(0, 0, 10), hit(2, 0, 13)];
        let seeds = collapse_hits(&hits, 4, 2);
        assert_eq!(seeds.len(), 2);
        assert!(seeds.iter().all(|s| s.len == 4));
    }

    #[test]
    fn test_query_offset_prevents_merge() {
        let hits = vec![hit(0, 0, 10), hit(3, 0, 11)];
        assert_eq!(collapse_hits(&hits, 4, 1).len(), 2);
    }

    #[test]
    fn test_different_targets_never_merge() {
        let hits = vec![hit(0, 0, 10), hit(1, 1, 11)];
        assert_eq!(collapse_hits(&hits, 4, 1).len(), 2);
    }

    #[test]
    fn test_repeat_merges_once() {
        // Target positions 10 and 11 both hit by query 0 and 1
        let hits = vec![hit(0, 0, 10), hit(1, 0, 10), hit(0, 0, 11), hit(1, 0, 11)];
        let seeds = collapse_hits(&hits, 3, 1);
        // (q0,t10)+(q1,t11) merge; (q1,t10) and (q0,t11) stay single
        assert_eq!(seeds.len(), 3);
        assert_eq!(seeds[0].len, 4);
        assert_eq!(seeds[1].len, 3);
        assert_eq!(seeds[2].len, 3);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(collapse_hits(&[], 4, 1).is_empty());
        assert_eq!(collapse_hits(&[hit(0, 0, 0)], 4, 1).len(), 1);
    }
}
