//! Sparse chaining of seeds
//!
//! A forward dynamic program over seeds grouped by target and sorted by
//! target position. Each seed may extend the best co-linear chain ending at
//! an earlier seed of the same target, provided the gap between them is at
//! most `max_sep` on both axes. The search window only moves forward, which
//! bounds the work to O(seeds * max_sep) rather than O(seeds^2).
//!
//! Chains live in one arena per query; predecessor and origin links are
//! indices into that arena. A node whose predecessor is itself starts a chain.

use crate::collapse::Seed;
use crate::score_model::ScoreModel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainNode {
    pub seed: Seed,
    /// Best cumulative score of a chain ending at this seed
    pub score: f64,
    /// Previous seed in the chain, or this node's own index
    pub prev: usize,
    /// First seed of the chain
    pub origin: usize,
    /// Letters covered by the chain, less one
    pub coverage: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Chains {
    nodes: Vec<ChainNode>,
}

impl Chains {
    /// Chain `seeds`, which must be grouped by target and sorted by position
    pub fn build(seeds: Vec<Seed>, model: &ScoreModel) -> Self {
        let max_sep = model.max_sep() as i64;
        let mut nodes: Vec<ChainNode> = seeds
            .into_iter()
            .enumerate()
            .map(|(i, seed)| ChainNode {
                seed,
                score: seed.score,
                prev: i,
                origin: i,
                coverage: seed.len - 1,
            })
            .collect();

        let mut window = 0;
        for k in 1..nodes.len() {
            if nodes[k].seed.target != nodes[window].seed.target {
                window = k;
                continue;
            }
            let current = nodes[k].seed;
            let own_score = current.score;
            for p in window..k {
                let prev = nodes[p];
                let prev_len = prev.seed.len as i64;
                let delta_target =
                    current.target_pos as i64 - prev.seed.target_pos as i64 - prev_len;
                if delta_target > max_sep {
                    // Too far behind now, and for every later seed too
                    window = p;
                    continue;
                }
                if delta_target < 0 {
                    continue;
                }
                let delta_query = current.query_pos as i64 - prev.seed.query_pos as i64 - prev_len;
                if delta_query < 0 || delta_query > max_sep {
                    continue;
                }
                let mut candidate = prev.score + own_score;
                if candidate <= nodes[k].score {
                    continue;
                }
                let gap = (delta_query - delta_target).unsigned_abs() as usize;
                let sep = delta_query.min(delta_target) as usize;
                candidate += model.gap_cost(gap) + model.sep_cost(sep);
                if candidate > nodes[k].score {
                    let node = &mut nodes[k];
                    node.score = candidate;
                    node.prev = p;
                    node.origin = prev.origin;
                    node.coverage = current.len - 1 + prev.coverage;
                }
            }
        }

        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[ChainNode] {
        &self.nodes
    }

    pub fn node(&self, i: usize) -> &ChainNode {
        &self.nodes[i]
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [ChainNode] {
        &mut self.nodes
    }

    /// Indices of the seeds of the chain ending at `end`, from `end` back to its start
    pub fn traceback(&self, end: usize) -> Traceback<'_> {
        Traceback {
            chains: self,
            next: Some(end),
        }
    }

    /// Number of seeds in the chain ending at `end`
    pub fn chain_len(&self, end: usize) -> usize {
        self.traceback(end).count()
    }
}

pub struct Traceback<'a> {
    chains: &'a Chains,
    next: Option<usize>,
}

impl Iterator for Traceback<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        let prev = self.chains.nodes[current].prev;
        self.next = (prev != current).then_some(prev);
        Some(current)
    }
}
