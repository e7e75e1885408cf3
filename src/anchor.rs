/// Anchor reconstruction by chain traceback
use crate::chain::Chains;

/// One seed of a reported chain, 0-based with inclusive ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub query_start: u32,
    pub query_end: u32,
    pub target_start: u32,
    pub target_end: u32,
}

/// Anchors of the chain ending at `end`, in ascending query order
pub fn chain_anchors(chains: &Chains, end: usize) -> Vec<Anchor> {
    let mut anchors = Vec::with_capacity(chains.chain_len(end));
    anchors.extend(chains.traceback(end).map(|i| {
        let seed = &chains.node(i).seed;
        Anchor {
            query_start: seed.query_pos,
            query_end: seed.query_end(),
            target_start: seed.target_pos,
            target_end: seed.target_end(),
        }
    }));
    anchors.reverse();
    anchors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collapse::Seed;
    use crate::score_model::ScoreModel;

    #[test]
    fn test_anchors_in_query_order() {
        let model = ScoreModel::new(4, 1, &[1.0; 4], 0.0, 0.0).unwrap();
        let seeds = vec![
            Seed { query_pos: 0, target_pos: 10, target: 0, len: 4, score: 5.0 },
            Seed { query_pos: 6, target_pos: 16, target: 0, len: 5, score: 5.0 },
        ];
        let chains = Chains::build(seeds, &model);
        let anchors = chain_anchors(&chains, 1);
        assert_eq!(
            anchors,
            vec![
                Anchor { query_start: 0, query_end: 3, target_start: 10, target_end: 13 },
                Anchor { query_start: 6, query_end: 10, target_start: 16, target_end: 20 },
            ]
        );
        assert_eq!(chain_anchors(&chains, 0).len(), 1);
    }
}
