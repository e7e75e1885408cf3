/// Significance correction and result selection
///
/// Raw chain scores are discounted by the search space the chain leaves
/// unexplained, then one of three reporting policies picks the candidate
/// endpoints, and finally a minimum score removes chance matches.
use crate::chain::Chains;
use crate::config::ReportMode;
use crate::index::InvertedIndex;

/// Subtract log(remaining target space / step) and log(remaining query width)
pub fn correct_scores(chains: &mut Chains, index: &InvertedIndex, width: u32, step: usize) {
    let step = step as f64;
    for node in chains.nodes_mut() {
        let coverage = node.coverage as f64;
        let target_space = index.matchable(node.seed.target) as f64 - coverage;
        node.score -= (target_space / step).ln();
        node.score -= (width as f64 - coverage).ln();
    }
}

/// Candidate chain endpoints under `mode`, in arena order
pub fn select_endpoints(chains: &Chains, mode: ReportMode) -> Vec<usize> {
    let nodes = chains.nodes();
    if nodes.is_empty() {
        return Vec::new();
    }
    match mode {
        ReportMode::All => {
            // Best endpoint per origin seed; origins always precede their chains
            let mut best: Vec<Option<usize>> = vec![None; nodes.len()];
            for (j, node) in nodes.iter().enumerate() {
                if node.origin == j {
                    best[j] = Some(j);
                } else if let Some(current) = best[node.origin] {
                    if nodes[current].score < node.score {
                        best[node.origin] = Some(j);
                    }
                }
            }
            let mut selected: Vec<usize> = best.into_iter().flatten().collect();
            selected.sort_unstable();
            selected
        }
        ReportMode::Target => {
            let mut selected = Vec::new();
            let mut run_best = 0;
            for j in 1..nodes.len() {
                if nodes[j].seed.target != nodes[run_best].seed.target {
                    selected.push(run_best);
                    run_best = j;
                } else if nodes[j].score > nodes[run_best].score {
                    run_best = j;
                }
            }
            selected.push(run_best);
            selected
        }
        ReportMode::Top => {
            let mut top = 0;
            for j in 1..nodes.len() {
                if nodes[j].score > nodes[top].score {
                    top = j;
                }
            }
            vec![top]
        }
    }
}

/// Drop endpoints scoring below the threshold
///
/// Without an explicit minimum, the threshold for a target is the expected
/// score of a chance match: log((database size - target space) / step).
pub fn filter_by_score(
    endpoints: &mut Vec<usize>,
    chains: &Chains,
    index: &InvertedIndex,
    min_score: Option<f64>,
    database_size: f64,
    step: usize,
) {
    let step = step as f64;
    endpoints.retain(|&j| {
        let node = chains.node(j);
        let threshold = match min_score {
            Some(min) => min,
            None => ((database_size - index.matchable(node.seed.target) as f64) / step).ln(),
        };
        node.score >= threshold
    });
}
