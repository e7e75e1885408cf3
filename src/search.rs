//! Per-query search pipeline and the parallel driver
//!
//! Each query runs collect -> sort -> collapse -> chain -> correct -> select
//! on its own scratch buffers. Queries are spread over a rayon pool while the
//! calling thread acts as coordinator: it alone talks to the progress sink,
//! on a wall-clock interval. Workers only share the read-only index and score
//! model, an atomic abort word and an atomic completion counter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Mutex;
use std::thread;
use std::time::Instant;

use rayon::prelude::*;

use crate::anchor::{chain_anchors, Anchor};
use crate::chain::Chains;
use crate::collapse::collapse_hits;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::hits::collect_hits;
use crate::index::InvertedIndex;
use crate::progress::ProgressSink;
use crate::score_model::ScoreModel;
use crate::select::{correct_scores, filter_by_score, select_endpoints};
use crate::sort::sort_hits;

/// One reported chain
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub query: usize,
    pub target: u32,
    pub score: f64,
    /// Present when anchors were requested
    pub anchors: Option<Vec<Anchor>>,
}

/// All hits of a run, ordered by query index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn for_query(&self, query: usize) -> impl Iterator<Item = &SearchHit> {
        self.hits.iter().filter(move |h| h.query == query)
    }
}

/// First abort reason wins: 0 while running, `CANCELLED`, `FAILED`, or
/// query index + 1 for an overflow
#[derive(Debug, Default)]
struct AbortSignal {
    state: AtomicUsize,
    failure: Mutex<Option<SearchError>>,
}

impl AbortSignal {
    const RUNNING: usize = 0;
    const CANCELLED: usize = usize::MAX;
    const FAILED: usize = usize::MAX - 1;

    fn set(&self, state: usize) -> bool {
        self.state
            .compare_exchange(Self::RUNNING, state, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn cancel(&self) {
        self.set(Self::CANCELLED);
    }

    fn overflow(&self, query: usize) {
        self.set(query + 1);
    }

    fn fail(&self, err: SearchError) {
        if self.set(Self::FAILED) {
            let mut slot = self.failure.lock().unwrap_or_else(|p| p.into_inner());
            *slot = Some(err);
        }
    }

    fn is_set(&self) -> bool {
        self.state.load(Ordering::Acquire) != Self::RUNNING
    }

    fn into_error(self) -> Option<SearchError> {
        match self.state.into_inner() {
            Self::RUNNING => None,
            Self::CANCELLED => Some(SearchError::Cancelled),
            Self::FAILED => self
                .failure
                .into_inner()
                .unwrap_or_else(|p| p.into_inner()),
            state => Some(SearchError::HitOverflow { query: state - 1 }),
        }
    }
}

#[derive(Debug)]
pub struct Searcher<'a> {
    index: &'a InvertedIndex,
    model: ScoreModel,
    config: SearchConfig,
    database_size: f64,
}

impl<'a> Searcher<'a> {
    /// Prepare a search over `index` with `-log` background letter frequencies
    pub fn new(
        index: &'a InvertedIndex,
        log_freqs: &[f64],
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        let model = ScoreModel::new(
            config.word_size,
            config.step,
            log_freqs,
            config.sep_cost,
            config.gap_cost,
        )?;
        if model.num_kmers() != index.num_kmers() {
            return Err(SearchError::InvalidIndex(format!(
                "index covers {} k-mers but {} letters at word size {} give {}",
                index.num_kmers(),
                log_freqs.len(),
                config.word_size,
                model.num_kmers()
            )));
        }
        let database_size = config
            .database_size
            .unwrap_or_else(|| index.total_matchable());
        log::debug!(
            "search model: {} k-mers, max separation {}, database size {}",
            model.num_kmers(),
            model.max_sep(),
            database_size
        );
        Ok(Self {
            index,
            model,
            config,
            database_size,
        })
    }

    pub fn model(&self) -> &ScoreModel {
        &self.model
    }

    pub fn database_size(&self) -> f64 {
        self.database_size
    }

    fn check_query(&self, query: usize, kmers: &[Option<u32>]) -> Result<(), SearchError> {
        let num_kmers = self.index.num_kmers();
        let out_of_range = kmers.iter().enumerate().find_map(|(j, &kmer)| match kmer {
            Some(k) if k as usize >= num_kmers => Some((j, k)),
            _ => None,
        });
        match out_of_range {
            Some((position, kmer)) => Err(SearchError::InvalidKmer {
                sequence: query,
                position,
                kmer,
                num_kmers,
            }),
            None => Ok(()),
        }
    }

    /// Search a single query on the calling thread
    pub fn search_query(
        &self,
        query: usize,
        kmers: &[Option<u32>],
    ) -> Result<Vec<SearchHit>, SearchError> {
        self.check_query(query, kmers)?;
        self.run_query(query, kmers)
    }

    fn run_query(&self, query: usize, kmers: &[Option<u32>]) -> Result<Vec<SearchHit>, SearchError> {
        let collected = collect_hits(query, kmers, self.index, &self.model)?;
        if collected.is_empty() {
            return Ok(Vec::new());
        }
        let num_hits = collected.hits.len();
        let sorted = sort_hits(collected.hits, &collected.group_ends);
        let seeds = collapse_hits(&sorted, self.model.word_size(), self.model.step());
        drop(sorted);
        let num_seeds = seeds.len();

        let mut chains = Chains::build(seeds, &self.model);
        correct_scores(&mut chains, self.index, collected.width, self.model.step());
        let mut endpoints = select_endpoints(&chains, self.config.mode);
        filter_by_score(
            &mut endpoints,
            &chains,
            self.index,
            self.config.min_score,
            self.database_size,
            self.model.step(),
        );
        log::trace!(
            "query {}: {} hits, {} seeds, {} reported",
            query,
            num_hits,
            num_seeds,
            endpoints.len()
        );

        Ok(endpoints
            .into_iter()
            .map(|end| {
                let node = chains.node(end);
                SearchHit {
                    query,
                    target: node.seed.target,
                    score: node.score,
                    anchors: self.config.anchors.then(|| chain_anchors(&chains, end)),
                }
            })
            .collect())
    }

    /// Search every query in parallel
    ///
    /// Overflow in any query or a cancellation request from `sink` fails the
    /// whole run; partial results are discarded.
    pub fn search<Q, S>(&self, queries: &[Q], sink: &mut S) -> Result<SearchResults, SearchError>
    where
        Q: AsRef<[Option<u32>]> + Sync,
        S: ProgressSink + ?Sized,
    {
        for (i, kmers) in queries.iter().enumerate() {
            self.check_query(i, kmers.as_ref())?;
        }
        let pool = match self.config.threads {
            Some(n) => Some(rayon::ThreadPoolBuilder::new().num_threads(n).build()?),
            None => None,
        };

        let started = Instant::now();
        let total = queries.len();
        let abort = AbortSignal::default();
        let completed = AtomicUsize::new(0);
        log::info!("searching {} queries against {} targets", total, self.index.num_targets());

        let per_query: Vec<Vec<SearchHit>> = thread::scope(|scope| {
            let (done_tx, done_rx) = mpsc::channel::<()>();
            let abort = &abort;
            let completed = &completed;

            let worker = scope.spawn(move || {
                let run = || {
                    queries
                        .par_iter()
                        .enumerate()
                        .map(|(i, kmers)| {
                            if abort.is_set() {
                                return Vec::new();
                            }
                            match self.run_query(i, kmers.as_ref()) {
                                Ok(hits) => {
                                    completed.fetch_add(1, Ordering::Relaxed);
                                    hits
                                }
                                Err(SearchError::HitOverflow { query }) => {
                                    log::warn!("too many target k-mer hits for query {query}");
                                    abort.overflow(query);
                                    Vec::new()
                                }
                                Err(err) => {
                                    log::error!("query {i} failed: {err}");
                                    abort.fail(err);
                                    Vec::new()
                                }
                            }
                        })
                        .collect::<Vec<_>>()
                };
                let results = match &pool {
                    Some(pool) => pool.install(run),
                    None => run(),
                };
                let _ = done_tx.send(());
                results
            });

            while let Err(RecvTimeoutError::Timeout) = done_rx.recv_timeout(self.config.poll_interval)
            {
                if sink.poll_cancel() {
                    log::warn!("cancellation requested, draining in-flight queries");
                    abort.cancel();
                } else if total > 0 {
                    sink.report_progress(completed.load(Ordering::Relaxed) as f64 / total as f64);
                }
            }
            worker
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        });

        // A request made after the last periodic poll still cancels the run
        if !abort.is_set() && sink.poll_cancel() {
            abort.cancel();
        }
        if let Some(err) = abort.into_error() {
            drop(per_query);
            return Err(err);
        }
        sink.report_progress(1.0);

        let hits: Vec<SearchHit> = per_query.into_iter().flatten().collect();
        log::info!(
            "reported {} hits for {} queries in {:.2?}",
            hits.len(),
            total,
            started.elapsed()
        );
        Ok(SearchResults { hits })
    }
}

/// Convenience wrapper: build a `Searcher` and run every query
pub fn search_index<Q, S>(
    queries: &[Q],
    index: &InvertedIndex,
    log_freqs: &[f64],
    config: SearchConfig,
    sink: &mut S,
) -> Result<SearchResults, SearchError>
where
    Q: AsRef<[Option<u32>]> + Sync,
    S: ProgressSink + ?Sized,
{
    Searcher::new(index, log_freqs, config)?.search(queries, sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_first_reason_wins() {
        let abort = AbortSignal::default();
        assert!(!abort.is_set());
        abort.overflow(4);
        abort.cancel();
        abort.fail(SearchError::InvalidParameter("late".into()));
        assert!(abort.is_set());
        assert!(matches!(abort.into_error(), Some(SearchError::HitOverflow { query: 4 })));

        let abort = AbortSignal::default();
        abort.cancel();
        abort.overflow(0);
        assert!(matches!(abort.into_error(), Some(SearchError::Cancelled)));

        assert!(AbortSignal::default().into_error().is_none());
    }

    #[test]
    fn test_abort_keeps_other_failures() {
        let abort = AbortSignal::default();
        abort.fail(SearchError::InvalidIndex("broken".into()));
        abort.overflow(2);
        assert!(matches!(abort.into_error(), Some(SearchError::InvalidIndex(_))));
    }

    #[test]
    fn test_rejects_mismatched_alphabet() {
        let index = InvertedIndex::new(vec![0; 16], vec![], vec![], vec![]).unwrap();
        let config = SearchConfig {
            word_size: 3,
            ..Default::default()
        };
        assert!(matches!(
            Searcher::new(&index, &[1.0; 4], config),
            Err(SearchError::InvalidIndex(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_query() {
        let index = InvertedIndex::new(vec![0; 16], vec![], vec![], vec![]).unwrap();
        let config = SearchConfig {
            word_size: 2,
            ..Default::default()
        };
        let searcher = Searcher::new(&index, &[1.0; 4], config).unwrap();
        let err = searcher.search_query(0, &[Some(3), Some(16)]).unwrap_err();
        assert!(matches!(err, SearchError::InvalidKmer { position: 1, kmer: 16, .. }));
    }
}
