/// Error type shared by index construction and search
///
/// Overflow and cancellation abort a whole run; every other variant is a
/// precondition failure detected before any query is processed.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The running hit count for one query no longer fits in an `i32`
    #[error("too many target k-mer hits for query {query}")]
    HitOverflow { query: usize },

    /// The host asked the run to stop
    #[error("received user interrupt")]
    Cancelled,

    #[error("invalid search parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid inverted index: {0}")]
    InvalidIndex(String),

    /// A k-mer id outside the index's k-mer space
    #[error("k-mer id {kmer} at position {position} of sequence {sequence} is out of range (index holds {num_kmers} k-mers)")]
    InvalidKmer {
        sequence: usize,
        position: usize,
        kmer: u32,
        num_kmers: usize,
    },

    #[error("occurrence count of k-mer {kmer} overflows")]
    CountOverflow { kmer: u32 },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SearchError {
    /// True for the two kinds that terminate an in-flight run
    pub fn is_fatal_abort(&self) -> bool {
        matches!(self, SearchError::HitOverflow { .. } | SearchError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_distinguish_abort_kinds() {
        let overflow = SearchError::HitOverflow { query: 3 };
        let cancelled = SearchError::Cancelled;
        assert!(overflow.to_string().contains("query 3"));
        assert!(cancelled.to_string().contains("interrupt"));
        assert!(overflow.is_fatal_abort());
        assert!(cancelled.is_fatal_abort());
        assert!(!SearchError::InvalidParameter("step".into()).is_fatal_abort());
    }
}
