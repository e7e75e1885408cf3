// Library exports for kmersearch
pub mod anchor;
pub mod chain;
pub mod collapse;
pub mod config;
pub mod error;
pub mod fasta;
pub mod hits;
pub mod index;
pub mod kmer;
pub mod progress;
pub mod score_model;
pub mod search;
pub mod select;
pub mod sort;

pub use anchor::Anchor;
pub use config::{ReportMode, SearchConfig};
pub use error::SearchError;
pub use index::{IndexBuilder, InvertedIndex};
pub use progress::{LogProgress, NoProgress, ProgressSink};
pub use search::{search_index, SearchHit, SearchResults, Searcher};
