/// Run-wide search configuration
///
/// Mirrors how the CLI arguments are turned into a single config value before
/// any work starts; everything here is read-only for the duration of a run.
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::SearchError;

/// Which chain endpoints are reported for each query
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportMode {
    /// Every chain that is the best extension of its origin seed
    All,
    /// The best chain per target sequence
    #[value(alias = "per-target")]
    Target,
    /// The single best chain across all targets
    Top,
}

impl FromStr for ReportMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "1" => Ok(ReportMode::All),
            "target" | "per-target" | "2" => Ok(ReportMode::Target),
            "top" | "3" => Ok(ReportMode::Top),
            _ => Err(SearchError::InvalidParameter(format!(
                "unknown report mode '{s}'. Use all, target, or top"
            ))),
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportMode::All => "all",
            ReportMode::Target => "target",
            ReportMode::Top => "top",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// K-mer length
    pub word_size: usize,
    /// Spacing between sampled target k-mers, also the seed extension unit
    pub step: usize,
    /// Coefficient of sqrt(distance) for the separation between seeds
    pub sep_cost: f64,
    /// Coefficient of sqrt(distance) for the gap between seeds
    pub gap_cost: f64,
    pub mode: ReportMode,
    /// Total matchable positions in the database; `None` uses the index total
    pub database_size: Option<f64>,
    /// Explicit minimum corrected score; `None` derives one per target
    pub min_score: Option<f64>,
    /// Reconstruct anchor chains for every reported hit
    pub anchors: bool,
    /// Worker threads; `None` uses the global rayon pool
    pub threads: Option<usize>,
    /// How often the coordinating thread polls for cancellation
    pub poll_interval: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            word_size: 8,
            step: 1,
            sep_cost: -0.01,
            gap_cost: -0.1,
            mode: ReportMode::Target,
            database_size: None,
            min_score: None,
            anchors: false,
            threads: None,
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.word_size == 0 {
            return Err(SearchError::InvalidParameter(
                "word size must be at least 1".to_string(),
            ));
        }
        if self.step == 0 {
            return Err(SearchError::InvalidParameter(
                "step must be at least 1".to_string(),
            ));
        }
        if !self.sep_cost.is_finite() || !self.gap_cost.is_finite() {
            return Err(SearchError::InvalidParameter(format!(
                "separation and gap costs must be finite, got {} and {}",
                self.sep_cost, self.gap_cost
            )));
        }
        if self.threads == Some(0) {
            return Err(SearchError::InvalidParameter(
                "thread count must be at least 1".to_string(),
            ));
        }
        if let Some(size) = self.database_size {
            if !(size > 0.0) {
                return Err(SearchError::InvalidParameter(format!(
                    "database size must be positive, got {size}"
                )));
            }
        }
        if let Some(min) = self.min_score {
            if min.is_nan() {
                return Err(SearchError::InvalidParameter(
                    "minimum score must be a number".to_string(),
                ));
            }
        }
        Ok(())
    }
}
