/// Background match scores and distance cost tables
///
/// A k-mer id is read as a base-`alphabet_size` number whose least
/// significant digit is the first letter. The score of an exact match is the
/// summed -log frequency of its letters; the extension score only sums the
/// `step` most significant digits, the letters a seed gains per extension.
use crate::error::SearchError;

#[derive(Debug, Clone)]
pub struct ScoreModel {
    word_size: usize,
    step: usize,
    scores: Vec<f64>,
    add_scores: Vec<f64>,
    sep_cost: Vec<f64>,
    gap_cost: Vec<f64>,
}

/// Number of distinct k-mers, or None if it does not fit in memory indices
pub fn num_kmers(alphabet_size: usize, word_size: usize) -> Option<usize> {
    let exp = u32::try_from(word_size).ok()?;
    alphabet_size.checked_pow(exp)
}

impl ScoreModel {
    /// Build the model from `-log` letter frequencies (one per letter)
    pub fn new(
        word_size: usize,
        step: usize,
        log_freqs: &[f64],
        sep_coef: f64,
        gap_coef: f64,
    ) -> Result<Self, SearchError> {
        if word_size == 0 || step == 0 {
            return Err(SearchError::InvalidParameter(format!(
                "word size and step must be positive, got {word_size} and {step}"
            )));
        }
        let size = log_freqs.len();
        if size == 0 {
            return Err(SearchError::InvalidParameter(
                "letter frequencies must not be empty".to_string(),
            ));
        }
        let total = num_kmers(size, word_size).ok_or_else(|| {
            SearchError::InvalidParameter(format!(
                "{size}^{word_size} k-mers do not fit in memory"
            ))
        })?;

        let mut scores = vec![0.0; total];
        let mut add_scores = vec![0.0; total];
        let extension_from = word_size.saturating_sub(step);
        let mut weight = 1usize;
        for digit_pos in 0..word_size {
            let extends = digit_pos >= extension_from;
            for (id, (score, add)) in scores.iter_mut().zip(add_scores.iter_mut()).enumerate() {
                let letter = (id / weight) % size;
                *score += log_freqs[letter];
                if extends {
                    *add += log_freqs[letter];
                }
            }
            // Overflow is impossible: weight never exceeds total
            weight = weight.saturating_mul(size);
        }

        // At least one chance match is expected within this distance
        let max_sep = (total as f64).sqrt() as usize;
        let roots: Vec<f64> = (0..=max_sep).map(|d| (d as f64).sqrt()).collect();
        let sep_cost = roots.iter().map(|r| sep_coef * r).collect();
        let gap_cost = roots.iter().map(|r| gap_coef * r).collect();

        Ok(Self {
            word_size,
            step,
            scores,
            add_scores,
            sep_cost,
            gap_cost,
        })
    }

    pub fn word_size(&self) -> usize {
        self.word_size
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn num_kmers(&self) -> usize {
        self.scores.len()
    }

    pub fn max_sep(&self) -> usize {
        self.sep_cost.len() - 1
    }

    /// Score of an exact match to `kmer`
    #[inline]
    pub fn score(&self, kmer: u32) -> f64 {
        self.scores[kmer as usize]
    }

    /// Score gained when a seed is extended by one step onto `kmer`
    #[inline]
    pub fn add_score(&self, kmer: u32) -> f64 {
        self.add_scores[kmer as usize]
    }

    #[inline]
    pub fn sep_cost(&self, distance: usize) -> f64 {
        self.sep_cost[distance]
    }

    #[inline]
    pub fn gap_cost(&self, distance: usize) -> f64 {
        self.gap_cost[distance]
    }
}
