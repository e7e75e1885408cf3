//! Inverted k-mer index
//!
//! Occurrences are stored CSR-style: `offsets[kmer]..offsets[kmer + 1]` is the
//! block of `(target, position)` pairs for one k-mer. The search core only
//! reads an index; `IndexBuilder` is the two-pass maintenance path that counts
//! k-mers over a corpus and then records their occurrences.

use std::time::Duration;

use crate::error::SearchError;
use crate::progress::{Interrupt, ProgressSink};

#[derive(Debug, Clone)]
pub struct InvertedIndex {
    counts: Vec<u32>,
    offsets: Vec<usize>,
    targets: Vec<u32>,
    positions: Vec<u32>,
    matchable: Vec<u32>,
}

/// Cumulative start of each k-mer's occurrence block, plus the total at the end
pub fn occurrence_offsets(counts: &[u32]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(counts.len() + 1);
    let mut running = 0usize;
    offsets.push(running);
    for &count in counts {
        running += count as usize;
        offsets.push(running);
    }
    offsets
}

impl InvertedIndex {
    /// Wrap externally built index arrays, checking their size invariants
    ///
    /// `targets` and `positions` hold one entry per occurrence, grouped by
    /// k-mer id in the order given by `counts`. `matchable` holds the number
    /// of matchable positions of each target.
    pub fn new(
        counts: Vec<u32>,
        targets: Vec<u32>,
        positions: Vec<u32>,
        matchable: Vec<u32>,
    ) -> Result<Self, SearchError> {
        if counts.is_empty() {
            return Err(SearchError::InvalidIndex(
                "index must cover at least one k-mer".to_string(),
            ));
        }
        let offsets = occurrence_offsets(&counts);
        let total = offsets[counts.len()];
        if targets.len() != total || positions.len() != total {
            return Err(SearchError::InvalidIndex(format!(
                "counts sum to {total} occurrences but {} targets and {} positions were given",
                targets.len(),
                positions.len()
            )));
        }
        if let Some(&bad) = targets.iter().find(|&&t| t as usize >= matchable.len()) {
            return Err(SearchError::InvalidIndex(format!(
                "target id {bad} has no matchable position count ({} targets)",
                matchable.len()
            )));
        }
        Ok(Self {
            counts,
            offsets,
            targets,
            positions,
            matchable,
        })
    }

    pub fn num_kmers(&self) -> usize {
        self.counts.len()
    }

    pub fn num_targets(&self) -> usize {
        self.matchable.len()
    }

    pub fn num_occurrences(&self) -> usize {
        self.targets.len()
    }

    #[inline]
    pub fn count(&self, kmer: u32) -> u32 {
        self.counts[kmer as usize]
    }

    /// Target ids and positions of every occurrence of `kmer`
    #[inline]
    pub fn occurrences(&self, kmer: u32) -> (&[u32], &[u32]) {
        let range = self.offsets[kmer as usize]..self.offsets[kmer as usize + 1];
        (&self.targets[range.clone()], &self.positions[range])
    }

    #[inline]
    pub fn matchable(&self, target: u32) -> u32 {
        self.matchable[target as usize]
    }

    /// Sum of matchable positions over all targets
    pub fn total_matchable(&self) -> f64 {
        self.matchable.iter().map(|&m| m as f64).sum()
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }
}

/// Two-pass index construction: count every corpus, then record every corpus
///
/// Sequences must be recorded in the order they should be numbered; target
/// ids are assigned from a running counter.
#[derive(Debug)]
pub struct IndexBuilder {
    word_size: usize,
    step: usize,
    counts: Vec<u32>,
    /// Next free slot per k-mer, present once recording has started
    cursor: Option<Vec<usize>>,
    targets: Vec<u32>,
    positions: Vec<u32>,
    matchable: Vec<u32>,
    poll_interval: Duration,
}

impl IndexBuilder {
    pub fn new(num_kmers: usize, word_size: usize, step: usize) -> Result<Self, SearchError> {
        if num_kmers == 0 || word_size == 0 || step == 0 {
            return Err(SearchError::InvalidParameter(format!(
                "index needs positive k-mer count, word size and step, got {num_kmers}, {word_size}, {step}"
            )));
        }
        Ok(Self {
            word_size,
            step,
            counts: vec![0; num_kmers],
            cursor: None,
            targets: Vec::new(),
            positions: Vec::new(),
            matchable: Vec::new(),
            poll_interval: Duration::from_secs(1),
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    fn check_kmer(&self, sequence: usize, position: usize, kmer: u32) -> Result<(), SearchError> {
        if kmer as usize >= self.counts.len() {
            return Err(SearchError::InvalidKmer {
                sequence,
                position,
                kmer,
                num_kmers: self.counts.len(),
            });
        }
        Ok(())
    }

    /// Tally the k-mers sampled every `step` positions of each sequence
    pub fn count_kmers<Q, S>(&mut self, sequences: &[Q], sink: &mut S) -> Result<(), SearchError>
    where
        Q: AsRef<[Option<u32>]>,
        S: ProgressSink + ?Sized,
    {
        if self.cursor.is_some() {
            return Err(SearchError::InvalidIndex(
                "cannot count k-mers after recording has started".to_string(),
            ));
        }
        let mut interrupt = Interrupt::new(sink, self.poll_interval);
        for (i, seq) in sequences.iter().enumerate() {
            for (j, kmer) in seq.as_ref().iter().enumerate().step_by(self.step) {
                let Some(kmer) = *kmer else { continue };
                self.check_kmer(i, j, kmer)?;
                let count = &mut self.counts[kmer as usize];
                *count = count
                    .checked_add(1)
                    .ok_or(SearchError::CountOverflow { kmer })?;
            }
            interrupt.check()?;
        }
        Ok(())
    }

    /// Record the occurrences of every sampled k-mer, numbering targets in order
    pub fn record_kmers<Q, S>(&mut self, sequences: &[Q], sink: &mut S) -> Result<(), SearchError>
    where
        Q: AsRef<[Option<u32>]>,
        S: ProgressSink + ?Sized,
    {
        if self.cursor.is_none() {
            let offsets = occurrence_offsets(&self.counts);
            let total = offsets[self.counts.len()];
            log::debug!(
                "allocating {} occurrences for {} k-mers",
                total,
                self.counts.len()
            );
            self.targets = vec![0; total];
            self.positions = vec![0; total];
            let mut starts = offsets;
            starts.pop();
            self.cursor = Some(starts);
        }
        let Some(cursor) = self.cursor.as_mut() else {
            return Err(SearchError::InvalidIndex("recording cursor missing".to_string()));
        };
        let offsets_end = occurrence_offsets(&self.counts);

        let word_size = self.word_size as u32;
        let step = self.step;
        let mut interrupt = Interrupt::new(sink, self.poll_interval);
        for (i, seq) in sequences.iter().enumerate() {
            let kmers = seq.as_ref();
            let target = u32::try_from(self.matchable.len()).map_err(|_| {
                SearchError::InvalidIndex("too many target sequences".to_string())
            })?;

            // Claim every sampled slot before writing; a rejected sequence
            // releases its claims
            let mut claimed: Vec<(u32, usize, usize)> = Vec::new();
            let mut failure = None;
            for (j, kmer) in kmers.iter().enumerate().step_by(step) {
                let Some(kmer) = *kmer else { continue };
                if kmer as usize >= cursor.len() {
                    failure = Some(SearchError::InvalidKmer {
                        sequence: i,
                        position: j,
                        kmer,
                        num_kmers: cursor.len(),
                    });
                    break;
                }
                let slot = cursor[kmer as usize];
                if slot >= offsets_end[kmer as usize + 1] {
                    failure = Some(SearchError::InvalidIndex(format!(
                        "k-mer {kmer} of target {target} was not counted before recording"
                    )));
                    break;
                }
                cursor[kmer as usize] += 1;
                claimed.push((kmer, slot, j));
            }
            if let Some(err) = failure {
                for &(kmer, _, _) in &claimed {
                    cursor[kmer as usize] -= 1;
                }
                return Err(err);
            }

            // Matchable positions over every k-mer: one exactly a step after
            // the previous unmasked k-mer adds `step` letters, any other adds
            // a full word
            let mut matchable = 0u32;
            let mut last: Option<usize> = None;
            for (j, kmer) in kmers.iter().enumerate() {
                if kmer.is_some() {
                    matchable += match last {
                        Some(prev) if prev + step == j => step as u32,
                        _ => word_size,
                    };
                    last = Some(j);
                }
            }
            self.matchable.push(matchable);

            for (_, slot, j) in claimed {
                self.targets[slot] = target;
                self.positions[slot] = j as u32;
            }
            interrupt.check()?;
        }
        Ok(())
    }

    /// Finish construction; every counted occurrence must have been recorded
    pub fn finish(self) -> Result<InvertedIndex, SearchError> {
        let offsets = occurrence_offsets(&self.counts);
        if let Some(cursor) = &self.cursor {
            if let Some(kmer) = (0..self.counts.len()).find(|&k| cursor[k] != offsets[k + 1]) {
                return Err(SearchError::InvalidIndex(format!(
                    "k-mer {kmer} was counted {} times but recorded {} times",
                    self.counts[kmer],
                    cursor[kmer] - offsets[kmer]
                )));
            }
        } else if offsets[self.counts.len()] > 0 {
            return Err(SearchError::InvalidIndex(
                "k-mers were counted but never recorded".to_string(),
            ));
        }
        InvertedIndex::new(self.counts, self.targets, self.positions, self.matchable)
    }
}
