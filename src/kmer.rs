//! Nucleotide k-mer tokenization
//!
//! Turns DNA into the k-mer id sequences the index and search consume. The
//! first letter of a k-mer is its least significant base-4 digit, so sliding
//! one letter right divides by four and adds the new letter at the top.
//! Any k-mer overlapping a non-ACGT letter is masked.

use crate::error::SearchError;

pub const DNA_ALPHABET: usize = 4;

/// Largest word size whose ids fit in a `u32`
pub const MAX_WORD_SIZE: usize = 15;

#[inline]
fn base_code(b: u8) -> Option<u32> {
    match b.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KmerEncoder {
    k: usize,
    top: u32,
}

impl KmerEncoder {
    pub fn new(k: usize) -> Result<Self, SearchError> {
        if k == 0 || k > MAX_WORD_SIZE {
            return Err(SearchError::InvalidParameter(format!(
                "word size must be between 1 and {MAX_WORD_SIZE}, got {k}"
            )));
        }
        Ok(Self {
            k,
            top: 4u32.pow(k as u32 - 1),
        })
    }

    pub fn word_size(&self) -> usize {
        self.k
    }

    pub fn num_kmers(&self) -> usize {
        DNA_ALPHABET.pow(self.k as u32)
    }

    /// One id per k-mer start position, `None` where masked
    pub fn encode(&self, sequence: &[u8]) -> Vec<Option<u32>> {
        if sequence.len() < self.k {
            return Vec::new();
        }
        let mut kmers = Vec::with_capacity(sequence.len() - self.k + 1);
        let mut id = 0u32;
        // Letters since the last non-ACGT letter
        let mut valid_run = 0usize;
        for (i, &b) in sequence.iter().enumerate() {
            match base_code(b) {
                Some(code) => {
                    id = id / 4 + code * self.top;
                    valid_run += 1;
                }
                None => {
                    id = 0;
                    valid_run = 0;
                }
            }
            if i + 1 >= self.k {
                kmers.push((valid_run >= self.k).then_some(id));
            }
        }
        kmers
    }
}

/// `-ln` letter frequencies of A, C, G, T over `sequences`, with one pseudocount each
pub fn background_log_frequencies<S: AsRef<[u8]>>(sequences: &[S]) -> [f64; DNA_ALPHABET] {
    let mut counts = [1u64; DNA_ALPHABET];
    for seq in sequences {
        for &b in seq.as_ref() {
            if let Some(code) = base_code(b) {
                counts[code as usize] += 1;
            }
        }
    }
    let total: u64 = counts.iter().sum();
    counts.map(|c| -((c as f64) / (total as f64)).ln())
}
