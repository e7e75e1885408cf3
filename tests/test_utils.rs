#![allow(dead_code)]
/// Utility functions for testing
use std::fs;
use std::path::Path;

use kmersearch::kmer::{background_log_frequencies, KmerEncoder};
use kmersearch::{IndexBuilder, InvertedIndex, NoProgress};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate a random DNA sequence of given length
pub fn generate_dna_sequence(rng: &mut StdRng, length: usize) -> Vec<u8> {
    let bases = [b'A', b'C', b'G', b'T'];
    (0..length).map(|_| bases[rng.gen_range(0..4)]).collect()
}

/// Copy `seq` with roughly one substitution every `spacing` letters
pub fn mutate(rng: &mut StdRng, seq: &[u8], spacing: usize) -> Vec<u8> {
    let bases = [b'A', b'C', b'G', b'T'];
    seq.iter()
        .map(|&b| {
            if rng.gen_range(0..spacing) == 0 {
                let other = bases.iter().copied().filter(|&o| o != b).collect::<Vec<_>>();
                other[rng.gen_range(0..3)]
            } else {
                b
            }
        })
        .collect()
}

/// Generate a FASTA file with specified sequences
pub fn create_fasta_file(path: &Path, sequences: &[(&str, &str)]) {
    let mut content = String::new();
    for (name, seq) in sequences {
        content.push_str(&format!(">{name}\n{seq}\n"));
    }
    fs::write(path, content).expect("Failed to write FASTA file");
}

pub fn encode_all(encoder: &KmerEncoder, sequences: &[Vec<u8>]) -> Vec<Vec<Option<u32>>> {
    sequences.iter().map(|s| encoder.encode(s)).collect()
}

/// Index DNA targets and return the index with background log frequencies
pub fn build_dna_index(targets: &[Vec<u8>], word_size: usize, step: usize) -> (InvertedIndex, [f64; 4]) {
    let encoder = KmerEncoder::new(word_size).expect("valid word size");
    let kmers = encode_all(&encoder, targets);
    let mut builder = IndexBuilder::new(encoder.num_kmers(), word_size, step).expect("valid builder");
    builder.count_kmers(&kmers, &mut NoProgress).expect("count");
    builder.record_kmers(&kmers, &mut NoProgress).expect("record");
    let index = builder.finish().expect("complete index");
    (index, background_log_frequencies(targets))
}

/// Random targets plus queries that are mutated slices of those targets,
/// followed by one unrelated random query
pub fn random_workload(
    seed: u64,
    num_targets: usize,
    target_len: usize,
) -> (Vec<Vec<u8>>, Vec<Vec<u8>>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let targets: Vec<Vec<u8>> = (0..num_targets)
        .map(|_| generate_dna_sequence(&mut rng, target_len))
        .collect();
    let mut queries = Vec::new();
    for target in &targets {
        let start = rng.gen_range(0..target_len / 2);
        let len = rng.gen_range(target_len / 4..target_len / 2);
        queries.push(mutate(&mut rng, &target[start..start + len], 12));
    }
    queries.push(generate_dna_sequence(&mut rng, target_len / 3));
    (targets, queries)
}
