/// Performance benchmarks for index construction and search
///
/// Run with: cargo bench
///
/// These benchmarks track performance over time to detect regressions.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kmersearch::kmer::{background_log_frequencies, KmerEncoder};
use kmersearch::{IndexBuilder, InvertedIndex, NoProgress, ReportMode, SearchConfig, Searcher};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const WORD_SIZE: usize = 8;

fn random_dna(rng: &mut StdRng, length: usize) -> Vec<u8> {
    let bases = [b'A', b'C', b'G', b'T'];
    (0..length).map(|_| bases[rng.gen_range(0..4)]).collect()
}

/// Synthetic targets and queries sliced from them with sparse substitutions
fn generate_workload(num_targets: usize, num_queries: usize) -> (Vec<Vec<u8>>, Vec<Vec<u8>>) {
    let mut rng = StdRng::seed_from_u64(17);
    let targets: Vec<Vec<u8>> = (0..num_targets).map(|_| random_dna(&mut rng, 5_000)).collect();
    let queries = (0..num_queries)
        .map(|i| {
            let target = &targets[i % num_targets];
            let start = rng.gen_range(0..4_000);
            target[start..start + 800]
                .iter()
                .map(|&b| if rng.gen_range(0..25) == 0 { b'A' } else { b })
                .collect()
        })
        .collect();
    (targets, queries)
}

fn build_index(encoder: &KmerEncoder, targets: &[Vec<u8>], step: usize) -> InvertedIndex {
    let kmers: Vec<Vec<Option<u32>>> = targets.iter().map(|t| encoder.encode(t)).collect();
    let mut builder = IndexBuilder::new(encoder.num_kmers(), WORD_SIZE, step).unwrap();
    builder.count_kmers(&kmers, &mut NoProgress).unwrap();
    builder.record_kmers(&kmers, &mut NoProgress).unwrap();
    builder.finish().unwrap()
}

/// Benchmark: building the inverted index
fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    let encoder = KmerEncoder::new(WORD_SIZE).unwrap();

    for num_targets in [10, 100].iter() {
        let (targets, _) = generate_workload(*num_targets, 1);
        group.throughput(Throughput::Bytes((num_targets * 5_000) as u64));
        group.sample_size(10);
        group.bench_with_input(BenchmarkId::from_parameter(num_targets), &targets, |b, targets| {
            b.iter(|| black_box(build_index(&encoder, targets, 1)));
        });
    }

    group.finish();
}

/// Benchmark: searching queries under each reporting mode
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let encoder = KmerEncoder::new(WORD_SIZE).unwrap();
    let (targets, queries) = generate_workload(100, 200);
    let index = build_index(&encoder, &targets, 1);
    let freqs = background_log_frequencies(&targets);
    let queries: Vec<Vec<Option<u32>>> = queries.iter().map(|q| encoder.encode(q)).collect();

    group.sample_size(10);
    let single = Searcher::new(
        &index,
        &freqs,
        SearchConfig {
            word_size: WORD_SIZE,
            ..Default::default()
        },
    )
    .unwrap();
    group.bench_function("single_query", |b| {
        b.iter(|| black_box(single.search_query(0, &queries[0]).unwrap()));
    });

    group.throughput(Throughput::Elements(queries.len() as u64));
    for mode in [ReportMode::All, ReportMode::Target, ReportMode::Top] {
        let config = SearchConfig {
            word_size: WORD_SIZE,
            mode,
            anchors: true,
            ..Default::default()
        };
        let searcher = Searcher::new(&index, &freqs, config).unwrap();
        group.bench_function(BenchmarkId::from_parameter(mode), |b| {
            b.iter(|| black_box(searcher.search(&queries, &mut NoProgress).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark: a sampled index trades sensitivity for size
fn bench_sampled_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampled_search");
    let encoder = KmerEncoder::new(WORD_SIZE).unwrap();
    let (targets, queries) = generate_workload(100, 200);
    let freqs = background_log_frequencies(&targets);
    let queries: Vec<Vec<Option<u32>>> = queries.iter().map(|q| encoder.encode(q)).collect();

    group.sample_size(10);
    for step in [1usize, 2, 4].iter() {
        let index = build_index(&encoder, &targets, *step);
        let config = SearchConfig {
            word_size: WORD_SIZE,
            step: *step,
            ..Default::default()
        };
        let searcher = Searcher::new(&index, &freqs, config).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(step), &queries, |b, queries| {
            b.iter(|| black_box(searcher.search(queries, &mut NoProgress).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_index_build, bench_search, bench_sampled_search);
criterion_main!(benches);
