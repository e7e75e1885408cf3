use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use kmersearch::fasta::{read_fasta, FastaRecord};
use kmersearch::kmer::{background_log_frequencies, KmerEncoder};
use kmersearch::{
    IndexBuilder, LogProgress, NoProgress, ProgressSink, ReportMode, SearchConfig, SearchHit,
    Searcher,
};

/// kmersearch - search sequences against an inverted k-mer index
///
/// Indexes the target FASTA, then reports targets sharing significant
/// co-linear k-mer chains with each query as TSV
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Target FASTA (plain or gzip)
    #[clap(value_name = "TARGETS")]
    targets: PathBuf,

    /// Query FASTA (plain or gzip)
    #[clap(value_name = "QUERIES")]
    queries: PathBuf,

    /// K-mer length
    #[clap(short = 'k', long = "word-size", default_value = "8")]
    word_size: usize,

    /// Spacing between indexed target k-mers
    #[clap(short = 's', long = "step", default_value = "1")]
    step: usize,

    /// Hits to report per query: all, target (best per target), or top
    #[clap(short = 'm', long = "mode", value_enum, default_value = "target")]
    mode: ReportMode,

    /// Minimum corrected score (derived from the database size if unset)
    #[clap(long = "min-score", allow_hyphen_values = true)]
    min_score: Option<f64>,

    /// Cost coefficient for the separation between chained seeds
    #[clap(long = "sep-cost", default_value = "-0.01", allow_hyphen_values = true)]
    sep_cost: f64,

    /// Cost coefficient for the gap between chained seeds
    #[clap(long = "gap-cost", default_value = "-0.1", allow_hyphen_values = true)]
    gap_cost: f64,

    /// Report the anchor chain of every hit
    #[clap(long = "anchors")]
    anchors: bool,

    /// Number of threads for parallel processing
    #[clap(short = 't', long = "threads")]
    threads: Option<usize>,

    /// Output TSV file (stdout if not specified)
    #[clap(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Quiet mode (no progress output)
    #[clap(long = "quiet")]
    quiet: bool,
}

fn encode_all(encoder: &KmerEncoder, records: &[FastaRecord]) -> Vec<Vec<Option<u32>>> {
    records.iter().map(|r| encoder.encode(&r.sequence)).collect()
}

/// Anchors as 1-based inclusive `qs-qe:ts-te` pairs
fn format_anchors(hit: &SearchHit) -> Option<String> {
    hit.anchors.as_ref().map(|anchors| {
        anchors
            .iter()
            .map(|a| {
                format!(
                    "{}-{}:{}-{}",
                    a.query_start + 1,
                    a.query_end + 1,
                    a.target_start + 1,
                    a.target_end + 1
                )
            })
            .collect::<Vec<_>>()
            .join(",")
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let encoder = KmerEncoder::new(args.word_size)?;
    let config = SearchConfig {
        word_size: args.word_size,
        step: args.step,
        sep_cost: args.sep_cost,
        gap_cost: args.gap_cost,
        mode: args.mode,
        min_score: args.min_score,
        anchors: args.anchors,
        threads: args.threads,
        ..Default::default()
    };
    config.validate()?;

    let mut sink: Box<dyn ProgressSink> = if args.quiet {
        Box::new(NoProgress)
    } else {
        Box::new(LogProgress::new("search"))
    };

    let targets = read_fasta(&args.targets)?;
    if targets.is_empty() {
        anyhow::bail!("No sequences found in {}", args.targets.display());
    }
    log::info!("indexing {} target sequences", targets.len());
    let target_kmers = encode_all(&encoder, &targets);
    let mut builder = IndexBuilder::new(encoder.num_kmers(), args.word_size, args.step)?;
    builder.count_kmers(&target_kmers, sink.as_mut())?;
    builder.record_kmers(&target_kmers, sink.as_mut())?;
    let index = builder.finish()?;
    drop(target_kmers);
    log::info!(
        "indexed {} k-mer occurrences over {} matchable positions",
        index.num_occurrences(),
        index.total_matchable()
    );

    let sequences: Vec<&[u8]> = targets.iter().map(|r| r.sequence.as_slice()).collect();
    let log_freqs = background_log_frequencies(&sequences);

    let queries = read_fasta(&args.queries)?;
    let query_kmers = encode_all(&encoder, &queries);

    let searcher = Searcher::new(&index, &log_freqs, config)?;
    let results = searcher
        .search(&query_kmers, sink.as_mut())
        .inspect_err(|err| {
            if err.is_fatal_abort() {
                log::error!("search aborted, no results written: {err}");
            }
        })?;

    let mut output: Box<dyn Write> = if let Some(ref path) = args.output {
        Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output: {}", path.display())
        })?))
    } else {
        Box::new(BufWriter::new(io::stdout().lock()))
    };

    for hit in &results.hits {
        let query_name = &queries[hit.query].name;
        let target_name = &targets[hit.target as usize].name;
        match format_anchors(hit) {
            Some(anchors) => writeln!(
                output,
                "{}\t{}\t{:.4}\t{}",
                query_name, target_name, hit.score, anchors
            )?,
            None => writeln!(output, "{}\t{}\t{:.4}", query_name, target_name, hit.score)?,
        }
    }
    output.flush()?;

    Ok(())
}
