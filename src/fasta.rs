/// Minimal FASTA reading for the command line tool
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub name: String,
    pub sequence: Vec<u8>,
}

/// Read every record of a FASTA file, gzip-compressed if it ends in `.gz`
pub fn read_fasta(path: &Path) -> Result<Vec<FastaRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open FASTA: {}", path.display()))?;
    let is_gz = path
        .extension()
        .is_some_and(|ext| ext == "gz" || ext == "bgz");
    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    parse_fasta(reader).with_context(|| format!("Failed to parse FASTA: {}", path.display()))
}

pub fn parse_fasta<R: BufRead>(reader: R) -> Result<Vec<FastaRecord>> {
    let mut records: Vec<FastaRecord> = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if let Some(header) = trimmed.strip_prefix('>') {
            let name = header.split_whitespace().next().unwrap_or("").to_string();
            records.push(FastaRecord {
                name,
                sequence: Vec::new(),
            });
        } else if !trimmed.is_empty() {
            match records.last_mut() {
                Some(record) => record.sequence.extend_from_slice(trimmed.as_bytes()),
                None => bail!("sequence data before first header on line {}", line_no + 1),
            }
        }
    }
    Ok(records)
}
