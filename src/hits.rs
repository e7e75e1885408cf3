/// Expansion of query k-mers into raw index hits
use crate::error::SearchError;
use crate::index::InvertedIndex;
use crate::score_model::ScoreModel;

/// One query k-mer matching one target occurrence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub query_pos: u32,
    pub target_pos: u32,
    pub target: u32,
    pub score: f64,
    /// Score gained if this hit extends a seed by one step
    pub add_score: f64,
}

/// Raw hits of one query, grouped by query position
///
/// `group_ends[j]` is the exclusive end of query position `j`'s block in
/// `hits`; masked positions contribute empty blocks.
#[derive(Debug, Default)]
pub struct CollectedHits {
    pub hits: Vec<Hit>,
    pub group_ends: Vec<usize>,
    /// Matchable query positions
    pub width: u32,
}

impl CollectedHits {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Number of matchable query positions
///
/// Adjacent unmasked k-mers overlap by all but one letter; an unmasked k-mer
/// after a masked run starts a fresh word.
pub fn query_width(kmers: &[Option<u32>], word_size: usize) -> u32 {
    let mut width = 0u32;
    let mut last: Option<usize> = None;
    for (j, kmer) in kmers.iter().enumerate() {
        if kmer.is_some() {
            width += match last {
                Some(prev) if prev + 1 == j => 1,
                _ => word_size as u32,
            };
            last = Some(j);
        }
    }
    width
}

/// Sum of index occurrences over the unmasked query k-mers, as an `i32`
pub fn total_hits<F>(query: usize, kmers: &[Option<u32>], count: F) -> Result<i32, SearchError>
where
    F: Fn(u32) -> u32,
{
    let mut total: i32 = 0;
    for &kmer in kmers.iter().flatten() {
        let n = i32::try_from(count(kmer)).map_err(|_| SearchError::HitOverflow { query })?;
        total = total
            .checked_add(n)
            .ok_or(SearchError::HitOverflow { query })?;
    }
    Ok(total)
}

/// Collect every index occurrence of every unmasked query k-mer
///
/// Fails when the total number of hits overflows an `i32`; this is fatal for
/// the whole run. A query with no width or no hits yields an empty result.
pub fn collect_hits(
    query: usize,
    kmers: &[Option<u32>],
    index: &InvertedIndex,
    model: &ScoreModel,
) -> Result<CollectedHits, SearchError> {
    let width = query_width(kmers, model.word_size());
    let total = total_hits(query, kmers, |kmer| index.count(kmer))?;
    if width == 0 || total == 0 {
        return Ok(CollectedHits::default());
    }

    let mut hits = Vec::with_capacity(total as usize);
    let mut group_ends = Vec::with_capacity(kmers.len());
    for (j, kmer) in kmers.iter().enumerate() {
        if let Some(kmer) = *kmer {
            let (targets, positions) = index.occurrences(kmer);
            let score = model.score(kmer);
            let add_score = model.add_score(kmer);
            hits.extend(targets.iter().zip(positions).map(|(&target, &target_pos)| Hit {
                query_pos: j as u32,
                target_pos,
                target,
                score,
                add_score,
            }));
        }
        group_ends.push(hits.len());
    }

    Ok(CollectedHits {
        hits,
        group_ends,
        width,
    })
}
