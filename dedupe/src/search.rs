//! The search driver: for a level, finds the single best K-tuple of
//! eligible buckets to deduplicate, sweeping K from the configured
//! maximum down to 2 and preferring the first strictly-better tuple
//! seen (ties go to whichever the enumerator produced first).

use combgen::Combinations;
use refset::RefSetTable;

use crate::config::RunConfig;
use crate::score::ScoreBackend;
use crate::types::Bucket;

/// The winning tuple of one [`find_best_combination`] call, plus the
/// score it was chosen on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub buckets: Vec<usize>,
    pub k: usize,
    pub score: u64,
    pub weighted_score: u64,
}

/// A bucket is eligible for this level's search when it hasn't already
/// been split too many times, still carries enough content to be worth
/// factoring, and belongs to a level the current pass is allowed to
/// draw from.
pub fn eligible_buckets(buckets: &[Bucket], level: u32, cfg: &RunConfig) -> Vec<usize> {
    buckets
        .iter()
        .enumerate()
        .filter(|(_, b)| {
            b.split_count < cfg.max_bucket_splits
                && b.ref_size > cfg.min_bucket_size
                && (cfg.merge_across_levels || b.level == level)
        })
        .map(|(i, _)| i)
        .collect()
}

/// `score * (k - 1)`: wider combinations are worth proportionally more
/// because deduplicating them removes the shared content from more
/// source buckets at once.
fn weight(score: u64, k: usize) -> u64 {
    score * (k as u64 - 1)
}

/// Sweeps combination widths from `cfg.max_k` down to 2 over `eligible`
/// and returns the single best-scoring tuple found, or `None` if every
/// combination at every width scored zero.
///
/// A later K only replaces the running winner on a strict improvement
/// (`>`, never `>=`), so among equally-weighted tuples the first one
/// the enumerator produced — and, across widths, the widest K tried
/// first — wins. This matches the reference driver's tie-break.
pub fn find_best_combination(
    table: &RefSetTable,
    eligible: &[usize],
    cfg: &RunConfig,
    backend: &dyn ScoreBackend,
) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    let mut combo_buf = Vec::with_capacity(cfg.kick_size);
    let mut scores = vec![0u64; cfg.kick_size];

    let max_k = cfg.max_k.min(eligible.len());
    for k in (2..=max_k).rev() {
        let mut gen = Combinations::new(eligible.len(), k);
        loop {
            combo_buf.clear();
            let produced = gen.next_batch(&mut combo_buf, cfg.kick_size, Some(eligible));
            if produced == 0 {
                break;
            }
            scores.resize(combo_buf.len(), 0);
            backend.score_batch(table, &combo_buf, k, &mut scores[..combo_buf.len()]);

            for (combo, &score) in combo_buf.iter().zip(scores.iter()) {
                if score == 0 {
                    continue;
                }
                let w = weight(score, k);
                let is_better = match &best {
                    None => true,
                    Some(b) => w > b.weighted_score,
                };
                if is_better {
                    best = Some(Candidate {
                        buckets: combo[..k].iter().map(|&x| x as usize).collect(),
                        k,
                        score,
                        weighted_score: w,
                    });
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfig;
    use crate::score::ScalarBackend;

    fn cfg() -> RunConfig {
        RunConfig::from_raw(RawConfig { min_bucket_size: 0, ..RawConfig::default() }, 256).unwrap()
    }

    #[test]
    fn eligibility_filters_on_split_count_and_size() {
        let cfg = RunConfig::from_raw(
            RawConfig { min_bucket_size: 100, max_bucket_splits: 2, ..RawConfig::default() },
            256,
        )
        .unwrap();
        let buckets = vec![
            Bucket { split_count: 0, ref_size: 200, ..Bucket::input("a".into(), 1, 200) },
            Bucket { split_count: 5, ref_size: 200, ..Bucket::input("b".into(), 1, 200) },
            Bucket { split_count: 0, ref_size: 50, ..Bucket::input("c".into(), 1, 50) },
        ];
        assert_eq!(eligible_buckets(&buckets, 0, &cfg), vec![0]);
    }

    #[test]
    fn finds_best_pair_when_no_wider_combination_helps() {
        let mut table = RefSetTable::new(&[10; 8]);
        let b0 = table.append_bucket();
        let b1 = table.append_bucket();
        let b2 = table.append_bucket();
        for i in 0..4 {
            table.set_ref(b0, i);
            table.set_ref(b1, i);
        }
        table.set_ref(b2, 7);

        let buckets = vec![
            Bucket::input("a".into(), 4, 40),
            Bucket::input("b".into(), 4, 40),
            Bucket::input("c".into(), 1, 10),
        ];
        let eligible = eligible_buckets(&buckets, 0, &cfg());
        let winner = find_best_combination(&table, &eligible, &cfg(), &ScalarBackend).unwrap();
        assert_eq!(winner.buckets, vec![0, 1]);
        assert_eq!(winner.score, 40);
    }

    #[test]
    fn returns_none_when_nothing_intersects() {
        let mut table = RefSetTable::new(&[10; 4]);
        let b0 = table.append_bucket();
        let b1 = table.append_bucket();
        table.set_ref(b0, 0);
        table.set_ref(b1, 1);
        let buckets = vec![Bucket::input("a".into(), 1, 10), Bucket::input("b".into(), 1, 10)];
        let eligible = eligible_buckets(&buckets, 0, &cfg());
        assert!(find_best_combination(&table, &eligible, &cfg(), &ScalarBackend).is_none());
    }
}
