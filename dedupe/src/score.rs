//! The scoring kernel: given a batch of K-tuples of bucket indices,
//! computes the byte-weight of each tuple's intersection.
//!
//! The device-specific dispatch is kept separate from the kernel's
//! inputs/outputs/semantics. No accelerator is reachable from this
//! workspace, so the "device" path here is an honest `rayon`-parallel
//! CPU implementation of the same arithmetic rather than a stand-in
//! that merely pretends to offload — it is required to produce
//! bit-identical scores to the scalar path, which the test at the
//! bottom of this module checks.

use combgen::Combination;
use refset::RefSetTable;

/// Any combination slot at or below this value is padding and must
/// score zero.
const SKIP: i32 = -1;

/// Scores one K-tuple against `table`, using `scratch` (which must be
/// `table.word_count()` words long) as intersection workspace.
fn score_one(table: &RefSetTable, combo: &Combination, k: usize, scratch: &mut [u32]) -> u64 {
    if combo[..k].iter().any(|&x| x == SKIP) {
        return 0;
    }
    let indices: Vec<usize> = combo[..k].iter().map(|&x| x as usize).collect();
    table.intersection_into(&indices, scratch);
    table.sum_sizes(scratch)
}

/// Scores a batch of combinations, all of the same `k`, against `table`.
/// Implementations must be bit-exact with [`ScalarBackend`]; the only
/// freedom they have is *how* the work is scheduled, not the arithmetic.
pub trait ScoreBackend {
    fn score_batch(&self, table: &RefSetTable, combos: &[Combination], k: usize, scores: &mut [u64]);
}

/// The mandatory scalar reference implementation: ground truth for
/// correctness, and the only backend whose output ordering the rest of
/// the engine may depend on (the parallel backend's speedup comes
/// precisely from not guaranteeing an execution order).
#[derive(Debug, Default, Clone, Copy)]
pub struct ScalarBackend;

impl ScoreBackend for ScalarBackend {
    fn score_batch(&self, table: &RefSetTable, combos: &[Combination], k: usize, scores: &mut [u64]) {
        debug_assert_eq!(combos.len(), scores.len());
        let mut scratch = vec![0u32; table.word_count()];
        for (combo, score) in combos.iter().zip(scores.iter_mut()) {
            *score = score_one(table, combo, k, &mut scratch);
        }
    }
}

/// CPU stand-in for the accelerator dispatch: chunks the batch across
/// `rayon`'s thread pool. Each chunk gets its own scratch buffer so
/// threads never contend on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParallelBackend;

impl ScoreBackend for ParallelBackend {
    fn score_batch(&self, table: &RefSetTable, combos: &[Combination], k: usize, scores: &mut [u64]) {
        use rayon::prelude::*;

        debug_assert_eq!(combos.len(), scores.len());
        combos
            .par_iter()
            .zip(scores.par_iter_mut())
            .with_min_len(256)
            .for_each_init(
                || vec![0u32; table.word_count()],
                |scratch, (combo, score)| {
                    *score = score_one(table, combo, k, scratch);
                },
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refset::RefSetTable;

    fn table_with_buckets(sizes: &[u32], bucket_items: &[&[usize]]) -> RefSetTable {
        let mut table = RefSetTable::new(sizes);
        for items in bucket_items {
            let b = table.append_bucket();
            for &i in *items {
                table.set_ref(b, i);
            }
        }
        table
    }

    #[test]
    fn score_is_intersection_byte_weight() {
        let table = table_with_buckets(&[10, 10, 10, 10], &[&[0, 1, 2], &[1, 2, 3]]);
        let combo: Combination = [0, 1, -1, -1, -1, -1, -1, -1];
        let mut scores = [0u64];
        ScalarBackend.score_batch(&table, &[combo], 2, &mut scores);
        assert_eq!(scores[0], 20); // items 1 and 2 shared, 10 bytes each
    }

    #[test]
    fn combination_containing_skip_sentinel_scores_zero() {
        let table = table_with_buckets(&[10, 10], &[&[0], &[1]]);
        let combo: Combination = [0, -1, -1, -1, -1, -1, -1, -1];
        let mut scores = [0u64];
        ScalarBackend.score_batch(&table, &[combo], 2, &mut scores);
        assert_eq!(scores[0], 0);
    }

    #[test]
    fn scalar_and_parallel_backends_agree_bit_for_bit() {
        let mut sizes = Vec::new();
        for i in 0..400u32 {
            sizes.push(i + 1);
        }
        let mut table = RefSetTable::new(&sizes);
        let buckets: Vec<usize> = (0..20)
            .map(|b| {
                let idx = table.append_bucket();
                for i in 0..400usize {
                    if (i + b) % 7 == 0 {
                        table.set_ref(idx, i);
                    }
                }
                idx
            })
            .collect();

        let mut combos = Vec::new();
        combgen::Combinations::new(buckets.len(), 3).next_batch(&mut combos, 10_000, Some(&buckets));

        let mut scalar_scores = vec![0u64; combos.len()];
        let mut parallel_scores = vec![0u64; combos.len()];
        ScalarBackend.score_batch(&table, &combos, 3, &mut scalar_scores);
        ParallelBackend.score_batch(&table, &combos, 3, &mut parallel_scores);

        assert_eq!(scalar_scores, parallel_scores);
    }
}
