//! Top-level orchestration: repeatedly finds and applies the best
//! combination across a fixed number of levels, each level working a
//! snapshot of the buckets that existed when it started.

use refset::RefSetTable;

use crate::config::RunConfig;
use crate::dedup::apply_candidate;
use crate::score::ScoreBackend;
use crate::search::{eligible_buckets, find_best_combination};
use crate::types::Bucket;

/// Summary of a completed run, for the CLI's human-readable report and
/// for tests that want to assert on aggregate behavior without walking
/// the bucket arena themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanStats {
    pub levels_run: usize,
    pub iterations_run: usize,
    pub total_gain_bytes: u64,
    pub derived_buckets: Vec<usize>,
}

/// Runs the level/iteration loop in place over `table`/`buckets` and
/// returns a summary of what happened.
///
/// Each level takes a snapshot of `buckets.len()` before it starts
/// ("`pass_bucket_count`" in the reference driver) and restricts that
/// level's eligible set to buckets that already existed at the
/// snapshot — buckets a level derives only become searchable starting
/// the *next* level, regardless of `merge_across_levels`, which governs
/// whether a level can draw on buckets from *earlier* levels rather
/// than on buckets it is itself still producing. This keeps each level
/// well-founded: its own output can never feed its own input.
///
/// A level stops iterating once no eligible combination clears
/// `cfg.min_gain_bytes`; the whole run stops early once a level makes
/// no progress at all, since later levels only ever see a strict subset
/// of what that level already failed to improve on.
pub fn run(
    table: &mut RefSetTable,
    buckets: &mut Vec<Bucket>,
    cfg: &RunConfig,
    backend: &dyn ScoreBackend,
) -> PlanStats {
    let mut stats = PlanStats::default();

    for level in 0..cfg.max_levels as u32 {
        let pass_bucket_count = buckets.len();
        let mut progressed = false;

        for _ in 0..cfg.max_iterations {
            let eligible: Vec<usize> = eligible_buckets(buckets, level, cfg)
                .into_iter()
                .filter(|&i| i < pass_bucket_count)
                .collect();

            let Some(candidate) = find_best_combination(table, &eligible, cfg, backend) else {
                break;
            };
            if candidate.weighted_score < cfg.min_gain_bytes {
                tracing::debug!(
                    weighted_score = candidate.weighted_score,
                    floor = cfg.min_gain_bytes,
                    "best candidate below min gain, stopping level"
                );
                break;
            }

            let derived = apply_candidate(table, buckets, &candidate, level + 1);
            tracing::info!(level, derived, k = candidate.k, gain = candidate.score, "applied combination");

            stats.iterations_run += 1;
            stats.total_gain_bytes += candidate.score;
            stats.derived_buckets.push(derived);
            progressed = true;
        }

        stats.levels_run += 1;
        if !progressed {
            break;
        }
    }

    stats
}
