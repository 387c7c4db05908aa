//! Layout deduplication engine.
//!
//! Given a set of items (each with a byte size) and a set of buckets
//! (each referencing a subset of those items), repeatedly finds groups
//! of buckets that share a costly amount of content and factors that
//! shared content out into new, derived buckets — reducing the total
//! bytes a packaged layout would need to carry if every bucket were
//! stored independently.
//!
//! The crate is organized the way the reference driver is structured:
//! a bitset table ([`refset`]) holding *what* each bucket contains, a
//! combination generator ([`combgen`]) enumerating candidate groups, a
//! scoring kernel ([`score`]) weighing them, a search driver
//! ([`search`]) picking the best one, a deduplicator ([`dedup`]) that
//! applies it, and an orchestrator ([`plan`]) that runs the whole loop
//! to convergence.

pub mod config;
pub mod dedup;
pub mod error;
pub mod plan;
pub mod score;
pub mod search;
pub mod types;

pub use config::{RawConfig, RunConfig, MAX_K_CAP};
pub use error::{DedupeError, Result};
pub use plan::PlanStats;
pub use score::{ParallelBackend, ScalarBackend, ScoreBackend};
pub use search::Candidate;
pub use types::Bucket;

use refset::RefSetTable;

/// A fully loaded planning problem: the item sizes, the initial buckets
/// and their membership, and the configuration to run under.
pub struct Plan {
    table: RefSetTable,
    buckets: Vec<Bucket>,
    config: RunConfig,
}

impl Plan {
    /// Builds a new plan. `item_sizes` gives every item's byte size;
    /// `bucket_members` gives, for each input bucket in order, the item
    /// ids it references. Every input bucket starts at level 0.
    pub fn new(
        item_sizes: &[u32],
        bucket_names: &[String],
        bucket_members: &[Vec<u32>],
        config: RunConfig,
    ) -> Result<Self> {
        if bucket_names.len() != bucket_members.len() {
            return Err(DedupeError::Input(format!(
                "{} bucket names but {} member lists",
                bucket_names.len(),
                bucket_members.len()
            )));
        }

        let mut table = RefSetTable::new(item_sizes);
        let mut buckets = Vec::with_capacity(bucket_names.len());

        for (name, members) in bucket_names.iter().zip(bucket_members.iter()) {
            let idx = table.append_bucket();
            for &item in members {
                if item as usize >= table.item_count() {
                    return Err(DedupeError::Input(format!(
                        "bucket {name:?} references out-of-range item {item}"
                    )));
                }
                table.set_ref(idx, item as usize);
            }
            let ref_count = table.ref_count(idx) as u32;
            let ref_size = table.ref_size(idx);
            buckets.push(Bucket::input(name.clone(), ref_count, ref_size));
        }

        Ok(Self { table, buckets, config })
    }

    /// Runs the search/dedup loop to completion using `backend` to
    /// score candidate combinations, returning a summary of what it did.
    /// The plan's bucket arena (accessible afterward via [`Plan::buckets`]
    /// and [`Plan::table`]) holds the full result: every original bucket,
    /// emptied of whatever was factored out of it, plus every derived
    /// bucket the run created.
    pub fn run(&mut self, backend: &dyn ScoreBackend) -> PlanStats {
        plan::run(&mut self.table, &mut self.buckets, &self.config, backend)
    }

    /// The bucket arena as it stands: every input bucket first, in its
    /// original order, followed by every derived bucket in creation
    /// order. Indices into this slice are stable and match indices into
    /// [`Plan::table`].
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// The bitset table backing [`Plan::buckets`].
    pub fn table(&self) -> &RefSetTable {
        &self.table
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }
}
