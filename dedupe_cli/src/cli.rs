//! Command-line flags, one-to-one with `dedupe::RawConfig`'s fields.
//! Plain `#[derive(Parser)]` with `#[arg(...)]` attributes on each field.

use std::path::PathBuf;

use clap::Parser;
use dedupe::RawConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Finds and factors out content shared across packaged content buckets.
pub struct Cli {
    /// Input JSON document (Items + Buckets).
    pub input: PathBuf,

    /// Output JSON document (the resulting bucket graph).
    pub output: PathBuf,

    /// Dispatch scoring to the parallel backend when available.
    #[arg(long, default_value_t = true)]
    pub allow_gpu: bool,

    /// Abort an iteration when the best weighted score is below this
    /// many mebibytes.
    #[arg(long, default_value_t = 5.0)]
    pub min_gain_mb: f64,

    /// Buckets at or below this many bytes are ineligible as sources.
    #[arg(long, default_value_t = 512 * 1024)]
    pub min_bucket_size: u64,

    /// Batch size for scoring; must be a power of two.
    #[arg(long, default_value_t = 65536)]
    pub kick_size: usize,

    /// Work-group size for the scoring kernel; power of two.
    #[arg(long, default_value_t = 256)]
    pub local_size: usize,

    /// Upper bound on combination width K (clamped to 6).
    #[arg(short = 'k', long, default_value_t = 4)]
    pub max_k: usize,

    /// Number of outer passes.
    #[arg(long, default_value_t = 3)]
    pub max_levels: usize,

    /// Per-level iteration cap.
    #[arg(long, default_value_t = 1024)]
    pub max_iterations: usize,

    /// Max derived buckets a single source may contribute to.
    #[arg(long, default_value_t = 25)]
    pub max_bucket_splits: u32,

    /// If set, buckets of any level may be sources in any pass.
    #[arg(long, default_value_t = true)]
    pub merge_across_levels: bool,

    /// Diagnostic output level (0 = quiet, higher = more verbose).
    #[arg(short = 'v', long, default_value_t = 1)]
    pub verbosity: u8,
}

impl From<&Cli> for RawConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            allow_gpu: cli.allow_gpu,
            min_gain_mb: cli.min_gain_mb,
            min_bucket_size: cli.min_bucket_size,
            kick_size: cli.kick_size,
            local_size: cli.local_size,
            max_k: cli.max_k,
            max_levels: cli.max_levels,
            max_iterations: cli.max_iterations,
            max_bucket_splits: cli.max_bucket_splits,
            merge_across_levels: cli.merge_across_levels,
            verbosity: cli.verbosity,
        }
    }
}
