//! Entry point: load a layout, run the deduplication engine over it,
//! save the result, and print a short human-readable report.

mod cli;
mod io;

use std::process::ExitCode;

use clap::Parser;
use dedupe::{Plan, RawConfig, RunConfig, ScalarBackend, ScoreBackend};
use dyn_size_of::GetSize;

use cli::Cli;

/// How many work-items a single-threaded CPU scoring pass can usefully
/// keep in flight at once; stands in for the device-reported maximum
/// the original driver queries from its accelerator.
const CPU_MAX_LOCAL_SIZE: usize = 1;
const PARALLEL_MAX_LOCAL_SIZE: usize = 256;

fn run(cli: &Cli) -> anyhow::Result<()> {
    let raw: RawConfig = cli.into();
    let device_max_local_size = if raw.allow_gpu { PARALLEL_MAX_LOCAL_SIZE } else { CPU_MAX_LOCAL_SIZE };
    let config = RunConfig::from_raw(raw, device_max_local_size)?;

    let doc = io::load_input(&cli.input)?;
    let names: Vec<String> = doc.buckets.iter().map(|b| b.name.clone()).collect();
    let members: Vec<Vec<u32>> = doc.buckets.iter().map(|b| b.refs.clone()).collect();
    let mut plan = Plan::new(&doc.items, &names, &members, config)?;

    let backend: Box<dyn ScoreBackend> = if config.allow_gpu {
        Box::new(dedupe::ParallelBackend)
    } else {
        Box::new(ScalarBackend)
    };

    let stats = plan.run(backend.as_ref());

    print_summary(&stats, plan.table(), plan.buckets());
    if config.verbosity > 0 {
        print_seek_summary(plan.buckets());
    }

    io::save_output(&cli.output, plan.buckets(), plan.table())?;
    Ok(())
}

fn print_summary(stats: &dedupe::PlanStats, table: &refset::RefSetTable, buckets: &[dedupe::Bucket]) {
    let total_mb = buckets.iter().map(|b| b.ref_size).sum::<u64>() as f64 / (1024.0 * 1024.0);
    let resident_mb = (table.size_bytes() + buckets.iter().map(GetSize::size_bytes).sum::<usize>()) as f64
        / (1024.0 * 1024.0);
    println!("De-duplication summary:");
    println!("  Number of buckets: {:9}", buckets.len());
    println!("  Number of items:   {:9}     (32-bit state words: {})", table.item_count(), table.word_count());
    println!("  Levels run:        {:9}", stats.levels_run);
    println!("  Iterations run:    {:9}", stats.iterations_run);
    println!("  Total data size:   {total_mb:9.2} MB");
    println!("  Resident memory:   {resident_mb:9.2} MB  (bucket table + bitset store)");
}

fn seek_count(buckets: &[dedupe::Bucket], visited: &mut [bool], bucket: usize) -> u32 {
    if visited[bucket] {
        return 0;
    }
    visited[bucket] = true;
    let mut sum = 1;
    for &link in &buckets[bucket].split_links {
        sum += seek_count(buckets, visited, link as usize);
    }
    sum
}

fn print_seek_summary(buckets: &[dedupe::Bucket]) {
    println!("Seeks | Bucket");
    for (i, b) in buckets.iter().enumerate() {
        if b.level != 0 {
            break;
        }
        let mut visited = vec![false; buckets.len()];
        println!("{:5} | {}", seek_count(buckets, &mut visited, i), b.name);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = match cli.verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::new(filter)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
