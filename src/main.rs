use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use jemallocator::Jemalloc;
use measurement_aggregator::{AggregatorConfig, LoadMode, MeasurementAggregator, MergeStrategy};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MergeArg {
    Sequential,
    Tree,
}

impl From<MergeArg> for MergeStrategy {
    fn from(arg: MergeArg) -> Self {
        match arg {
            MergeArg::Sequential => MergeStrategy::Sequential,
            MergeArg::Tree => MergeStrategy::Tree,
        }
    }
}

#[derive(Parser)]
#[command(name = "measurement_aggregator")]
#[command(author, version, about = "Min/mean/max per key over a large key;value file")]
struct Cli {
    /// Input file, one `key;value` record per line
    #[arg(default_value = "measurements.txt")]
    file: PathBuf,

    /// Degree of parallelism (default: available cores)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Read the file into memory instead of memory-mapping it
    #[arg(long)]
    no_mmap: bool,

    /// How many skipped lines to report individually
    #[arg(long, default_value = "16")]
    max_reported_errors: usize,

    /// How per-worker results are merged
    #[arg(long, value_enum, default_value = "sequential")]
    merge: MergeArg,

    /// Log record, chunk and key counts
    #[arg(long)]
    stats: bool,
}

fn main() -> Result<()> {
    // stdout is reserved for the result line
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AggregatorConfig::default()
        .with_max_reported_errors(cli.max_reported_errors)
        .with_merge(cli.merge.into())
        .with_load(if cli.no_mmap { LoadMode::Read } else { LoadMode::Mmap });
    if let Some(threads) = cli.threads {
        config = config.with_parallelism(threads)?;
    }

    let aggregator = MeasurementAggregator::new(config);
    let source = aggregator
        .load(&cli.file)
        .with_context(|| format!("Failed to load {}", cli.file.display()))?;
    let report = aggregator.run(&source)?;
    report.log_skipped();

    if cli.stats {
        info!(
            records = report.records,
            skipped = report.skipped,
            chunks = report.chunks,
            keys = report.aggregates.len(),
            scan_ms = report.scan_elapsed.as_millis() as u64,
            merge_ms = report.merge_elapsed.as_millis() as u64,
            "run statistics"
        );
    }

    println!("{}", report.format());
    Ok(())
}
