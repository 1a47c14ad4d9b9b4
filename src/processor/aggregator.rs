use rayon::{
    ThreadPoolBuilder,
    iter::{IntoParallelRefIterator, ParallelIterator},
};
use std::{
    num::NonZeroUsize,
    path::Path,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

use crate::processor::{
    ProcessorError, RecordError, RunPhase,
    aggregate::{AggregateMap, merge, merge_tree},
    format::format_map,
    planner::{chunks, plan_bytes},
    scanner::{ChunkResult, scan_chunk},
    source::ByteSource,
};

/// How local maps are combined after the join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Left fold on the calling thread
    #[default]
    Sequential,
    /// Rayon reduction tree inside the worker pool
    Tree,
}

/// How the input file becomes a byte source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadMode {
    #[default]
    Mmap,
    Read,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub parallelism: NonZeroUsize,
    pub max_reported_errors: usize,
    pub merge: MergeStrategy,
    pub load: LoadMode,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        AggregatorConfig {
            parallelism: std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
            max_reported_errors: 16,
            merge: MergeStrategy::default(),
            load: LoadMode::default(),
        }
    }
}

impl AggregatorConfig {
    /// # Errors
    /// [`ProcessorError::InvalidParallelism`] for `0`.
    pub fn with_parallelism(mut self, parallelism: usize) -> Result<Self, ProcessorError> {
        self.parallelism = NonZeroUsize::new(parallelism).ok_or(ProcessorError::InvalidParallelism)?;
        Ok(self)
    }

    pub fn with_max_reported_errors(mut self, max: usize) -> Self {
        self.max_reported_errors = max;
        self
    }

    pub fn with_merge(mut self, merge: MergeStrategy) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_load(mut self, load: LoadMode) -> Self {
        self.load = load;
        self
    }
}

/// Outcome of one run. Keys borrow from the scanned input.
#[derive(Debug)]
pub struct RunReport<'a> {
    pub aggregates: AggregateMap<'a>,
    pub records: u64,
    pub skipped: u64,
    /// Sampled rejected lines, at most `max_reported_errors`, in input order
    pub errors: Vec<RecordError>,
    pub chunks: usize,
    pub scan_elapsed: Duration,
    pub merge_elapsed: Duration,
}

impl RunReport<'_> {
    pub fn format(&self) -> String {
        format_map(&self.aggregates)
    }

    /// Logs each sampled rejected line, then the total.
    pub fn log_skipped(&self) {
        if self.skipped == 0 {
            return;
        }
        for error in &self.errors {
            warn!("skipped record at {error}");
        }
        warn!(skipped = self.skipped, "malformed records were skipped");
    }
}

/// Parallel chunked scan-and-aggregate over one input.
///
/// # Examples
///
/// ```rust
/// # use measurement_aggregator::processor::aggregator::{AggregatorConfig, MeasurementAggregator};
/// let config = AggregatorConfig::default().with_parallelism(2).unwrap();
/// let aggregator = MeasurementAggregator::new(config);
/// let report = aggregator.run(b"Hamburg;12.0\nBerlin;8.5\nHamburg;6.0\n").unwrap();
/// assert_eq!(report.format(), "{Berlin=8.5/8.5/8.5,Hamburg=6.0/9.0/12.0}");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MeasurementAggregator {
    config: AggregatorConfig,
}

impl MeasurementAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        MeasurementAggregator { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Opens `path` according to the configured [`LoadMode`].
    pub fn load(&self, path: &Path) -> Result<ByteSource, ProcessorError> {
        match self.config.load {
            LoadMode::Mmap => ByteSource::map(path),
            LoadMode::Read => ByteSource::read(path),
        }
    }

    /// Loads, aggregates and formats `path` in one go.
    ///
    /// Skipped records are logged; only fatal errors are returned.
    pub fn process_file(&self, path: &Path) -> Result<String, ProcessorError> {
        let started = Instant::now();
        let source = self.load(path).inspect_err(|e| {
            debug!(phase = ?RunPhase::Aborted, error = %e, "run aborted");
        })?;

        let report = self.run(&source)?;
        report.log_skipped();

        enter(RunPhase::Formatting);
        let out = report.format();
        enter(RunPhase::Done);

        info!(
            path = %path.display(),
            records = report.records,
            keys = report.aggregates.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "aggregation finished"
        );
        Ok(out)
    }

    /// Runs the pipeline over an in-memory view of the input.
    pub fn run<'a>(&self, data: &'a [u8]) -> Result<RunReport<'a>, ProcessorError> {
        let workers = self.config.parallelism;

        enter(RunPhase::Planning);
        let boundaries = plan_bytes(data, workers);
        let chunks = chunks(&boundaries);
        debug!(?boundaries, "chunk plan");

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.get())
            .thread_name(|i| format!("scan-{i}"))
            .build()
            .inspect_err(|e| debug!(phase = ?RunPhase::Aborted, error = %e, "run aborted"))?;

        enter(RunPhase::Dispatch);
        let max_errors = self.config.max_reported_errors;
        let scan_started = Instant::now();
        let partials: Vec<ChunkResult<'a>> = pool.install(|| {
            enter(RunPhase::WorkersRunning);
            chunks
                .par_iter()
                .map(|chunk| scan_chunk(data, *chunk, max_errors))
                .collect()
        });
        let scan_elapsed = scan_started.elapsed();
        enter(RunPhase::Joined);

        let mut records = 0;
        let mut skipped = 0;
        let mut errors = Vec::new();
        let mut maps = Vec::with_capacity(partials.len());
        for partial in partials {
            records += partial.records;
            skipped += partial.skipped;
            let room = max_errors.saturating_sub(errors.len());
            errors.extend(partial.errors.into_iter().take(room));
            maps.push(partial.aggregates);
        }

        enter(RunPhase::Merging);
        let merge_started = Instant::now();
        let aggregates = match self.config.merge {
            MergeStrategy::Sequential => merge(maps),
            MergeStrategy::Tree => pool.install(|| merge_tree(maps)),
        };
        let merge_elapsed = merge_started.elapsed();

        debug!(
            chunks = chunks.len(),
            records,
            skipped,
            keys = aggregates.len(),
            scan_ms = scan_elapsed.as_millis() as u64,
            merge_ms = merge_elapsed.as_millis() as u64,
            "scan and merge complete"
        );

        Ok(RunReport {
            aggregates,
            records,
            skipped,
            errors,
            chunks: chunks.len(),
            scan_elapsed,
            merge_elapsed,
        })
    }
}

fn enter(phase: RunPhase) {
    debug!(?phase, "pipeline phase");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::ParseError;

    fn aggregator(parallelism: usize) -> MeasurementAggregator {
        MeasurementAggregator::new(AggregatorConfig::default().with_parallelism(parallelism).unwrap())
    }

    #[test]
    fn test_zero_parallelism_is_rejected() {
        let err = AggregatorConfig::default().with_parallelism(0).unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidParallelism));
    }

    #[test]
    fn test_signed_midpoint() {
        let report = aggregator(2).run(b"A;-5.0\nA;5.0\n").unwrap();
        assert_eq!(report.format(), "{A=-5.0/0.0/5.0}");
    }

    #[test]
    fn test_empty_input() {
        let report = aggregator(4).run(b"").unwrap();
        assert_eq!(report.format(), "{}");
        assert_eq!(report.records, 0);
        assert_eq!(report.chunks, 4);
    }

    #[test]
    fn test_errors_are_sampled_in_input_order_across_chunks() {
        let data = b"a\nA;1.0\nb\nA;2.0\nc\nA;3.0\nd\n";
        let config = AggregatorConfig::default()
            .with_parallelism(4)
            .unwrap()
            .with_max_reported_errors(3);
        let report = MeasurementAggregator::new(config).run(data).unwrap();

        assert_eq!(report.records, 3);
        assert_eq!(report.skipped, 4);
        let lines: Vec<&str> = report.errors.iter().map(|e| e.line.as_str()).collect();
        assert_eq!(lines, vec!["a", "b", "c"]);
        assert!(report.errors.iter().all(|e| e.error == ParseError::MissingDelimiter));
    }

    #[test]
    fn test_record_count_matches_aggregate_counts() {
        let data = b"A;1.0\nB;2.0\nbad\nA;3.0\nC;-4.0\n";
        let report = aggregator(3).run(data).unwrap();
        let total: u64 = report.aggregates.values().map(|a| a.count).sum();
        assert_eq!(report.records, 4);
        assert_eq!(total, report.records);
    }

    #[test]
    fn test_merge_strategies_agree() {
        let data: Vec<u8> = (0..5_000)
            .flat_map(|i| format!("k{};{}.{}\n", i % 13, i % 200 - 100, i % 10).into_bytes())
            .collect();
        let base = AggregatorConfig::default().with_parallelism(7).unwrap();

        let sequential = MeasurementAggregator::new(base.with_merge(MergeStrategy::Sequential))
            .run(&data)
            .unwrap();
        let tree = MeasurementAggregator::new(base.with_merge(MergeStrategy::Tree))
            .run(&data)
            .unwrap();

        assert_eq!(sequential.aggregates, tree.aggregates);
    }
}
