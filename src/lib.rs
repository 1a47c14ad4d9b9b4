//! # MeasurementAggregator
//!
//! `MeasurementAggregator` computes min/mean/max per key over very large
//! `key;value` files, e.g. weather station readings:
//!
//! ```text
//! Hamburg;12.0
//! Bulawayo;8.9
//! Palembang;38.8
//! ```
//!
//! - Memory-mapped input (zero-copy, keys borrow from the map)
//! - Chunk planning aligned to line breaks, so no record is split
//! - Parallel per-chunk scanning with Rayon, one local map per worker
//! - Exact accumulation on scaled integers (`12.3` is `123`)
//! - Deterministic merge and byte-wise sorted output
//!
//! Malformed lines are skipped and reported; only I/O failures abort a run.
//!
//! # Example
//!
//! ```rust
//! use measurement_aggregator::{AggregatorConfig, MeasurementAggregator};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let aggregator = MeasurementAggregator::new(AggregatorConfig::default().with_parallelism(4)?);
//!
//!     let report = aggregator.run(b"Oslo;abc\nParis;10.0\n")?;
//!     assert_eq!(report.format(), "{Paris=10.0/10.0/10.0}");
//!     assert_eq!(report.skipped, 1);
//!
//!     Ok(())
//! }
//! ```

pub mod processor;

pub use processor::{
    ParseError, ProcessorError, RecordError,
    aggregate::{Aggregate, AggregateMap},
    aggregator::{AggregatorConfig, LoadMode, MeasurementAggregator, MergeStrategy, RunReport},
    source::ByteSource,
};
