//! Request sample aggregation and the end-of-run summary.
mod collector;
mod histogram;
mod summary;


pub use collector::{MetricsCollector, Sample, collect};
pub use histogram::LatencyHistogram;
pub use summary::{DurationStats, FailedStats, RunContext, RunSummary};
