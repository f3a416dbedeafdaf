use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::MetricsError;
use crate::http::{ErrorKind, Exchange, RequestError};

use super::LatencyHistogram;
use super::summary::{DurationStats, FailedStats, RunContext, RunSummary};

/// Outcome of one iteration of one VU.
#[derive(Debug)]
pub struct Sample {
    pub vu: u64,
    pub iteration: u64,
    pub outcome: Result<Exchange, RequestError>,
}

#[derive(Debug)]
pub struct MetricsCollector {
    started: Instant,
    started_at: DateTime<Utc>,
    http_reqs: u64,
    failed: u64,
    data_received: u64,
    connections_opened: u64,
    connections_unobserved: u64,
    durations: LatencyHistogram,
    duration_sum_us: u128,
    duration_min_us: u64,
    duration_max_us: u64,
    connecting_sum_us: u128,
    connecting_count: u64,
    tls_sum_us: u128,
    tls_count: u64,
    statuses: BTreeMap<u16, u64>,
    errors: BTreeMap<ErrorKind, u64>,
    ciphers: BTreeMap<String, u64>,
    tls_versions: BTreeMap<String, u64>,
}

impl MetricsCollector {
    /// # Errors
    ///
    /// Returns an error if the duration histogram cannot be created.
    pub fn new() -> Result<Self, MetricsError> {
        Ok(Self {
            started: Instant::now(),
            started_at: Utc::now(),
            http_reqs: 0,
            failed: 0,
            data_received: 0,
            connections_opened: 0,
            connections_unobserved: 0,
            durations: LatencyHistogram::new()?,
            duration_sum_us: 0,
            duration_min_us: u64::MAX,
            duration_max_us: 0,
            connecting_sum_us: 0,
            connecting_count: 0,
            tls_sum_us: 0,
            tls_count: 0,
            statuses: BTreeMap::new(),
            errors: BTreeMap::new(),
            ciphers: BTreeMap::new(),
            tls_versions: BTreeMap::new(),
        })
    }

    /// Folds one sample into the aggregates.
    pub fn record(&mut self, sample: &Sample) {
        self.http_reqs = self.http_reqs.saturating_add(1);
        match &sample.outcome {
            Ok(exchange) => self.record_exchange(exchange),
            Err(err) => {
                debug!(
                    "VU {} iteration {} failed: {}",
                    sample.vu, sample.iteration, err
                );
                self.failed = self.failed.saturating_add(1);
                bump(&mut self.errors, err.kind);
            }
        }
    }

    fn record_exchange(&mut self, exchange: &Exchange) {
        if !exchange.is_expected_status() {
            self.failed = self.failed.saturating_add(1);
        }
        bump(&mut self.statuses, exchange.status);
        self.data_received = self.data_received.saturating_add(exchange.bytes_received);
        match exchange.new_connection {
            Some(true) => self.connections_opened = self.connections_opened.saturating_add(1),
            Some(false) => {}
            None => {
                self.connections_unobserved = self.connections_unobserved.saturating_add(1);
            }
        }

        let duration_us = micros(exchange.timings.duration);
        if let Err(err) = self.durations.record(duration_us) {
            warn!("Dropping duration sample: {}", err);
        }
        self.duration_sum_us = self.duration_sum_us.saturating_add(u128::from(duration_us));
        self.duration_min_us = self.duration_min_us.min(duration_us);
        self.duration_max_us = self.duration_max_us.max(duration_us);

        if let Some(connecting) = exchange.timings.connecting {
            self.connecting_sum_us = self
                .connecting_sum_us
                .saturating_add(u128::from(micros(connecting)));
            self.connecting_count = self.connecting_count.saturating_add(1);
        }
        if let Some(handshake) = exchange.timings.tls_handshaking {
            self.tls_sum_us = self
                .tls_sum_us
                .saturating_add(u128::from(micros(handshake)));
            self.tls_count = self.tls_count.saturating_add(1);
        }
        if let Some(tls) = exchange.tls.as_ref() {
            bump(&mut self.ciphers, tls.cipher.clone());
            bump(&mut self.tls_versions, tls.version.clone());
        }
    }

    #[must_use]
    pub const fn http_reqs(&self) -> u64 {
        self.http_reqs
    }

    #[must_use]
    pub const fn failed(&self) -> u64 {
        self.failed
    }

    /// Freezes the aggregates into a summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the duration histogram cannot be serialized.
    pub fn finish(self, context: RunContext) -> Result<RunSummary, MetricsError> {
        let responses = self.durations.count();
        let http_req_duration = if responses == 0 {
            DurationStats::default()
        } else {
            DurationStats {
                min_us: self.duration_min_us,
                avg_us: average(self.duration_sum_us, responses),
                med_us: self.durations.value_at_quantile(0.5),
                max_us: self.duration_max_us,
                p90_us: self.durations.value_at_quantile(0.9),
                p95_us: self.durations.value_at_quantile(0.95),
            }
        };
        let histogram = if responses == 0 {
            None
        } else {
            Some(self.durations.encode_base64()?)
        };

        Ok(RunSummary {
            started_at: self
                .started_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            duration_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
            context,
            http_reqs: self.http_reqs,
            http_req_failed: FailedStats::new(self.failed, self.http_reqs),
            iterations: self.http_reqs,
            data_received: self.data_received,
            connections_opened: self.connections_opened,
            connections_unobserved: self.connections_unobserved,
            http_req_duration,
            http_req_connecting_avg_us: (self.connecting_count > 0)
                .then(|| average(self.connecting_sum_us, self.connecting_count)),
            http_req_tls_handshaking_avg_us: (self.tls_count > 0)
                .then(|| average(self.tls_sum_us, self.tls_count)),
            statuses: self
                .statuses
                .into_iter()
                .map(|(status, count)| (status.to_string(), count))
                .collect(),
            errors: self
                .errors
                .into_iter()
                .map(|(kind, count)| (kind.as_str().to_owned(), count))
                .collect(),
            tls_ciphers: self.ciphers,
            tls_versions: self.tls_versions,
            http_req_duration_histogram: histogram,
        })
    }
}

/// Drains samples until every VU has dropped its sender.
///
/// # Errors
///
/// Returns an error if the collector cannot be initialized.
pub async fn collect(mut rx: mpsc::Receiver<Sample>) -> Result<MetricsCollector, MetricsError> {
    let mut collector = MetricsCollector::new()?;
    while let Some(sample) = rx.recv().await {
        collector.record(&sample);
    }
    debug!(
        "Collected {} request sample(s), {} failed",
        collector.http_reqs(),
        collector.failed()
    );
    Ok(collector)
}

fn bump<K: Ord>(map: &mut BTreeMap<K, u64>, key: K) {
    let count = map.entry(key).or_insert(0);
    *count = count.saturating_add(1);
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

fn average(sum: u128, count: u64) -> u64 {
    sum.checked_div(u128::from(count))
        .and_then(|avg| u64::try_from(avg).ok())
        .unwrap_or(0)
}
