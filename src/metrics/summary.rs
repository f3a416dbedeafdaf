use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::MetricsError;

/// Divisor for rates stored as percent x100.
const PERCENT_DIVISOR: u64 = 100;
const US_PER_MS: u64 = 1_000;
const US_PER_SEC: u64 = 1_000_000;
const BYTES_PER_KB: u64 = 1_000;
const BYTES_PER_MB: u64 = 1_000_000;
/// Width of the dotted label column.
const LABEL_WIDTH: usize = 28;

/// Describes the run the summary belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct RunContext {
    pub target: String,
    pub transport: &'static str,
    pub connection_reuse: &'static str,
    pub vus: u64,
    pub insecure_skip_tls_verify: bool,
    pub tls_cipher_suites: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FailedStats {
    pub count: u64,
    pub total: u64,
    pub rate_x100: u64,
}

impl FailedStats {
    #[must_use]
    pub fn new(count: u64, total: u64) -> Self {
        let rate_x100 = u128::from(count)
            .saturating_mul(10_000)
            .checked_div(u128::from(total))
            .and_then(|value| u64::try_from(value).ok())
            .unwrap_or(0);
        Self {
            count,
            total,
            rate_x100,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DurationStats {
    pub min_us: u64,
    pub avg_us: u64,
    pub med_us: u64,
    pub max_us: u64,
    pub p90_us: u64,
    pub p95_us: u64,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub started_at: String,
    pub duration_ms: u64,
    #[serde(flatten)]
    pub context: RunContext,
    pub http_reqs: u64,
    pub http_req_failed: FailedStats,
    pub iterations: u64,
    pub data_received: u64,
    pub connections_opened: u64,
    /// Responses whose connection origin the transport could not observe.
    pub connections_unobserved: u64,
    pub http_req_duration: DurationStats,
    pub http_req_connecting_avg_us: Option<u64>,
    pub http_req_tls_handshaking_avg_us: Option<u64>,
    pub statuses: BTreeMap<String, u64>,
    pub errors: BTreeMap<String, u64>,
    pub tls_ciphers: BTreeMap<String, u64>,
    pub tls_versions: BTreeMap<String, u64>,
    /// Base64 HdrHistogram V2 payload of request durations (µs).
    pub http_req_duration_histogram: Option<String>,
}

impl RunSummary {
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(line("target", &self.context.target));
        lines.push(line(
            "transport",
            &format!(
                "{} (connections {})",
                self.context.transport, self.context.connection_reuse
            ),
        ));
        if !self.context.tls_cipher_suites.is_empty() {
            lines.push(line(
                "tls_cipher_suites",
                &self.context.tls_cipher_suites.join(", "),
            ));
        }
        lines.push(line(
            "insecure_skip_tls_verify",
            &self.context.insecure_skip_tls_verify.to_string(),
        ));
        lines.push(line("data_received", &format_bytes(self.data_received)));

        let stats = &self.http_req_duration;
        let mut duration = format!(
            "avg={} min={} med={} max={} p(90)={} p(95)={}",
            format_us(stats.avg_us),
            format_us(stats.min_us),
            format_us(stats.med_us),
            format_us(stats.max_us),
            format_us(stats.p90_us),
            format_us(stats.p95_us)
        );
        if self.includes_connection_setup() {
            duration.push_str(" (includes connection setup)");
        }
        lines.push(line("http_req_duration", &duration));
        if let Some(avg) = self.http_req_connecting_avg_us {
            lines.push(line("http_req_connecting", &format!("avg={}", format_us(avg))));
        }
        if let Some(avg) = self.http_req_tls_handshaking_avg_us {
            lines.push(line(
                "http_req_tls_handshaking",
                &format!("avg={}", format_us(avg)),
            ));
        }

        let failed = &self.http_req_failed;
        lines.push(line(
            "http_req_failed",
            &format!(
                "{}.{:02}% {} out of {}",
                failed.rate_x100 / PERCENT_DIVISOR,
                failed.rate_x100 % PERCENT_DIVISOR,
                failed.count,
                failed.total
            ),
        ));
        lines.push(line("http_reqs", &self.http_reqs.to_string()));
        lines.push(line("iterations", &self.iterations.to_string()));
        let connections = if self.connections_unobserved == 0 {
            self.connections_opened.to_string()
        } else {
            format!(
                "{} (not observed for {} response(s))",
                self.connections_opened, self.connections_unobserved
            )
        };
        lines.push(line("connections_opened", &connections));
        lines.push(line("vus", &self.context.vus.to_string()));

        if !self.statuses.is_empty() {
            lines.push(line("http_status", &format_counts(&self.statuses)));
        }
        if !self.errors.is_empty() {
            lines.push(line("errors", &format_counts(&self.errors)));
        }
        if !self.tls_versions.is_empty() {
            lines.push(line("tls_version", &format_counts(&self.tls_versions)));
        }
        if !self.tls_ciphers.is_empty() {
            lines.push(line("tls_cipher", &format_counts(&self.tls_ciphers)));
        }
        lines
    }

    /// Transports that do not time connection setup separately fold it
    /// into the request duration.
    #[must_use]
    pub const fn includes_connection_setup(&self) -> bool {
        self.http_req_duration_histogram.is_some() && self.http_req_connecting_avg_us.is_none()
    }

    /// Writes the summary as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn write_json(&self, path: &Path) -> Result<(), MetricsError> {
        let encoded = serde_json::to_string_pretty(self)
            .map_err(|err| MetricsError::EncodeExport { source: err })?;
        std::fs::write(path, encoded).map_err(|err| MetricsError::WriteExport {
            path: path.to_path_buf(),
            source: err,
        })
    }
}

fn line(label: &str, value: &str) -> String {
    let dots = LABEL_WIDTH.saturating_sub(label.len());
    format!("  {}{}: {}", label, ".".repeat(dots), value)
}

fn format_counts(counts: &BTreeMap<String, u64>) -> String {
    counts
        .iter()
        .map(|(key, count)| format!("{}={}", key, count))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(super) fn format_us(us: u64) -> String {
    if us < US_PER_MS {
        format!("{}µs", us)
    } else if us < US_PER_SEC {
        format!("{}.{:02}ms", us / US_PER_MS, (us % US_PER_MS) / 10)
    } else {
        format!("{}.{:02}s", us / US_PER_SEC, (us % US_PER_SEC) / 10_000)
    }
}

pub(super) fn format_bytes(bytes: u64) -> String {
    if bytes < BYTES_PER_KB {
        format!("{} B", bytes)
    } else if bytes < BYTES_PER_MB {
        format!("{}.{} kB", bytes / BYTES_PER_KB, (bytes % BYTES_PER_KB) / 100)
    } else {
        format!("{}.{} MB", bytes / BYTES_PER_MB, (bytes % BYTES_PER_MB) / 100_000)
    }
}
