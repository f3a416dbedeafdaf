use clap::{ArgAction, Parser};
use std::time::Duration;

use super::defaults::{
    DEFAULT_CIPHER_SUITE, DEFAULT_PATH, DEFAULT_PORT, DEFAULT_TIMEOUT, HOST_ENV_VAR,
};
use super::parsers::{
    parse_bool_env, parse_duration_arg, parse_positive_u64, parse_scheme, parse_tls_version,
};
use super::types::{PositiveU64, Scheme, TlsVersion};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Async HTTPS load tester with pinned TLS cipher suites, per-request connections, and k6-style summaries."
)]
pub struct TesterArgs {
    /// Target host (hostname, IPv4, or IPv6 literal)
    #[arg(long = "host", env = HOST_ENV_VAR)]
    pub host: Option<String>,

    /// Target scheme
    #[arg(long = "scheme", default_value = "https", value_parser = parse_scheme)]
    pub scheme: Scheme,

    /// Target port
    #[arg(long = "port", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Request path, including any query string
    #[arg(long = "path", default_value = DEFAULT_PATH)]
    pub path: String,

    /// Number of concurrent virtual users
    #[arg(long = "vus", default_value = "1", value_parser = parse_positive_u64)]
    pub vus: PositiveU64,

    /// Total iterations shared by all virtual users (defaults to 1 without --duration)
    #[arg(long = "iterations", short = 'i', value_parser = parse_positive_u64)]
    pub iterations: Option<PositiveU64>,

    /// Keep virtual users running until this deadline (supports ms/s/m/h)
    #[arg(long = "duration", short = 'd', value_parser = parse_duration_arg)]
    pub duration: Option<Duration>,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(long = "timeout", default_value = DEFAULT_TIMEOUT, value_parser = parse_duration_arg)]
    pub request_timeout: Duration,

    /// Skip TLS certificate and hostname validation
    #[arg(
        long = "insecure-skip-tls-verify",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "true",
        default_missing_value = "true",
        value_parser = parse_bool_env
    )]
    pub insecure_skip_tls_verify: bool,

    /// Open a new connection for every request
    #[arg(
        long = "no-connection-reuse",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "true",
        default_missing_value = "true",
        value_parser = parse_bool_env
    )]
    pub no_connection_reuse: bool,

    /// Do not reuse connections across a virtual user's iterations
    #[arg(
        long = "no-vu-connection-reuse",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "true",
        default_missing_value = "true",
        value_parser = parse_bool_env
    )]
    pub no_vu_connection_reuse: bool,

    /// Allowed TLS cipher suites, IANA names, comma separated (empty allows the library defaults)
    #[arg(
        long = "tls-cipher-suites",
        value_delimiter = ',',
        default_value = DEFAULT_CIPHER_SUITE
    )]
    pub tls_cipher_suites: Vec<String>,

    /// Minimum TLS version (1.0, 1.1, 1.2, 1.3)
    #[arg(long = "tls-min", value_parser = parse_tls_version)]
    pub tls_min: Option<TlsVersion>,

    /// Maximum TLS version (1.0, 1.1, 1.2, 1.3)
    #[arg(long = "tls-max", value_parser = parse_tls_version)]
    pub tls_max: Option<TlsVersion>,

    /// Write the end-of-run summary as JSON to this path
    #[arg(long = "summary-export")]
    pub summary_export: Option<String>,

    /// Path to config file (TOML or JSON). Defaults to tlsload.toml or tlsload.json if present.
    #[arg(long = "config", short = 'c')]
    pub config: Option<String>,

    /// Enable debug logging (overridden by TLSLOAD_LOG or RUST_LOG)
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,
}
