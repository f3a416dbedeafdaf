use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(
        "Missing target host. Set HELLONGINX_SERVICE_HOST, pass --host, or set 'host' in config."
    )]
    MissingHost,
    #[error("Invalid host '{value}'. Expected a hostname or IP address without scheme or path.")]
    InvalidHost { value: String },
    #[error("Invalid scheme '{value}'. Use http or https.")]
    InvalidScheme { value: String },
    #[error("Invalid target URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid boolean '{value}'. Expected true/false, yes/no, on/off, or 1/0.")]
    InvalidBoolean { value: String },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Invalid TLS version '{value}'. Use 1.0, 1.1, 1.2, or 1.3.")]
    InvalidTlsVersion { value: String },
    #[error("tls-min must be <= tls-max.")]
    TlsRangeInverted,
    #[error("Unknown TLS cipher suite '{name}'.")]
    UnknownCipherSuite { name: String },
    #[error("TLS version range {min}..={max} excludes every configured cipher suite.")]
    TlsRangeExcludesSuites {
        min: &'static str,
        max: &'static str,
    },
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("vus ({vus}) can't be more than iterations ({iterations}).")]
    VusExceedIterations { vus: u64, iterations: u64 },
}
