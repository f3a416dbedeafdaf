use std::time::Duration;

use serde::Deserialize;

use crate::args::parsers::parse_duration_value;
use crate::args::{Scheme, TlsVersion};
use crate::error::ValidationError;

/// Config file contents. Option names follow k6's `options` object.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub host: Option<String>,
    pub scheme: Option<Scheme>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub vus: Option<u64>,
    pub iterations: Option<u64>,
    pub duration: Option<DurationValue>,
    pub timeout: Option<DurationValue>,
    #[serde(rename = "insecureSkipTLSVerify")]
    pub insecure_skip_tls_verify: Option<bool>,
    pub no_connection_reuse: Option<bool>,
    #[serde(rename = "noVUConnectionReuse")]
    pub no_vu_connection_reuse: Option<bool>,
    pub tls_cipher_suites: Option<Vec<String>>,
    pub tls_version: Option<TlsVersionConfig>,
    pub summary_export: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlsVersionConfig {
    pub min: Option<TlsVersion>,
    pub max: Option<TlsVersion>,
}

/// Seconds as a number, or a string with a ms/s/m/h unit.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(0) => Err(ValidationError::DurationZero),
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => parse_duration_value(text),
        }
    }
}
