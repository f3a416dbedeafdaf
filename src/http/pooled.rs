use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use url::Url;

use crate::args::{TlsVersion, USER_AGENT};
use crate::error::HttpError;
use crate::tls::TlsPolicy;

use super::exchange::{ErrorKind, Exchange, RequestError, Timings};
use super::reuse::ReusePolicy;
use super::{Session, Transport};

/// Message prefix of hyper-util's resolver failures.
const DNS_ERROR_PREFIX: &str = "dns error";

/// reqwest-backed transport for targets without a cipher restriction.
#[derive(Debug, Clone)]
pub struct PooledTransport {
    insecure_skip_verify: bool,
    tls_min: Option<TlsVersion>,
    tls_max: Option<TlsVersion>,
    keep_alive: bool,
}

impl PooledTransport {
    /// # Errors
    ///
    /// Returns an error when reqwest cannot build a client for this policy.
    pub fn new(policy: &TlsPolicy, reuse: ReusePolicy) -> Result<Self, HttpError> {
        let transport = Self {
            insecure_skip_verify: policy.insecure_skip_verify(),
            tls_min: policy.min_version(),
            tls_max: policy.max_version(),
            keep_alive: reuse.keeps_alive(),
        };
        transport.build_client()?;
        Ok(transport)
    }

    fn build_client(&self) -> Result<Client, HttpError> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(self.insecure_skip_verify)
            .danger_accept_invalid_hostnames(self.insecure_skip_verify);

        if !self.keep_alive {
            builder = builder
                .pool_max_idle_per_host(0)
                .pool_idle_timeout(Some(Duration::from_secs(0)));
        }

        builder = apply_tls_settings(builder, self.tls_min, self.tls_max);
        builder
            .build()
            .map_err(|err| HttpError::BuildClientFailed { source: err })
    }
}

impl Transport for PooledTransport {
    fn open_session(&self) -> Result<Box<dyn Session>, HttpError> {
        Ok(Box::new(PooledSession {
            client: self.build_client()?,
            keep_alive: self.keep_alive,
        }))
    }

    fn name(&self) -> &'static str {
        "pooled"
    }
}

struct PooledSession {
    client: Client,
    keep_alive: bool,
}

#[async_trait]
impl Session for PooledSession {
    async fn get(&mut self, url: &Url) -> Result<Exchange, RequestError> {
        let started = Instant::now();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify)?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| RequestError::new(ErrorKind::Body, err))?;

        Ok(Exchange {
            status,
            bytes_received: u64::try_from(body.len()).unwrap_or(u64::MAX),
            timings: Timings {
                connecting: None,
                tls_handshaking: None,
                duration: started.elapsed(),
            },
            // reqwest hides pool reuse; only a pool without idle slots is certain.
            new_connection: (!self.keep_alive).then_some(true),
            tls: None,
        })
    }
}

fn apply_tls_settings(
    mut builder: ClientBuilder,
    min: Option<TlsVersion>,
    max: Option<TlsVersion>,
) -> ClientBuilder {
    if let Some(min) = min {
        builder = builder.min_tls_version(to_reqwest_tls_version(min));
    }
    // 1.3 is already the ceiling, and native-tls rejects it as an explicit maximum.
    if let Some(max) = max.filter(|max| *max < TlsVersion::V1_3) {
        builder = builder.max_tls_version(to_reqwest_tls_version(max));
    }
    builder
}

const fn to_reqwest_tls_version(version: TlsVersion) -> reqwest::tls::Version {
    match version {
        TlsVersion::V1_0 => reqwest::tls::Version::TLS_1_0,
        TlsVersion::V1_1 => reqwest::tls::Version::TLS_1_1,
        TlsVersion::V1_2 => reqwest::tls::Version::TLS_1_2,
        TlsVersion::V1_3 => reqwest::tls::Version::TLS_1_3,
    }
}

fn classify(err: reqwest::Error) -> RequestError {
    let kind = if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_connect() {
        classify_connect(&err)
    } else if err.is_body() || err.is_decode() {
        ErrorKind::Body
    } else {
        ErrorKind::Protocol
    };
    RequestError::new(kind, err)
}

/// Splits reqwest's connect errors by walking the source chain: hyper-util
/// reports resolver failures as `dns error`, and the TLS connector fails
/// with a `native_tls::Error`.
fn classify_connect(err: &reqwest::Error) -> ErrorKind {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if cause.is::<native_tls::Error>()
            || cause.is::<openssl::ssl::Error>()
            || cause.is::<openssl::error::ErrorStack>()
        {
            return ErrorKind::TlsHandshake;
        }
        if cause.to_string().starts_with(DNS_ERROR_PREFIX) {
            return ErrorKind::Dns;
        }
        source = cause.source();
    }
    ErrorKind::Connect
}
