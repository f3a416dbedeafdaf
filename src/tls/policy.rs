use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode, SslVersion};
use tracing::debug;

use crate::args::TlsVersion;
use crate::error::{HttpError, ValidationError};

use super::suites::{CipherSuite, resolve_suites};

/// TLS settings shared by every connection of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPolicy {
    insecure_skip_verify: bool,
    suites: Vec<CipherSuite>,
    min: Option<TlsVersion>,
    max: Option<TlsVersion>,
}

impl TlsPolicy {
    /// Resolves suite names and narrows the protocol range to what the suites
    /// can negotiate: only pre-1.3 suites cap the range at 1.2, only 1.3
    /// suites raise the floor to 1.3.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown suites, an inverted range, or a range no
    /// configured suite can be negotiated in.
    pub fn new<S: AsRef<str>>(
        insecure_skip_verify: bool,
        suite_names: &[S],
        min: Option<TlsVersion>,
        max: Option<TlsVersion>,
    ) -> Result<Self, ValidationError> {
        if let (Some(min), Some(max)) = (min, max)
            && min > max
        {
            return Err(ValidationError::TlsRangeInverted);
        }

        let suites = resolve_suites(suite_names)?;
        let (min, max) = if suites.is_empty() {
            (min, max)
        } else {
            narrow_range(&suites, min, max)?
        };

        Ok(Self {
            insecure_skip_verify,
            suites,
            min,
            max,
        })
    }

    #[must_use]
    pub const fn insecure_skip_verify(&self) -> bool {
        self.insecure_skip_verify
    }

    #[must_use]
    pub fn suites(&self) -> &[CipherSuite] {
        &self.suites
    }

    #[must_use]
    pub fn restricts_suites(&self) -> bool {
        !self.suites.is_empty()
    }

    #[must_use]
    pub const fn min_version(&self) -> Option<TlsVersion> {
        self.min
    }

    #[must_use]
    pub const fn max_version(&self) -> Option<TlsVersion> {
        self.max
    }

    /// OpenSSL cipher list for TLS 1.2 and below, colon separated, in configured order.
    #[must_use]
    pub fn cipher_list(&self) -> String {
        self.join_names(|suite| !suite.is_tls13())
    }

    /// OpenSSL TLS 1.3 ciphersuites string, colon separated, in configured order.
    #[must_use]
    pub fn tls13_ciphersuites(&self) -> String {
        self.join_names(CipherSuite::is_tls13)
    }

    fn join_names(&self, keep: impl Fn(CipherSuite) -> bool) -> String {
        self.suites
            .iter()
            .copied()
            .filter(|suite| keep(*suite))
            .map(CipherSuite::openssl_name)
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Builds the OpenSSL connector used for pinned-suite connections.
    ///
    /// # Errors
    ///
    /// Returns an error when OpenSSL rejects the cipher list or protocol bounds.
    pub fn connector(&self) -> Result<SslConnector, HttpError> {
        let mut builder = SslConnector::builder(SslMethod::tls_client())
            .map_err(|err| HttpError::BuildTlsConnector { source: err })?;

        if self.insecure_skip_verify {
            builder.set_verify(SslVerifyMode::NONE);
        }

        let cipher_list = self.cipher_list();
        if !cipher_list.is_empty() {
            builder
                .set_cipher_list(&cipher_list)
                .map_err(|err| HttpError::CipherListRejected {
                    list: cipher_list.clone(),
                    source: err,
                })?;
        }
        let tls13 = self.tls13_ciphersuites();
        if !tls13.is_empty() {
            builder
                .set_ciphersuites(&tls13)
                .map_err(|err| HttpError::CipherListRejected {
                    list: tls13.clone(),
                    source: err,
                })?;
        }

        builder
            .set_min_proto_version(self.min.map(to_ssl_version))
            .map_err(|err| HttpError::BuildTlsConnector { source: err })?;
        builder
            .set_max_proto_version(self.max.map(to_ssl_version))
            .map_err(|err| HttpError::BuildTlsConnector { source: err })?;

        debug!(
            "TLS connector: ciphers='{}' tls13='{}' min={:?} max={:?} verify={}",
            cipher_list, tls13, self.min, self.max, !self.insecure_skip_verify
        );
        Ok(builder.build())
    }
}

fn narrow_range(
    suites: &[CipherSuite],
    min: Option<TlsVersion>,
    max: Option<TlsVersion>,
) -> Result<(Option<TlsVersion>, Option<TlsVersion>), ValidationError> {
    let suites_min = suites
        .iter()
        .map(|suite| suite.min_version())
        .min()
        .unwrap_or(TlsVersion::V1_0);
    let suites_max = suites
        .iter()
        .map(|suite| suite.max_version())
        .max()
        .unwrap_or(TlsVersion::V1_3);

    let effective_min = match min {
        Some(min) => Some(min.max(suites_min)),
        None if suites_min == TlsVersion::V1_3 => Some(TlsVersion::V1_3),
        None => None,
    };
    let effective_max = match max {
        Some(max) => Some(max.min(suites_max)),
        None if suites_max < TlsVersion::V1_3 => Some(suites_max),
        None => None,
    };

    let lower = effective_min.unwrap_or(TlsVersion::V1_0);
    let upper = effective_max.unwrap_or(TlsVersion::V1_3);
    let any_usable = lower <= upper && suites.iter().any(|suite| suite.usable_within(lower, upper));
    if !any_usable {
        return Err(ValidationError::TlsRangeExcludesSuites {
            min: min.unwrap_or(TlsVersion::V1_0).as_str(),
            max: max.unwrap_or(TlsVersion::V1_3).as_str(),
        });
    }

    Ok((effective_min, effective_max))
}

const fn to_ssl_version(version: TlsVersion) -> SslVersion {
    match version {
        TlsVersion::V1_0 => SslVersion::TLS1,
        TlsVersion::V1_1 => SslVersion::TLS1_1,
        TlsVersion::V1_2 => SslVersion::TLS1_2,
        TlsVersion::V1_3 => SslVersion::TLS1_3,
    }
}
