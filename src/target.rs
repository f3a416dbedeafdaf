//! Target URL construction from scheme, host, port, and path.
use std::net::Ipv6Addr;

use url::Url;

use crate::args::Scheme;
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    scheme: Scheme,
    url: Url,
}

impl Target {
    /// Builds `<scheme>://<host>:<port><path>`.
    ///
    /// # Errors
    ///
    /// Returns an error when the host is empty, carries a scheme, path, or
    /// userinfo, or when the resulting URL does not parse.
    pub fn new(
        scheme: Scheme,
        host: Option<&str>,
        port: u16,
        path: &str,
    ) -> Result<Self, ValidationError> {
        let host = host.map(str::trim).unwrap_or_default();
        if host.is_empty() {
            return Err(ValidationError::MissingHost);
        }
        if host.contains("://")
            || host.contains(['/', '@', '?', '#'])
            || host.chars().any(char::is_whitespace)
        {
            return Err(ValidationError::InvalidHost {
                value: host.to_owned(),
            });
        }

        let authority_host = if host.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]", host)
        } else {
            host.to_owned()
        };
        let path = path.trim();
        let path = if path.starts_with('/') {
            path.to_owned()
        } else {
            format!("/{}", path)
        };

        let raw = format!("{}://{}:{}{}", scheme.as_str(), authority_host, port, path);
        let url = Url::parse(&raw).map_err(|err| ValidationError::InvalidUrl {
            url: raw.clone(),
            source: err,
        })?;
        if url.host_str().is_none() {
            return Err(ValidationError::InvalidHost {
                value: host.to_owned(),
            });
        }
        Ok(Self { scheme, url })
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub const fn is_tls(&self) -> bool {
        self.scheme.is_tls()
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}
