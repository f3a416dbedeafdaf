use crate::args::TlsVersion;
use crate::error::ValidationError;

/// A cipher suite known by its IANA name and its OpenSSL name, with the
/// protocol versions it can be negotiated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSuite {
    iana: &'static str,
    openssl: &'static str,
    min_version: TlsVersion,
    max_version: TlsVersion,
}

const fn legacy(iana: &'static str, openssl: &'static str) -> CipherSuite {
    CipherSuite {
        iana,
        openssl,
        min_version: TlsVersion::V1_0,
        max_version: TlsVersion::V1_2,
    }
}

const fn tls12(iana: &'static str, openssl: &'static str) -> CipherSuite {
    CipherSuite {
        iana,
        openssl,
        min_version: TlsVersion::V1_2,
        max_version: TlsVersion::V1_2,
    }
}

const fn tls13(name: &'static str) -> CipherSuite {
    CipherSuite {
        iana: name,
        openssl: name,
        min_version: TlsVersion::V1_3,
        max_version: TlsVersion::V1_3,
    }
}

const SUPPORTED: [CipherSuite; 21] = [
    legacy("TLS_RSA_WITH_AES_128_CBC_SHA", "AES128-SHA"),
    legacy("TLS_RSA_WITH_AES_256_CBC_SHA", "AES256-SHA"),
    legacy("TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA", "ECDHE-ECDSA-AES128-SHA"),
    legacy("TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA", "ECDHE-ECDSA-AES256-SHA"),
    legacy("TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA", "ECDHE-RSA-AES128-SHA"),
    legacy("TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA", "ECDHE-RSA-AES256-SHA"),
    tls12("TLS_RSA_WITH_AES_128_CBC_SHA256", "AES128-SHA256"),
    tls12("TLS_RSA_WITH_AES_128_GCM_SHA256", "AES128-GCM-SHA256"),
    tls12("TLS_RSA_WITH_AES_256_GCM_SHA384", "AES256-GCM-SHA384"),
    tls12("TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256", "ECDHE-ECDSA-AES128-SHA256"),
    tls12("TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256", "ECDHE-RSA-AES128-SHA256"),
    tls12("TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256", "ECDHE-RSA-AES128-GCM-SHA256"),
    tls12("TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256", "ECDHE-ECDSA-AES128-GCM-SHA256"),
    tls12("TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384", "ECDHE-RSA-AES256-GCM-SHA384"),
    tls12("TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384", "ECDHE-ECDSA-AES256-GCM-SHA384"),
    tls12("TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256", "ECDHE-RSA-CHACHA20-POLY1305"),
    tls12("TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256", "ECDHE-ECDSA-CHACHA20-POLY1305"),
    legacy("TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA", "ECDHE-RSA-DES-CBC3-SHA"),
    tls13("TLS_AES_128_GCM_SHA256"),
    tls13("TLS_AES_256_GCM_SHA384"),
    tls13("TLS_CHACHA20_POLY1305_SHA256"),
];

impl CipherSuite {
    /// Looks a suite up by IANA name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCipherSuite` for names outside the supported set.
    pub fn lookup(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        SUPPORTED
            .iter()
            .find(|suite| suite.iana.eq_ignore_ascii_case(name))
            .copied()
            .ok_or_else(|| ValidationError::UnknownCipherSuite {
                name: name.to_owned(),
            })
    }

    /// Maps an OpenSSL cipher name (as reported after a handshake) back to the suite.
    #[must_use]
    pub fn from_openssl_name(name: &str) -> Option<Self> {
        SUPPORTED.iter().find(|suite| suite.openssl == name).copied()
    }

    #[must_use]
    pub const fn iana_name(self) -> &'static str {
        self.iana
    }

    #[must_use]
    pub const fn openssl_name(self) -> &'static str {
        self.openssl
    }

    #[must_use]
    pub const fn min_version(self) -> TlsVersion {
        self.min_version
    }

    #[must_use]
    pub const fn max_version(self) -> TlsVersion {
        self.max_version
    }

    #[must_use]
    pub fn is_tls13(self) -> bool {
        self.min_version == TlsVersion::V1_3
    }

    #[must_use]
    pub fn usable_within(self, min: TlsVersion, max: TlsVersion) -> bool {
        self.min_version <= max && self.max_version >= min
    }
}

impl std::fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.iana)
    }
}

/// Resolves IANA names into suites, keeping the first occurrence of duplicates.
///
/// # Errors
///
/// Returns an error for the first unknown name.
pub fn resolve_suites<S: AsRef<str>>(names: &[S]) -> Result<Vec<CipherSuite>, ValidationError> {
    let mut suites: Vec<CipherSuite> = Vec::with_capacity(names.len());
    for name in names {
        let suite = CipherSuite::lookup(name.as_ref())?;
        if !suites.contains(&suite) {
            suites.push(suite);
        }
    }
    Ok(suites)
}
