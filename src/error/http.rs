use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to build TLS connector: {source}")]
    BuildTlsConnector {
        #[source]
        source: openssl::error::ErrorStack,
    },
    #[error("OpenSSL rejected cipher list '{list}': {source}")]
    CipherListRejected {
        list: String,
        #[source]
        source: openssl::error::ErrorStack,
    },
}
