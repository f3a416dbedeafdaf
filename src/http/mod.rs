//! HTTP transports: an OpenSSL-backed one for pinned cipher suites and a
//! reqwest one for everything else.
mod exchange;
mod pinned;
mod pooled;
mod reuse;


use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

use crate::error::{AppError, AppResult, HttpError};
use crate::target::Target;
use crate::tls::TlsPolicy;

pub use exchange::{ErrorKind, Exchange, RequestError, Timings, TlsInfo};
pub use pinned::PinnedTlsTransport;
pub use pooled::PooledTransport;
pub use reuse::ReusePolicy;

/// Opens per-VU sessions. Sessions never share connections with each other.
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the underlying client cannot be created.
    fn open_session(&self) -> Result<Box<dyn Session>, HttpError>;

    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait Session: Send {
    /// Issues a GET and reads the whole body.
    ///
    /// # Errors
    ///
    /// Returns a classified error when DNS, connect, handshake, or the
    /// exchange itself fails.
    async fn get(&mut self, url: &Url) -> Result<Exchange, RequestError>;
}

/// Picks the transport: pinned OpenSSL when https suites are restricted,
/// reqwest otherwise.
///
/// # Errors
///
/// Returns an error when the TLS connector or HTTP client cannot be built.
pub fn build_transport(
    target: &Target,
    policy: &TlsPolicy,
    reuse: ReusePolicy,
) -> AppResult<Arc<dyn Transport>> {
    if target.is_tls() && policy.restricts_suites() {
        let transport = PinnedTlsTransport::new(policy, reuse).map_err(AppError::http)?;
        info!(
            "Using pinned TLS transport ({})",
            policy
                .suites()
                .iter()
                .map(|suite| suite.iana_name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        return Ok(Arc::new(transport));
    }

    if !target.is_tls() && policy.restricts_suites() {
        warn!("TLS cipher suites are ignored for plain http targets.");
    }
    let transport = PooledTransport::new(policy, reuse).map_err(AppError::http)?;
    info!("Using pooled HTTP transport");
    Ok(Arc::new(transport))
}
