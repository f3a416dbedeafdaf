use std::time::Duration;

use serde::Serialize;

/// One completed request/response exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub status: u16,
    pub bytes_received: u64,
    pub timings: Timings,
    /// Whether the request opened its connection; `None` when the client
    /// does not expose pool reuse.
    pub new_connection: Option<bool>,
    pub tls: Option<TlsInfo>,
}

impl Exchange {
    /// Statuses in 200..=399 count as successful, as k6 does by default.
    #[must_use]
    pub const fn is_expected_status(&self) -> bool {
        self.status >= 200 && self.status < 400
    }
}

/// `duration` covers sending, waiting, and receiving. Transports that
/// observe connection setup report it separately and leave it out of
/// `duration`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timings {
    pub connecting: Option<Duration>,
    pub tls_handshaking: Option<Duration>,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsInfo {
    pub version: String,
    pub cipher: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Dns,
    Connect,
    TlsHandshake,
    Timeout,
    Protocol,
    Body,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Dns => "dns",
            ErrorKind::Connect => "connect",
            ErrorKind::TlsHandshake => "tls_handshake",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Body => "body",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct RequestError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RequestError {
    pub fn new(kind: ErrorKind, message: impl std::fmt::Display) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}
