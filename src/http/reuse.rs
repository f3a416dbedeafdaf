/// How long a VU keeps a connection around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReusePolicy {
    /// Every request opens a new connection.
    PerRequest,
    /// Connections live for one iteration of a VU.
    PerIteration,
    /// Connections live as long as the VU.
    PerVu,
}

impl ReusePolicy {
    #[must_use]
    pub const fn from_flags(no_connection_reuse: bool, no_vu_connection_reuse: bool) -> Self {
        if no_connection_reuse {
            ReusePolicy::PerRequest
        } else if no_vu_connection_reuse {
            ReusePolicy::PerIteration
        } else {
            ReusePolicy::PerVu
        }
    }

    /// Whether a session may hold a connection open after a request.
    #[must_use]
    pub const fn keeps_alive(self) -> bool {
        !matches!(self, ReusePolicy::PerRequest)
    }

    /// Whether a VU must start a fresh session for every iteration.
    #[must_use]
    pub const fn fresh_session_per_iteration(self) -> bool {
        !matches!(self, ReusePolicy::PerVu)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ReusePolicy::PerRequest => "per-request",
            ReusePolicy::PerIteration => "per-iteration",
            ReusePolicy::PerVu => "per-vu",
        }
    }
}
