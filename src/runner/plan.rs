use std::path::PathBuf;
use std::time::Duration;

use crate::args::TesterArgs;
use crate::args::parsers::split_cipher_suites;
use crate::error::{AppError, AppResult, ValidationError};
use crate::http::ReusePolicy;
use crate::metrics::RunContext;
use crate::target::Target;
use crate::tls::TlsPolicy;

/// Validated, fully resolved run settings.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub target: Target,
    pub tls: TlsPolicy,
    pub reuse: ReusePolicy,
    pub vus: u64,
    /// Shared iteration budget; `None` runs until the deadline.
    pub iterations: Option<u64>,
    pub duration: Option<Duration>,
    pub request_timeout: Duration,
    pub summary_export: Option<PathBuf>,
}

impl RunPlan {
    /// # Errors
    ///
    /// Returns an error for a missing or malformed host, unknown cipher
    /// suites, an unusable TLS range, or more VUs than iterations.
    pub fn from_args(args: &TesterArgs) -> AppResult<Self> {
        let target = Target::new(args.scheme, args.host.as_deref(), args.port, &args.path)
            .map_err(AppError::validation)?;
        let suites = split_cipher_suites(&args.tls_cipher_suites);
        let tls = TlsPolicy::new(
            args.insecure_skip_tls_verify,
            &suites,
            args.tls_min,
            args.tls_max,
        )
        .map_err(AppError::validation)?;

        let vus = args.vus.get();
        let iterations = match (args.iterations, args.duration) {
            (Some(iterations), _) => Some(iterations.get()),
            (None, None) => Some(1),
            (None, Some(_)) => None,
        };
        if let Some(iterations) = iterations
            && vus > iterations
        {
            return Err(AppError::validation(ValidationError::VusExceedIterations {
                vus,
                iterations,
            }));
        }

        Ok(Self {
            target,
            tls,
            reuse: ReusePolicy::from_flags(args.no_connection_reuse, args.no_vu_connection_reuse),
            vus,
            iterations,
            duration: args.duration,
            request_timeout: args.request_timeout,
            summary_export: args.summary_export.as_ref().map(PathBuf::from),
        })
    }

    #[must_use]
    pub fn context(&self, transport: &'static str) -> RunContext {
        RunContext {
            target: self.target.to_string(),
            transport,
            connection_reuse: self.reuse.as_str(),
            vus: self.vus,
            insecure_skip_tls_verify: self.tls.insecure_skip_verify(),
            tls_cipher_suites: self
                .tls
                .suites()
                .iter()
                .map(|suite| suite.iana_name().to_owned())
                .collect(),
        }
    }
}
