use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{PositiveU64, TesterArgs};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments. Flags given on the command
/// line win; config values win over environment variables and defaults.
///
/// # Errors
///
/// Returns an error when a config value is out of range.
pub fn apply_config(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "host")
        && let Some(host) = config.host.clone()
    {
        args.host = Some(host);
    }

    if !is_cli(matches, "scheme")
        && let Some(scheme) = config.scheme
    {
        args.scheme = scheme;
    }

    if !is_cli(matches, "port")
        && let Some(port) = config.port
    {
        args.port = port;
    }

    if !is_cli(matches, "path")
        && let Some(path) = config.path.clone()
    {
        args.path = path;
    }

    if !is_cli(matches, "vus")
        && let Some(vus) = config.vus
    {
        args.vus = ensure_positive_u64(vus, "vus")?;
    }

    if !is_cli(matches, "iterations")
        && let Some(iterations) = config.iterations
    {
        args.iterations = Some(ensure_positive_u64(iterations, "iterations")?);
    }

    if !is_cli(matches, "duration")
        && let Some(duration) = config.duration.as_ref()
    {
        args.duration = Some(duration.to_duration().map_err(|err| field_error("duration", err))?);
    }

    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.request_timeout = timeout
            .to_duration()
            .map_err(|err| field_error("timeout", err))?;
    }

    if !is_cli(matches, "insecure_skip_tls_verify")
        && let Some(insecure) = config.insecure_skip_tls_verify
    {
        args.insecure_skip_tls_verify = insecure;
    }

    if !is_cli(matches, "no_connection_reuse")
        && let Some(no_reuse) = config.no_connection_reuse
    {
        args.no_connection_reuse = no_reuse;
    }

    if !is_cli(matches, "no_vu_connection_reuse")
        && let Some(no_reuse) = config.no_vu_connection_reuse
    {
        args.no_vu_connection_reuse = no_reuse;
    }

    if !is_cli(matches, "tls_cipher_suites")
        && let Some(suites) = config.tls_cipher_suites.clone()
    {
        args.tls_cipher_suites = suites;
    }

    if let Some(version) = config.tls_version.as_ref() {
        if !is_cli(matches, "tls_min")
            && let Some(min) = version.min
        {
            args.tls_min = Some(min);
        }
        if !is_cli(matches, "tls_max")
            && let Some(max) = version.max
        {
            args.tls_max = Some(max);
        }
    }

    if !is_cli(matches, "summary_export")
        && let Some(path) = config.summary_export.clone()
    {
        args.summary_export = Some(path);
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn ensure_positive_u64(value: u64, field: &'static str) -> AppResult<PositiveU64> {
    PositiveU64::try_from(value).map_err(|err| field_error(field, err))
}

fn field_error(field: &'static str, source: ValidationError) -> AppError {
    AppError::config(ConfigError::InvalidField { field, source })
}
