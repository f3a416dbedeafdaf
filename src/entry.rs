use std::ffi::OsString;
use std::path::Path;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::{error, info};

use tlsload::args::{HOST_ENV_VAR, TesterArgs};
use tlsload::config::{DEFAULT_CONFIG_FILES, apply_config, load_config};
use tlsload::error::{AppError, AppResult};
use tlsload::http::build_transport;
use tlsload::metrics::RunSummary;
use tlsload::runner::{RunPlan, execute};
use tlsload::shutdown::{setup_signal_shutdown_handler, shutdown_channel};

pub(crate) fn run() -> AppResult<()> {
    let (args, matches) = match parse_args()? {
        Some(parsed) => parsed,
        None => return Ok(()),
    };

    crate::logger::init_logging(args.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args, &matches)).inspect_err(|err| {
        error!("{}", err);
    })
}

fn parse_args() -> AppResult<Option<(TesterArgs, ArgMatches)>> {
    let mut cmd = TesterArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = TesterArgs::from_arg_matches(&matches)?;
    Ok(Some((args, matches)))
}

/// A bare invocation prints help unless a host can come from the
/// environment or a default config file.
fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    std::env::var_os(HOST_ENV_VAR).is_none() && !has_default_config()
}

fn has_default_config() -> bool {
    DEFAULT_CONFIG_FILES
        .iter()
        .any(|path| Path::new(path).exists())
}

async fn run_async(mut args: TesterArgs, matches: &ArgMatches) -> AppResult<()> {
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, matches, &config)?;
    }

    let plan = RunPlan::from_args(&args)?;
    let transport = build_transport(&plan.target, &plan.tls, plan.reuse)?;

    let (shutdown_tx, _) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let summary = execute(&plan, transport, &shutdown_tx).await;
    drop(shutdown_tx.send(()));
    if let Err(err) = signal_handle.await {
        tracing::debug!("Signal handler ended abnormally: {}", err);
    }
    let summary = summary?;

    print_summary(&summary);
    if let Some(path) = plan.summary_export.as_deref() {
        summary.write_json(path).map_err(AppError::metrics)?;
        info!("Summary written to {}", path.display());
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    for line in summary.summary_lines() {
        println!("{}", line);
    }
    println!();
}
