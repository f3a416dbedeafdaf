//! Virtual-user scheduling: shared iteration budgets, deadlines, and the
//! per-VU request loop.
mod budget;
mod plan;
mod vu;


use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::http::Transport;
use crate::metrics::{RunSummary, collect};
use crate::shutdown::ShutdownSender;

pub use budget::IterationBudget;
pub use plan::RunPlan;

use vu::{VuContext, run_vu};

/// Samples buffered between VUs and the collector.
const SAMPLE_CHANNEL_CAPACITY: usize = 1024;

/// Runs every VU to completion and returns the aggregated summary.
///
/// # Errors
///
/// Returns an error if the metrics collector fails or a VU task panics.
pub async fn execute(
    plan: &RunPlan,
    transport: Arc<dyn Transport>,
    shutdown_tx: &ShutdownSender,
) -> AppResult<RunSummary> {
    let (samples_tx, samples_rx) = mpsc::channel(SAMPLE_CHANNEL_CAPACITY);
    let collector = tokio::spawn(collect(samples_rx));

    let budget = plan.iterations.map(|limit| Arc::new(IterationBudget::new(limit)));
    let deadline = plan
        .duration
        .and_then(|duration| Instant::now().checked_add(duration));

    info!(
        "Starting {} VU(s) against {} ({})",
        plan.vus,
        plan.target,
        match (plan.iterations, plan.duration) {
            (Some(iterations), Some(duration)) =>
                format!("{} iterations, max {:?}", iterations, duration),
            (Some(iterations), None) => format!("{} iterations", iterations),
            (None, Some(duration)) => format!("for {:?}", duration),
            (None, None) => "unbounded".to_owned(),
        }
    );

    let mut handles = Vec::new();
    for id in 1..=plan.vus {
        let context = VuContext {
            transport: Arc::clone(&transport),
            url: plan.target.url().clone(),
            reuse: plan.reuse,
            request_timeout: plan.request_timeout,
            budget: budget.clone(),
            deadline,
            samples: samples_tx.clone(),
            shutdown_rx: shutdown_tx.subscribe(),
        };
        handles.push(tokio::spawn(run_vu(id, context)));
    }
    drop(samples_tx);

    for result in futures_util::future::join_all(handles).await {
        if let Err(err) = result {
            warn!("VU task ended abnormally: {}", err);
        }
    }
    if let Some(budget) = budget.as_ref() {
        debug!("{} iteration(s) reserved from the shared budget", budget.reserved());
    }

    let collector = collector.await?.map_err(AppError::metrics)?;
    collector
        .finish(plan.context(transport.name()))
        .map_err(AppError::metrics)
}
