use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error};
use url::Url;

use crate::http::{ErrorKind, ReusePolicy, RequestError, Session, Transport};
use crate::metrics::Sample;
use crate::shutdown::ShutdownReceiver;

use super::IterationBudget;

pub(super) struct VuContext {
    pub(super) transport: Arc<dyn Transport>,
    pub(super) url: Url,
    pub(super) reuse: ReusePolicy,
    pub(super) request_timeout: Duration,
    pub(super) budget: Option<Arc<IterationBudget>>,
    pub(super) deadline: Option<Instant>,
    pub(super) samples: mpsc::Sender<Sample>,
    pub(super) shutdown_rx: ShutdownReceiver,
}

impl VuContext {
    fn next_iteration(&self, local: u64) -> Option<u64> {
        if self
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
        {
            return None;
        }
        match self.budget.as_ref() {
            Some(budget) => budget.try_reserve(),
            None => Some(local),
        }
    }
}

/// One virtual user: repeatedly reserves an iteration and issues the GET
/// until the budget, the deadline, or shutdown stops it.
pub(super) async fn run_vu(id: u64, mut context: VuContext) {
    let mut session: Option<Box<dyn Session>> = None;
    let mut local: u64 = 0;

    while let Some(iteration) = context.next_iteration(local) {
        local = local.saturating_add(1);

        if context.reuse.fresh_session_per_iteration() {
            session = None;
        }
        if session.is_none() {
            match context.transport.open_session() {
                Ok(opened) => session = Some(opened),
                Err(err) => {
                    error!("VU {} failed to open a session: {}", id, err);
                    break;
                }
            }
        }
        let Some(active) = session.as_mut() else {
            break;
        };

        let request = tokio::time::timeout(context.request_timeout, active.get(&context.url));
        let deadline = context.deadline;
        let outcome = tokio::select! {
            _ = context.shutdown_rx.recv() => {
                debug!("VU {} interrupted during iteration {}", id, iteration);
                break;
            }
            () = sleep_until_deadline(deadline) => {
                debug!("VU {} reached the deadline during iteration {}", id, iteration);
                break;
            }
            result = request => match result {
                Ok(outcome) => outcome,
                Err(_) => Err(RequestError::new(
                    ErrorKind::Timeout,
                    format!("request exceeded {:?}", context.request_timeout),
                )),
            },
        };

        // A timed out or failed exchange leaves the connection in an unknown state.
        if outcome.is_err() {
            session = None;
        }

        let sample = Sample {
            vu: id,
            iteration,
            outcome,
        };
        if context.samples.send(sample).await.is_err() {
            break;
        }
    }
    debug!("VU {} finished after {} iteration(s)", id, local);
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
