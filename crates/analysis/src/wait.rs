//! Waiting for submitted exports.
//!
//! The default policy polls every unfinished operation with exponential
//! backoff until all are terminal or the deadline passes. The fixed policy
//! sleeps once and assumes nothing about the outcome. Both stop early when
//! the cancellation future resolves.

use std::future::Future;
use std::time::Duration;

use firerisk_cloud::{ComputeBackend, OperationState};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::export::SubmittedExport;

/// Backoff schedule for status polling.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay after the first round (default 5 s)
    pub initial_delay: Duration,
    /// Growth factor between rounds (default 2)
    pub multiplier: u32,
    /// Longest delay between rounds (default 60 s)
    pub max_delay: Duration,
    /// Give up after this long (default 30 min)
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            multiplier: 2,
            max_delay: Duration::from_secs(60),
            deadline: Duration::from_secs(30 * 60),
        }
    }
}

/// How to wait between dispatch and retrieval.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitPolicy {
    Poll(PollPolicy),
    /// Sleep for a fixed time without checking job status
    Fixed(Duration),
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy::Poll(PollPolicy::default())
    }
}

/// What became of one export.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Succeeded,
    Failed(String),
    Cancelled,
    /// Still queued or running when waiting stopped
    Pending,
    /// Never polled
    Unknown,
}

impl ExportOutcome {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_) | Self::Cancelled)
    }
}

/// Outcome of every export once waiting stops.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitReport {
    pub exports: Vec<(SubmittedExport, ExportOutcome)>,
    /// Waiting was cut short by the cancellation future
    pub interrupted: bool,
    /// The polling deadline passed with jobs still pending
    pub timed_out: bool,
}

impl WaitReport {
    pub fn all_succeeded(&self) -> bool {
        self.exports
            .iter()
            .all(|(_, outcome)| *outcome == ExportOutcome::Succeeded)
    }

    /// Names of the exports whose files should be retrieved: those known to
    /// have succeeded, plus unpolled ones when the fixed wait ran to the end.
    pub fn retrievable(&self) -> Vec<String> {
        self.exports
            .iter()
            .filter(|(_, outcome)| match outcome {
                ExportOutcome::Succeeded => true,
                ExportOutcome::Unknown => !self.interrupted,
                _ => false,
            })
            .map(|(export, _)| export.name.clone())
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&ExportOutcome) -> bool) -> usize {
        self.exports.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Wait for `exports` according to `policy`, stopping early if `cancel`
/// completes.
pub async fn wait_for_exports<C, F>(
    backend: &C,
    exports: &[SubmittedExport],
    policy: &WaitPolicy,
    cancel: F,
) -> Result<WaitReport>
where
    C: ComputeBackend,
    F: Future<Output = ()>,
{
    match policy {
        WaitPolicy::Fixed(delay) => Ok(wait_fixed(exports, *delay, cancel).await),
        WaitPolicy::Poll(poll) => wait_polling(backend, exports, poll, cancel).await,
    }
}

async fn wait_fixed<F: Future<Output = ()>>(
    exports: &[SubmittedExport],
    delay: Duration,
    cancel: F,
) -> WaitReport {
    info!("Waiting {}s for exports to complete", delay.as_secs());
    let interrupted = tokio::select! {
        _ = sleep(delay) => false,
        _ = cancel => true,
    };
    if interrupted {
        warn!("wait interrupted");
    }
    WaitReport {
        exports: exports
            .iter()
            .map(|e| (e.clone(), ExportOutcome::Unknown))
            .collect(),
        interrupted,
        timed_out: false,
    }
}

async fn wait_polling<C, F>(
    backend: &C,
    exports: &[SubmittedExport],
    policy: &PollPolicy,
    cancel: F,
) -> Result<WaitReport>
where
    C: ComputeBackend,
    F: Future<Output = ()>,
{
    let deadline = Instant::now() + policy.deadline;
    let mut outcomes = vec![ExportOutcome::Pending; exports.len()];
    let mut delay = policy.initial_delay;
    let mut interrupted = false;
    let mut timed_out = false;
    tokio::pin!(cancel);

    loop {
        tokio::select! {
            res = poll_round(backend, exports, &mut outcomes) => res?,
            _ = &mut cancel => {
                interrupted = true;
                break;
            }
        }

        let pending = outcomes.iter().filter(|o| !o.is_terminal()).count();
        if pending == 0 {
            break;
        }

        let now = Instant::now();
        if now >= deadline {
            timed_out = true;
            warn!(pending, "deadline reached with exports still running");
            break;
        }

        let nap = delay.min(deadline - now);
        info!(pending, "waiting {}s before polling again", nap.as_secs());
        tokio::select! {
            _ = sleep(nap) => {}
            _ = &mut cancel => {
                interrupted = true;
                break;
            }
        }
        delay = (delay * policy.multiplier).min(policy.max_delay);
    }

    if interrupted {
        warn!("wait interrupted");
    }
    Ok(WaitReport {
        exports: exports.iter().cloned().zip(outcomes).collect(),
        interrupted,
        timed_out,
    })
}

/// Refresh the outcome of every export that is not yet terminal
async fn poll_round<C: ComputeBackend>(
    backend: &C,
    exports: &[SubmittedExport],
    outcomes: &mut [ExportOutcome],
) -> Result<()> {
    for (export, outcome) in exports.iter().zip(outcomes.iter_mut()) {
        if outcome.is_terminal() {
            continue;
        }
        let op = backend.operation(&export.operation).await?;
        let state = op.state();
        debug!(export = %export.name, ?state, "polled");
        *outcome = match state {
            OperationState::Succeeded => {
                info!("Export finished: {}", export.name);
                ExportOutcome::Succeeded
            }
            OperationState::Failed => {
                let reason = op.failure_reason().unwrap_or_default();
                warn!("Export failed: {} ({reason})", export.name);
                ExportOutcome::Failed(reason)
            }
            OperationState::Cancelled => ExportOutcome::Cancelled,
            _ => ExportOutcome::Pending,
        };
    }
    Ok(())
}
