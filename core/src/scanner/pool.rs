//! Bounded worker pool draining one candidate queue.
//!
//! Workers pull from a shared queue and send every outcome over a channel.
//! The receiving side, owned by the coordinator, is the only place results
//! and counters are mutated.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lanprobe_common::network::host::{CandidateHost, DiscoveredServer};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::verifier::HostVerifier;

/// One finished verification.
#[derive(Debug, Clone)]
pub struct HostOutcome {
    pub host: CandidateHost,
    pub server: Option<DiscoveredServer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveEnd {
    /// Every candidate of the wave was verified.
    Completed,
    /// Cancellation or the deadline stopped dispatch early.
    Interrupted,
}

/// Everything a wave needs besides its candidates.
pub struct WaveContext {
    pub verifier: HostVerifier,
    /// The caller's token.
    pub cancel: CancellationToken,
    /// Child of `cancel` for one scan run. Also fired when the scan deadline
    /// passes, so it stays set for every later wave of the run.
    pub halt: CancellationToken,
    pub threads: usize,
    /// How long in-flight verifications are awaited after a stop request.
    pub straggler_grace: Duration,
    pub deadline: Option<Instant>,
}

impl WaveContext {
    fn should_stop(&self) -> bool {
        self.halt.is_cancelled()
    }
}

fn next_candidate(queue: &Mutex<VecDeque<CandidateHost>>) -> Option<CandidateHost> {
    match queue.lock() {
        Ok(mut guard) => guard.pop_front(),
        // a worker panicked while holding the lock; the queue is still usable
        Err(poisoned) => poisoned.into_inner().pop_front(),
    }
}

/// Verifies `candidates` with at most `ctx.threads` concurrent workers,
/// handing each outcome to `on_outcome` in completion order.
pub async fn run_wave<F>(candidates: Vec<CandidateHost>, ctx: &WaveContext, mut on_outcome: F) -> WaveEnd
where
    F: FnMut(HostOutcome),
{
    let total: usize = candidates.len();
    if total == 0 {
        return WaveEnd::Completed;
    }
    if ctx.should_stop() {
        return WaveEnd::Interrupted;
    }

    let queue: Arc<Mutex<VecDeque<CandidateHost>>> = Arc::new(Mutex::new(VecDeque::from(candidates)));
    let (tx, mut rx) = mpsc::unbounded_channel::<HostOutcome>();
    let mut workers: JoinSet<()> = JoinSet::new();

    for _ in 0..ctx.threads.clamp(1, total) {
        let queue = Arc::clone(&queue);
        let tx = tx.clone();
        let verifier = ctx.verifier.clone();
        let halt = ctx.halt.clone();

        workers.spawn(async move {
            loop {
                if halt.is_cancelled() {
                    break;
                }
                let Some(host) = next_candidate(&queue) else {
                    break;
                };
                let server = verifier.verify(&host).await;
                if tx.send(HostOutcome { host, server }).is_err() {
                    break;
                }
            }
        });
    }
    drop(tx);

    let mut processed: usize = 0;
    let mut stop_at: Option<Instant> = None;
    let mut all_workers_done: bool = false;

    loop {
        tokio::select! {
            outcome = rx.recv() => match outcome {
                Some(outcome) => {
                    processed += 1;
                    on_outcome(outcome);
                }
                None => {
                    all_workers_done = true;
                    break;
                }
            },
            _ = ctx.cancel.cancelled(), if stop_at.is_none() => {
                debug!("Cancellation requested, waiting up to {:?} for in-flight hosts", ctx.straggler_grace);
                stop_at = Some(Instant::now() + ctx.straggler_grace);
            },
            _ = sleep_until(ctx.deadline.unwrap_or_else(Instant::now)),
                if ctx.deadline.is_some() && !ctx.halt.is_cancelled() => {
                debug!("Scan deadline reached, no new hosts will be dispatched");
                ctx.halt.cancel();
                stop_at.get_or_insert_with(|| Instant::now() + ctx.straggler_grace);
            },
            _ = sleep_until(stop_at.unwrap_or_else(Instant::now)), if stop_at.is_some() => {
                warn!("Gave up on {} in-flight host(s) after the grace period", total.saturating_sub(processed + queued(&queue)));
                break;
            },
        }
    }

    if all_workers_done {
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!("Scan worker ended abnormally: {e}");
            }
        }
    } else {
        // stragglers finish on their own timeout; their sends will fail
        workers.detach_all();
    }

    if processed == total {
        WaveEnd::Completed
    } else {
        WaveEnd::Interrupted
    }
}

fn queued(queue: &Mutex<VecDeque<CandidateHost>>) -> usize {
    match queue.lock() {
        Ok(guard) => guard.len(),
        Err(poisoned) => poisoned.into_inner().len(),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
