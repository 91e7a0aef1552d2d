//! The **scan coordinator**: one value per scan, owning its configuration,
//! its collaborators and its cancellation handle.
//!
//! A scan walks `INIT → ENUMERATING_SEGMENTS → SCANNING → AGGREGATING → DONE`,
//! or ends in `CANCELLED` when the caller's [`CancellationToken`] fires while
//! segments are being scanned. Eligible segments are visited HIGH first.
//! Within a segment the machine's own addresses are verified as a separate
//! first wave, so a local service is found even if the scan stops early.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use lanprobe_common::config::ScanConfig;
use lanprobe_common::error::ConfigError;
use lanprobe_common::network::host::{CandidateHost, DiscoveredServer};
use lanprobe_common::network::interface::{Adapter, AdapterInspector};
use lanprobe_common::network::segment::SegmentClassifier;
use lanprobe_common::scanning::{ScanProgress, ScanReport, ScanState};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::estimate::estimate_duration;
use crate::network::identity::{HttpIdentityCheck, IdentityCheck};
use crate::network::tcp::{Prober, TcpConnectProber};
use crate::system::PnetAdapterInspector;
use crate::verifier::HostVerifier;

pub mod plan;
mod pool;

pub use plan::{PlannedSegment, ScanPlan};

use pool::{HostOutcome, WaveContext, WaveEnd, run_wave};

pub struct ScanCoordinator {
    config: ScanConfig,
    classifier: SegmentClassifier,
    inspector: Arc<dyn AdapterInspector>,
    prober: Arc<dyn Prober>,
    identity: Arc<dyn IdentityCheck>,
    cancel: CancellationToken,
    progress: Option<UnboundedSender<ScanProgress>>,
    state: ScanState,
}

impl ScanCoordinator {
    /// A coordinator wired to the real network: pnet adapter enumeration,
    /// TCP connect probes and the HTTP identity check.
    pub fn new(config: ScanConfig) -> Self {
        let identity = HttpIdentityCheck::new(config.identity.clone());
        Self {
            config,
            classifier: SegmentClassifier::default(),
            inspector: Arc::new(PnetAdapterInspector),
            prober: Arc::new(TcpConnectProber),
            identity: Arc::new(identity),
            cancel: CancellationToken::new(),
            progress: None,
            state: ScanState::Init,
        }
    }

    pub fn with_inspector(mut self, inspector: Arc<dyn AdapterInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    pub fn with_prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = prober;
        self
    }

    pub fn with_identity_check(mut self, identity: Arc<dyn IdentityCheck>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_classifier(mut self, classifier: SegmentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Snapshots are sent without waiting; a dropped receiver is ignored.
    pub fn with_progress(mut self, sink: UnboundedSender<ScanProgress>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Token that stops the next (or the running) scan.
    ///
    /// A cancelled scan consumes the token: the scan after it starts with a
    /// fresh one, so take a new handle before every run.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn classifier(&self) -> &SegmentClassifier {
        &self.classifier
    }

    /// Adapter enumeration, with failures absorbed as "no adapters".
    pub fn adapters(&self) -> Vec<Adapter> {
        match self.inspector.adapters() {
            Ok(adapters) => adapters,
            Err(e) => {
                warn!("Could not enumerate network adapters, continuing without local segments: {e:#}");
                Vec::new()
            }
        }
    }

    /// Classifies and expands segments without probing anything.
    pub fn plan(&self) -> ScanPlan {
        self.plan_for(&self.adapters())
    }

    /// Same as [`plan`](Self::plan) for adapters the caller already holds.
    pub fn plan_for(&self, adapters: &[Adapter]) -> ScanPlan {
        ScanPlan::build(adapters, &self.classifier, &self.config)
    }

    /// Worst-case wall time of a scan with the current plan.
    pub fn estimate(&self) -> Duration {
        estimate_duration(
            self.plan().candidate_count(),
            self.config.max_threads,
            self.config.timeout,
        )
    }

    fn verifier(&self) -> HostVerifier {
        HostVerifier::new(self.prober.clone(), self.identity.clone(), &self.config)
    }

    /// Verifies a single address, bypassing adapter enumeration and
    /// segment classification. Does not touch the scan state.
    pub async fn verify_host(&self, ip: Ipv4Addr) -> Result<Option<DiscoveredServer>, ConfigError> {
        self.config.validate()?;

        let server: Option<DiscoveredServer> = self.verifier().verify(&CandidateHost::new(ip)).await;
        match &server {
            Some(server) => info!("Found server at {}", server.web_url()),
            None => info!("No server answering at {ip}"),
        }
        Ok(server)
    }

    fn transition(&mut self, next: ScanState) {
        debug!("Scan state {} -> {}", self.state, next);
        self.state = next;
    }

    /// Runs one scan to completion or cancellation.
    ///
    /// The configuration is validated before any adapter is enumerated;
    /// that is the only way this can fail. Every host-level failure is
    /// absorbed. Calling it again produces a fresh result set.
    pub async fn scan(&mut self) -> Result<ScanReport, ConfigError> {
        if self.state == ScanState::Cancelled {
            debug!("Previous scan was cancelled, arming a fresh cancellation token");
            self.cancel = CancellationToken::new();
        }
        self.state = ScanState::Init;
        self.config.validate()?;

        let started: Instant = Instant::now();
        let deadline: Option<Instant> = self.config.deadline.map(|d| started + d);

        self.transition(ScanState::EnumeratingSegments);
        let plan: ScanPlan = self.plan();
        info!(
            "Scanning {} segment(s), {} candidate(s); {} segment(s) skipped",
            plan.segments.len(),
            plan.candidate_count(),
            plan.skipped.len()
        );
        for skipped in &plan.skipped {
            debug!("Skipping {} ({}/{})", skipped.prefix, skipped.tier, skipped.mode);
        }

        self.transition(ScanState::Scanning);

        let ctx = WaveContext {
            verifier: self.verifier(),
            cancel: self.cancel.clone(),
            halt: self.cancel.child_token(),
            threads: self.config.effective_threads(),
            straggler_grace: self.config.probe_bound(),
            deadline,
        };
        let mut aggregator = Aggregator::new(&plan, self.config.progress_interval, self.progress.clone());
        let mut cancelled: bool = false;

        for planned in plan.segments {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if ctx.halt.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d) {
                info!("Scan deadline reached, finishing with {} server(s)", aggregator.verified());
                break;
            }

            let local_count: usize = planned.local_count();
            let segment = planned.segment;
            let mut locals = planned.candidates;
            let rest = locals.split_off(local_count);
            debug!(
                "Segment {} ({}/{}): {} local, {} other candidate(s)",
                segment.prefix,
                segment.tier,
                segment.mode,
                locals.len(),
                rest.len()
            );

            let mut end: WaveEnd = run_wave(locals, &ctx, |o| aggregator.record(o)).await;
            if end == WaveEnd::Completed {
                end = run_wave(rest, &ctx, |o| aggregator.record(o)).await;
            }

            if end == WaveEnd::Interrupted {
                cancelled = self.cancel.is_cancelled();
                if !cancelled {
                    info!("Scan deadline reached, finishing with {} server(s)", aggregator.verified());
                }
                break;
            }

            aggregator.finish_segment();

            if self.config.fast_mode && aggregator.verified() >= self.config.fast_mode_threshold {
                info!(
                    "Fast mode: {} server(s) found, remaining segments skipped",
                    aggregator.verified()
                );
                break;
            }
        }

        if cancelled {
            self.transition(ScanState::Cancelled);
            info!("Scan cancelled with {} server(s)", aggregator.verified());
        } else {
            self.transition(ScanState::Aggregating);
        }

        let (servers, progress) = aggregator.finish();

        if !cancelled {
            self.transition(ScanState::Done);
        }

        Ok(ScanReport {
            state: self.state,
            servers,
            progress,
            elapsed: started.elapsed(),
        })
    }
}

/// Single owner of the result set and the progress counters.
struct Aggregator {
    servers: Vec<DiscoveredServer>,
    progress: ScanProgress,
    interval: usize,
    sink: Option<UnboundedSender<ScanProgress>>,
}

impl Aggregator {
    fn new(plan: &ScanPlan, interval: usize, sink: Option<UnboundedSender<ScanProgress>>) -> Self {
        let aggregator = Self {
            servers: Vec::new(),
            progress: ScanProgress {
                total: plan.candidate_count(),
                segments_total: plan.segments.len(),
                ..ScanProgress::default()
            },
            interval: interval.max(1),
            sink,
        };
        aggregator.publish();
        aggregator
    }

    fn verified(&self) -> usize {
        self.servers.len()
    }

    fn record(&mut self, outcome: HostOutcome) {
        self.progress.scanned += 1;
        if let Some(server) = outcome.server {
            let origin: &str = if outcome.host.is_local { " (this machine)" } else { "" };
            info!("Found server at {}{origin}", server.web_url());
            self.servers.push(server);
            self.progress.verified_count = self.servers.len();
        }
        if self.progress.scanned % self.interval == 0 {
            self.publish();
        }
    }

    fn finish_segment(&mut self) {
        self.progress.segments_done += 1;
        self.publish();
    }

    fn publish(&self) {
        if let Some(sink) = &self.sink {
            let _ = sink.send(self.progress);
        }
    }

    fn finish(self) -> (Vec<DiscoveredServer>, ScanProgress) {
        self.publish();
        (self.servers, self.progress)
    }
}

/// Runs one scan on the real network with the built-in classification table.
pub async fn scan(config: ScanConfig) -> Result<Vec<DiscoveredServer>, ConfigError> {
    let mut coordinator = ScanCoordinator::new(config);
    Ok(coordinator.scan().await?.servers)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
