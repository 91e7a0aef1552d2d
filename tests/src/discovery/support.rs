use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use lanprobe_common::config::ScanConfig;
use lanprobe_common::network::host::ProbeResult;
use lanprobe_common::network::interface::{Adapter, AdapterInspector};
use lanprobe_common::network::segment::{ClassificationRule, PriorityTier, ScanMode, SegmentClassifier};
use lanprobe_core::{CancellationToken, IdentityCheck, IdentityError, Prober};

pub struct FakeInspector {
    adapters: Option<Vec<Adapter>>,
    pub calls: AtomicUsize,
}

impl FakeInspector {
    pub fn with(adapters: Vec<Adapter>) -> Self {
        Self {
            adapters: Some(adapters),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            adapters: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AdapterInspector for FakeInspector {
    fn adapters(&self) -> anyhow::Result<Vec<Adapter>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.adapters {
            Some(adapters) => Ok(adapters.clone()),
            None => anyhow::bail!("adapter enumeration is not permitted here"),
        }
    }
}

/// Reports open only the `(ip, port)` pairs it was given. Closed ports take
/// the full probe timeout, like a filtered host would.
#[derive(Default)]
pub struct FakeProber {
    open: HashSet<(Ipv4Addr, u16)>,
    pub probed: Mutex<Vec<Ipv4Addr>>,
    cancel_trigger: Option<Ipv4Addr>,
    pub cancel: OnceLock<CancellationToken>,
}

impl FakeProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both service ports open on `ip`.
    pub fn server(mut self, ip: Ipv4Addr, config: &ScanConfig) -> Self {
        self.open.insert((ip, config.ports.primary));
        self.open.insert((ip, config.ports.secondary));
        self
    }

    pub fn port(mut self, ip: Ipv4Addr, port: u16) -> Self {
        self.open.insert((ip, port));
        self
    }

    /// Fires the cancel handle once `ip` is probed.
    pub fn cancel_at(mut self, ip: Ipv4Addr) -> Self {
        self.cancel_trigger = Some(ip);
        self
    }

    pub fn probed(&self) -> Vec<Ipv4Addr> {
        self.probed.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Prober for FakeProber {
    async fn probe(&self, ip: Ipv4Addr, port: u16, probe_timeout: Duration) -> ProbeResult {
        if let Ok(mut probed) = self.probed.lock() {
            probed.push(ip);
        }
        if self.cancel_trigger == Some(ip) {
            if let Some(cancel) = self.cancel.get() {
                cancel.cancel();
            }
        }

        let port_open = self.open.contains(&(ip, port));
        if !port_open {
            tokio::time::sleep(probe_timeout).await;
        }
        ProbeResult {
            ip,
            port,
            port_open,
            elapsed: if port_open { Duration::ZERO } else { probe_timeout },
        }
    }
}

pub struct FakeIdentity {
    accept: bool,
    pub calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn accepting() -> Self {
        Self {
            accept: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityCheck for FakeIdentity {
    async fn confirm(&self, _ip: Ipv4Addr, _port: u16, _timeout: Duration) -> Result<(), IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.accept {
            Ok(())
        } else {
            Err(IdentityError::Mismatch("fake"))
        }
    }
}

pub fn rule(pattern: &str, tier: PriorityTier, mode: ScanMode) -> ClassificationRule {
    ClassificationRule {
        pattern: pattern.parse().unwrap(),
        tier,
        mode: Some(mode),
        note: None,
    }
}

/// Every `10.*` prefix is HIGH and scanned in FAST mode, so a segment
/// yields exactly `fast_host_limit` candidates.
pub fn fast_ten_classifier() -> SegmentClassifier {
    SegmentClassifier::new(vec![rule("10", PriorityTier::High, ScanMode::Fast)])
}

/// Quick probes, no fallback subnets, one worker.
pub fn base_config() -> ScanConfig {
    ScanConfig {
        timeout: Duration::from_millis(50),
        max_threads: 1,
        fast_host_limit: 10,
        fallback_subnets: Vec::new(),
        ..ScanConfig::default()
    }
}
