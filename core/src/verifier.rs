use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use lanprobe_common::config::{ScanConfig, ServicePorts};
use lanprobe_common::network::host::{CandidateHost, DiscoveredServer, ProbeResult};
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::network::identity::IdentityCheck;
use crate::network::tcp::Prober;

/// Decides whether one candidate runs the expected service.
///
/// Both service ports are probed at the same time. Only when both are open
/// is the identity request sent, to the primary port. Every failure along
/// the way is absorbed and reported as `None`.
#[derive(Clone)]
pub struct HostVerifier {
    prober: Arc<dyn Prober>,
    identity: Arc<dyn IdentityCheck>,
    ports: ServicePorts,
    timeout: Duration,
    grace: Duration,
}

impl HostVerifier {
    pub fn new(prober: Arc<dyn Prober>, identity: Arc<dyn IdentityCheck>, config: &ScanConfig) -> Self {
        Self {
            prober,
            identity,
            ports: config.ports,
            timeout: config.timeout,
            grace: config.grace,
        }
    }

    /// Upper bound for a single suspension point.
    fn bound(&self) -> Duration {
        self.timeout + self.grace
    }

    /// Guards against a prober that ignores its own timeout.
    async fn bounded_probe(&self, ip: Ipv4Addr, port: u16) -> ProbeResult {
        match timeout(self.bound(), self.prober.probe(ip, port, self.timeout)).await {
            Ok(result) => result,
            Err(_) => ProbeResult::closed(ip, port, self.bound()),
        }
    }

    pub async fn verify(&self, host: &CandidateHost) -> Option<DiscoveredServer> {
        let ip: Ipv4Addr = host.ip;

        let (primary, secondary) = tokio::join!(
            self.bounded_probe(ip, self.ports.primary),
            self.bounded_probe(ip, self.ports.secondary)
        );

        if !(primary.port_open && secondary.port_open) {
            trace!(
                "{ip} rejected: {}={} {}={}",
                primary.port,
                if primary.port_open { "open" } else { "closed" },
                secondary.port,
                if secondary.port_open { "open" } else { "closed" },
            );
            return None;
        }

        match timeout(self.bound(), self.identity.confirm(ip, self.ports.primary, self.timeout)).await {
            Ok(Ok(())) => {
                debug!("{ip} verified on ports {} and {}", self.ports.primary, self.ports.secondary);
                Some(DiscoveredServer::new(ip, self.ports.primary, self.ports.secondary))
            }
            Ok(Err(e)) => {
                debug!("{ip} has both ports open but failed the identity check: {e}");
                None
            }
            Err(_) => {
                debug!("{ip} identity check did not finish within {:?}", self.bound());
                None
            }
        }
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
