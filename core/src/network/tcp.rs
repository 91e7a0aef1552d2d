use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lanprobe_common::network::host::ProbeResult;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Checks whether one TCP port on one host answers within a timeout.
///
/// Implementations never fail: timeouts, refusals and routing errors all
/// come back as `port_open == false`.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, ip: Ipv4Addr, port: u16, probe_timeout: Duration) -> ProbeResult;
}

/// Plain TCP connect probe. The connection is dropped as soon as it is made.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnectProber;

#[async_trait]
impl Prober for TcpConnectProber {
    async fn probe(&self, ip: Ipv4Addr, port: u16, probe_timeout: Duration) -> ProbeResult {
        let socket_addr: SocketAddr = SocketAddr::new(IpAddr::V4(ip), port);
        let start: Instant = Instant::now();

        let port_open: bool = match timeout(probe_timeout, TcpStream::connect(socket_addr)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                trace!("{socket_addr} refused or unreachable: {e}");
                false
            }
            Err(_elapsed) => {
                trace!("{socket_addr} timed out after {probe_timeout:?}");
                false
            }
        };

        ProbeResult {
            ip,
            port,
            port_open,
            elapsed: start.elapsed(),
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
