use std::net::Ipv4Addr;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// One address queued for probing within an eligible segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidateHost {
    pub ip: Ipv4Addr,
    /// True when the address belongs to one of this machine's adapters.
    pub is_local: bool,
}

impl CandidateHost {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self { ip, is_local: false }
    }

    pub fn local(ip: Ipv4Addr) -> Self {
        Self { ip, is_local: true }
    }
}

/// Outcome of a single bounded-timeout TCP connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub ip: Ipv4Addr,
    pub port: u16,
    pub port_open: bool,
    pub elapsed: Duration,
}

impl ProbeResult {
    pub fn closed(ip: Ipv4Addr, port: u16, elapsed: Duration) -> Self {
        Self { ip, port, port_open: false, elapsed }
    }
}

/// A host that answered on both service ports and passed the identity check.
///
/// Created once at verification time and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredServer {
    ip: Ipv4Addr,
    primary_port: u16,
    secondary_port: u16,
    verified_at: DateTime<Utc>,
}

impl DiscoveredServer {
    pub fn new(ip: Ipv4Addr, primary_port: u16, secondary_port: u16) -> Self {
        Self {
            ip,
            primary_port,
            secondary_port,
            verified_at: Utc::now(),
        }
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn primary_port(&self) -> u16 {
        self.primary_port
    }

    pub fn secondary_port(&self) -> u16 {
        self.secondary_port
    }

    pub fn verified_at(&self) -> DateTime<Utc> {
        self.verified_at
    }

    /// Base URL of the service's web interface.
    pub fn web_url(&self) -> String {
        format!("http://{}:{}/", self.ip, self.primary_port)
    }
}
