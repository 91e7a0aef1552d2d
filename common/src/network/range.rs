use std::collections::HashSet;
use std::net::Ipv4Addr;

use crate::network::host::CandidateHost;
use crate::network::segment::{NetworkSegment, ScanMode, SubnetPrefix};

/// Inclusive range of IPv4 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    /// Yields nothing when `start_addr > end_addr`.
    pub fn to_iter(self) -> impl Iterator<Item = Ipv4Addr> {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        (start..=end).map(Ipv4Addr::from)
    }

    pub fn len(&self) -> usize {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        if start > end {
            0
        } else {
            (end - start) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Usable hosts of a /24: everything except the network and broadcast address.
pub fn host_range(prefix: SubnetPrefix) -> Ipv4Range {
    let net_u32: u32 = prefix.network().into();
    let broadcast_u32: u32 = net_u32 | 0xff;

    let start = Ipv4Addr::from(net_u32.saturating_add(1));
    let end = Ipv4Addr::from(broadcast_u32.saturating_sub(1));
    Ipv4Range::new(start, end)
}

fn is_host_suffix(ip: Ipv4Addr) -> bool {
    !matches!(ip.octets()[3], 0 | 255)
}

/// Builds the ordered, de-duplicated candidate list for one segment.
///
/// Local addresses inside the segment come first, in the order given. The
/// rest follows in ascending suffix order: all of 1..=254 for a FULL segment,
/// 1..=`fast_host_limit` for a FAST one. A SKIP segment yields nothing.
pub fn generate_candidates(
    segment: &NetworkSegment,
    local_addrs: &[Ipv4Addr],
    fast_host_limit: u8,
) -> Vec<CandidateHost> {
    let window: Ipv4Range = match segment.mode {
        ScanMode::Skip => return Vec::new(),
        ScanMode::Full => host_range(segment.prefix),
        ScanMode::Fast => {
            let last = fast_host_limit.min(254);
            Ipv4Range::new(segment.prefix.host(1), segment.prefix.host(last))
        }
    };

    let mut seen: HashSet<Ipv4Addr> = HashSet::new();
    let mut candidates: Vec<CandidateHost> = Vec::with_capacity(window.len() + local_addrs.len());

    for &ip in local_addrs {
        if segment.prefix.contains(ip) && is_host_suffix(ip) && seen.insert(ip) {
            candidates.push(CandidateHost::local(ip));
        }
    }

    for ip in window.to_iter() {
        if seen.insert(ip) {
            candidates.push(CandidateHost::new(ip));
        }
    }

    candidates
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
