use std::net::Ipv4Addr;

use lanprobe_common::config::ScanConfig;
use lanprobe_common::network::host::CandidateHost;
use lanprobe_common::network::interface::Adapter;
use lanprobe_common::network::range::generate_candidates;
use lanprobe_common::network::segment::{NetworkSegment, SegmentClassifier, SubnetPrefix};

/// One eligible segment and the candidates it will dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSegment {
    pub segment: NetworkSegment,
    pub candidates: Vec<CandidateHost>,
}

impl PlannedSegment {
    pub fn local_count(&self) -> usize {
        self.candidates.iter().take_while(|c| c.is_local).count()
    }
}

/// Outcome of segment enumeration: what will be scanned, in order, and
/// what was classified away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPlan {
    /// Eligible segments, HIGH before MEDIUM, discovery order within a tier.
    pub segments: Vec<PlannedSegment>,
    /// LOW and SKIP segments. Never probed.
    pub skipped: Vec<NetworkSegment>,
    /// Local IPv4 addresses in adapter enumeration order.
    pub local_addrs: Vec<Ipv4Addr>,
}

impl ScanPlan {
    pub fn build(adapters: &[Adapter], classifier: &SegmentClassifier, config: &ScanConfig) -> Self {
        let mut local_addrs: Vec<Ipv4Addr> = Vec::new();
        for addr in adapters.iter().flat_map(|a| a.ipv4_addresses.iter().copied()) {
            if !local_addrs.contains(&addr) {
                local_addrs.push(addr);
            }
        }

        let mut prefixes: Vec<SubnetPrefix> = Vec::new();
        let mut push_unique = |prefix: SubnetPrefix| {
            if !prefixes.contains(&prefix) {
                prefixes.push(prefix);
            }
        };

        local_addrs.iter().copied().map(SubnetPrefix::of).for_each(&mut push_unique);
        if local_addrs.is_empty() {
            config.fallback_subnets.iter().copied().for_each(&mut push_unique);
        }
        config.supplementary_subnets.iter().copied().for_each(&mut push_unique);

        let (mut eligible, skipped): (Vec<NetworkSegment>, Vec<NetworkSegment>) = prefixes
            .into_iter()
            .map(|prefix| classifier.segment(prefix))
            .partition(NetworkSegment::is_eligible);

        // stable, so discovery order survives within a tier
        eligible.sort_by_key(|segment| segment.tier);

        let segments: Vec<PlannedSegment> = eligible
            .into_iter()
            .map(|segment| PlannedSegment {
                candidates: generate_candidates(&segment, &local_addrs, config.fast_host_limit),
                segment,
            })
            .collect();

        Self {
            segments,
            skipped,
            local_addrs,
        }
    }

    pub fn candidate_count(&self) -> usize {
        self.segments.iter().map(|s| s.candidates.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.candidate_count() == 0
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
