//! Wall-time estimate for a scan, usable before committing to one.

use std::time::Duration;

use lanprobe_common::config::{MAX_THREADS_CAP, ScanConfig};

/// Worst case: every candidate waits out one full timeout.
///
/// Both ports of a host are probed at the same time, so a host costs one
/// timeout, not two. Candidates are processed `max_threads` at a time.
pub fn estimate_duration(candidate_count: usize, max_threads: usize, timeout: Duration) -> Duration {
    if candidate_count == 0 {
        return Duration::ZERO;
    }
    let threads: usize = max_threads.clamp(1, MAX_THREADS_CAP);
    let rounds: usize = candidate_count.div_ceil(threads);
    timeout.saturating_mul(u32::try_from(rounds).unwrap_or(u32::MAX))
}

/// [`estimate_duration`] with the pool size and timeout taken from `config`.
pub fn estimate_for(config: &ScanConfig, candidate_hint: usize) -> Duration {
    estimate_duration(candidate_hint, config.max_threads, config.timeout)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
