use std::fmt;
use std::time::Duration;

use crate::network::host::DiscoveredServer;

/// Lifecycle of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanState {
    Init,
    EnumeratingSegments,
    Scanning,
    Aggregating,
    Done,
    Cancelled,
}

impl ScanState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ScanState::Done | ScanState::Cancelled)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanState::Init => "INIT",
            ScanState::EnumeratingSegments => "ENUMERATING_SEGMENTS",
            ScanState::Scanning => "SCANNING",
            ScanState::Aggregating => "AGGREGATING",
            ScanState::Done => "DONE",
            ScanState::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of a running scan. A copy, never a live reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanProgress {
    /// Candidates whose verification finished.
    pub scanned: usize,
    /// Candidates across all eligible segments.
    pub total: usize,
    pub verified_count: usize,
    pub segments_done: usize,
    pub segments_total: usize,
}

impl ScanProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.scanned as f64 / self.total as f64
        }
    }
}

/// What a finished scan hands back.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Either [`ScanState::Done`] or [`ScanState::Cancelled`].
    pub state: ScanState,
    /// In verification completion order.
    pub servers: Vec<DiscoveredServer>,
    pub progress: ScanProgress,
    pub elapsed: Duration,
}

impl ScanReport {
    pub fn was_cancelled(&self) -> bool {
        self.state == ScanState::Cancelled
    }
}
