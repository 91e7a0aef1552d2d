//! Scan configuration and the optional TOML settings file.
//!
//! ```toml
//! [scan]
//! timeout_secs = 1.5
//! max_threads = 100
//! fast_mode = true
//! supplementary_subnets = ["192.168.50"]
//!
//! [[segment]]
//! pattern = "172.17"
//! tier = "low"
//! note = "docker0"
//!
//! [[segment]]
//! pattern = "192.168"
//! tier = "high"
//! ```
//!
//! Fields missing from `[scan]` keep their defaults. A non-empty list of
//! `[[segment]]` rules replaces the built-in classification table.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::network::segment::{ClassificationRule, SegmentClassifier, SubnetPrefix};

/// Worker pool size is never allowed past this, whatever the caller asks for.
pub const MAX_THREADS_CAP: usize = 150;

pub const DEFAULT_PRIMARY_PORT: u16 = 7860;
pub const DEFAULT_SECONDARY_PORT: u16 = 9880;

/// The two ports that make up the service signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServicePorts {
    /// Web/API port, also the target of the identity check.
    pub primary: u16,
    /// Synthesis port.
    pub secondary: u16,
}

impl Default for ServicePorts {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY_PORT,
            secondary: DEFAULT_SECONDARY_PORT,
        }
    }
}

/// What the identity request asks for and what it expects back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    /// API-listing endpoint requested on the primary port.
    pub path: String,
    /// Endpoint that must be listed under `named_endpoints`, if any.
    pub expected_endpoint: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            path: "/info".to_string(),
            expected_endpoint: Some("/change_choices".to_string()),
        }
    }
}

/// Settings for one scan. Immutable once the scan starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Bound for every probe and for the identity request.
    pub timeout: Duration,
    /// Worker pool size, capped at [`MAX_THREADS_CAP`].
    pub max_threads: usize,
    /// Stop after the segment in which `fast_mode_threshold` servers were reached.
    pub fast_mode: bool,
    pub fast_mode_threshold: usize,
    /// Size of the host window scanned in FAST segments.
    pub fast_host_limit: u8,
    pub ports: ServicePorts,
    pub identity: IdentityConfig,
    /// Added to `timeout` to absorb scheduling jitter.
    pub grace: Duration,
    /// Stop dispatching once this much time has passed.
    pub deadline: Option<Duration>,
    /// Emit a progress snapshot every this many processed candidates.
    pub progress_interval: usize,
    /// Always classified, in addition to the adapters' subnets.
    pub supplementary_subnets: Vec<SubnetPrefix>,
    /// Classified only when the adapters yield no subnet at all.
    pub fallback_subnets: Vec<SubnetPrefix>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            max_threads: 50,
            fast_mode: false,
            fast_mode_threshold: 2,
            fast_host_limit: 50,
            ports: ServicePorts::default(),
            identity: IdentityConfig::default(),
            grace: Duration::from_millis(500),
            deadline: None,
            progress_interval: 20,
            supplementary_subnets: Vec::new(),
            fallback_subnets: vec![
                SubnetPrefix::new(192, 168, 1),
                SubnetPrefix::new(192, 168, 0),
                SubnetPrefix::new(10, 0, 0),
            ],
        }
    }
}

impl ScanConfig {
    /// Checks the invariants a scan relies on. Performs no I/O.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_threads == 0 {
            return Err(ConfigError::NoThreads);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(0.0));
        }
        if self.fast_mode_threshold == 0 {
            return Err(ConfigError::InvalidThreshold);
        }
        if self.progress_interval == 0 {
            return Err(ConfigError::InvalidProgressInterval);
        }
        if self.ports.primary == self.ports.secondary {
            return Err(ConfigError::SamePorts(self.ports.primary));
        }
        Ok(())
    }

    /// Pool size actually used.
    pub fn effective_threads(&self) -> usize {
        self.max_threads.clamp(1, MAX_THREADS_CAP)
    }

    /// Longest a single probe or identity request may take.
    pub fn probe_bound(&self) -> Duration {
        self.timeout + self.grace
    }

    pub fn set_timeout_secs(&mut self, secs: f64) -> Result<(), ConfigError> {
        self.timeout = timeout_from_secs(secs)?;
        Ok(())
    }
}

/// Rejects zero, negative and non-finite values.
pub fn timeout_from_secs(secs: f64) -> Result<Duration, ConfigError> {
    if !(secs.is_finite() && secs > 0.0) {
        return Err(ConfigError::InvalidTimeout(secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidTimeout(secs))
}

/// `[scan]` table of the settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanSection {
    pub timeout_secs: Option<f64>,
    pub max_threads: Option<usize>,
    pub fast_mode: Option<bool>,
    pub fast_mode_threshold: Option<usize>,
    pub fast_host_limit: Option<u8>,
    pub primary_port: Option<u16>,
    pub secondary_port: Option<u16>,
    pub identity_path: Option<String>,
    pub expected_endpoint: Option<String>,
    pub grace_ms: Option<u64>,
    pub deadline_secs: Option<f64>,
    pub progress_interval: Option<usize>,
    pub supplementary_subnets: Option<Vec<SubnetPrefix>>,
    pub fallback_subnets: Option<Vec<SubnetPrefix>>,
}

/// Contents of a settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub scan: ScanSection,
    #[serde(default, rename = "segment")]
    pub segments: Vec<ClassificationRule>,
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading settings from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by whatever the `[scan]` table sets.
    pub fn scan_config(&self) -> Result<ScanConfig, ConfigError> {
        let section = &self.scan;
        let mut cfg = ScanConfig::default();

        if let Some(secs) = section.timeout_secs {
            cfg.set_timeout_secs(secs)?;
        }
        if let Some(threads) = section.max_threads {
            cfg.max_threads = threads;
        }
        if let Some(fast) = section.fast_mode {
            cfg.fast_mode = fast;
        }
        if let Some(threshold) = section.fast_mode_threshold {
            cfg.fast_mode_threshold = threshold;
        }
        if let Some(limit) = section.fast_host_limit {
            cfg.fast_host_limit = limit;
        }
        if let Some(port) = section.primary_port {
            cfg.ports.primary = port;
        }
        if let Some(port) = section.secondary_port {
            cfg.ports.secondary = port;
        }
        if let Some(path) = &section.identity_path {
            cfg.identity.path = path.clone();
        }
        if let Some(endpoint) = &section.expected_endpoint {
            // an empty string disables the endpoint requirement
            cfg.identity.expected_endpoint = (!endpoint.is_empty()).then(|| endpoint.clone());
        }
        if let Some(ms) = section.grace_ms {
            cfg.grace = Duration::from_millis(ms);
        }
        if let Some(secs) = section.deadline_secs {
            cfg.deadline = Some(timeout_from_secs(secs)?);
        }
        if let Some(interval) = section.progress_interval {
            cfg.progress_interval = interval;
        }
        if let Some(subnets) = &section.supplementary_subnets {
            cfg.supplementary_subnets = subnets.clone();
        }
        if let Some(subnets) = &section.fallback_subnets {
            cfg.fallback_subnets = subnets.clone();
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// The file's rule table, or the built-in one when the file has none.
    pub fn classifier(&self) -> SegmentClassifier {
        if self.segments.is_empty() {
            SegmentClassifier::default()
        } else {
            SegmentClassifier::new(self.segments.clone())
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
