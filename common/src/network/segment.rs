//! # Segment Classification
//!
//! Maps a /24 subnet prefix to a [`PriorityTier`] and a recommended [`ScanMode`].
//!
//! Which ranges count as "real LAN" and which belong to containers, VPNs or
//! virtual adapters drifts across machines, so the mapping is a rule table
//! ([`ClassificationRule`]) that can be replaced from a settings file. Rules are
//! evaluated in order and the first match wins. A prefix that matches nothing
//! classifies as [`PriorityTier::Medium`] / [`ScanMode::Fast`].

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// A /24 IPv4 prefix such as `192.168.1`, treated as one scanning unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct SubnetPrefix([u8; 3]);

impl SubnetPrefix {
    pub const fn new(a: u8, b: u8, c: u8) -> Self {
        Self([a, b, c])
    }

    /// The prefix an address belongs to.
    pub fn of(ip: Ipv4Addr) -> Self {
        let [a, b, c, _] = ip.octets();
        Self([a, b, c])
    }

    pub fn octets(&self) -> [u8; 3] {
        self.0
    }

    pub fn host(&self, suffix: u8) -> Ipv4Addr {
        let [a, b, c] = self.0;
        Ipv4Addr::new(a, b, c, suffix)
    }

    pub fn network(&self) -> Ipv4Addr {
        self.host(0)
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        Self::of(ip) == *self
    }
}

impl fmt::Display for SubnetPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a}.{b}.{c}")
    }
}

impl FromStr for SubnetPrefix {
    type Err = ConfigError;

    /// Accepts `a.b.c`, a full address (`a.b.c.d`, whose /24 is taken) or
    /// CIDR notation with a /24 prefix (`a.b.c.0/24`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidPrefix(s.to_string());
        let trimmed = s.trim();

        let addr_part = match trimmed.split_once('/') {
            Some((addr, "24")) => addr,
            Some(_) => return Err(invalid()),
            None => trimmed,
        };

        if let Ok(ip) = addr_part.parse::<Ipv4Addr>() {
            return Ok(Self::of(ip));
        }

        let octets: Vec<u8> = addr_part
            .split('.')
            .map(str::parse::<u8>)
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;

        match octets.as_slice() {
            [a, b, c] => Ok(Self([*a, *b, *c])),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for SubnetPrefix {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Likelihood that a segment hosts real LAN devices.
///
/// Declared from most to least likely, so sorting ascending visits `High` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    High,
    Medium,
    Low,
}

impl PriorityTier {
    pub fn default_mode(self) -> ScanMode {
        match self {
            PriorityTier::High => ScanMode::Full,
            PriorityTier::Medium => ScanMode::Fast,
            PriorityTier::Low => ScanMode::Skip,
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriorityTier::High => "HIGH",
            PriorityTier::Medium => "MEDIUM",
            PriorityTier::Low => "LOW",
        };
        f.write_str(s)
    }
}

/// Per-segment scanning policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Every host of the /24.
    Full,
    /// Local addresses plus a reduced window of low host suffixes.
    Fast,
    /// Never scanned.
    Skip,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanMode::Full => "FULL",
            ScanMode::Fast => "FAST",
            ScanMode::Skip => "SKIP",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkSegment {
    pub prefix: SubnetPrefix,
    pub tier: PriorityTier,
    pub mode: ScanMode,
}

impl NetworkSegment {
    /// LOW and SKIP segments are never scanned.
    pub fn is_eligible(&self) -> bool {
        self.tier != PriorityTier::Low && self.mode != ScanMode::Skip
    }
}

/// Matches a single octet of a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OctetMatch {
    Any,
    Exact(u8),
    Range(u8, u8),
}

impl OctetMatch {
    fn matches(&self, octet: u8) -> bool {
        match *self {
            OctetMatch::Any => true,
            OctetMatch::Exact(v) => v == octet,
            OctetMatch::Range(lo, hi) => (lo..=hi).contains(&octet),
        }
    }
}

/// Up to three octet matchers, e.g. `172.16-31` or `10.*.5`.
///
/// Octets not spelled out match anything.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct PrefixPattern {
    octets: Vec<OctetMatch>,
}

impl PrefixPattern {
    pub fn new(octets: Vec<OctetMatch>) -> Self {
        Self { octets }
    }

    pub fn matches(&self, prefix: &SubnetPrefix) -> bool {
        self.octets
            .iter()
            .zip(prefix.octets())
            .all(|(matcher, octet)| matcher.matches(octet))
    }
}

impl FromStr for PrefixPattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidPattern {
            pattern: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(invalid("expected one to three dot-separated octets"));
        }

        let mut octets = Vec::with_capacity(parts.len());
        for part in parts {
            let matcher = if part == "*" {
                OctetMatch::Any
            } else if let Some((lo, hi)) = part.split_once('-') {
                let lo: u8 = lo.parse().map_err(|_| invalid("bad range start"))?;
                let hi: u8 = hi.parse().map_err(|_| invalid("bad range end"))?;
                if lo > hi {
                    return Err(invalid("range start exceeds range end"));
                }
                OctetMatch::Range(lo, hi)
            } else {
                OctetMatch::Exact(part.parse().map_err(|_| invalid("octet is not 0-255"))?)
            };
            octets.push(matcher);
        }

        Ok(Self { octets })
    }
}

impl TryFrom<String> for PrefixPattern {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for PrefixPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .octets
            .iter()
            .map(|m| match m {
                OctetMatch::Any => "*".to_string(),
                OctetMatch::Exact(v) => v.to_string(),
                OctetMatch::Range(lo, hi) => format!("{lo}-{hi}"),
            })
            .collect();
        f.write_str(&parts.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClassificationRule {
    pub pattern: PrefixPattern,
    pub tier: PriorityTier,
    /// Overrides [`PriorityTier::default_mode`].
    #[serde(default)]
    pub mode: Option<ScanMode>,
    #[serde(default)]
    pub note: Option<String>,
}

impl ClassificationRule {
    fn builtin(octets: &[OctetMatch], tier: PriorityTier, note: &str) -> Self {
        Self {
            pattern: PrefixPattern::new(octets.to_vec()),
            tier,
            mode: None,
            note: Some(note.to_string()),
        }
    }

    pub fn mode(&self) -> ScanMode {
        self.mode.unwrap_or_else(|| self.tier.default_mode())
    }
}

/// First-match-wins rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentClassifier {
    rules: Vec<ClassificationRule>,
}

impl Default for SegmentClassifier {
    fn default() -> Self {
        use OctetMatch::{Exact, Range};
        use PriorityTier::{High, Low, Medium};

        let rules = vec![
            // Virtual, container and VPN ranges have to come before the
            // private ranges that contain them.
            ClassificationRule::builtin(&[Exact(127)], Low, "loopback"),
            ClassificationRule::builtin(&[Exact(172), Exact(17)], Low, "docker0 bridge"),
            ClassificationRule::builtin(&[Exact(192), Exact(168), Exact(56)], Low, "VirtualBox host-only"),
            ClassificationRule::builtin(&[Exact(192), Exact(168), Exact(99)], Low, "docker-machine"),
            ClassificationRule::builtin(&[Exact(10), Exact(0), Exact(75)], Low, "Docker for Windows"),
            ClassificationRule::builtin(&[Exact(10), Exact(8), Exact(0)], Low, "OpenVPN default"),
            ClassificationRule::builtin(&[Exact(198), Range(18, 19)], Low, "benchmarking"),
            ClassificationRule::builtin(&[Exact(192), Exact(168)], High, "private LAN"),
            ClassificationRule::builtin(&[Exact(10)], High, "private LAN"),
            ClassificationRule::builtin(&[Exact(172), Range(16, 31)], High, "private LAN"),
            ClassificationRule::builtin(&[Exact(100), Range(64, 127)], Medium, "carrier-grade NAT"),
            ClassificationRule::builtin(&[Exact(169), Exact(254)], Medium, "link-local"),
        ];

        Self { rules }
    }
}

impl SegmentClassifier {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    /// Total: every prefix gets exactly one tier and mode.
    pub fn classify(&self, prefix: &SubnetPrefix) -> (PriorityTier, ScanMode) {
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(prefix))
            .map(|rule| (rule.tier, rule.mode()))
            .unwrap_or((PriorityTier::Medium, ScanMode::Fast))
    }

    pub fn segment(&self, prefix: SubnetPrefix) -> NetworkSegment {
        let (tier, mode) = self.classify(&prefix);
        NetworkSegment { prefix, tier, mode }
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
