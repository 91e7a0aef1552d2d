use std::path::PathBuf;

use thiserror::Error;

/// The only failure a scan reports to its caller.
///
/// Everything else (unreachable hosts, refused connections, identity
/// mismatches, adapter enumeration failures) is absorbed by the scanner.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_threads must be greater than zero")]
    NoThreads,

    #[error("timeout must be a positive number of seconds, got {0}")]
    InvalidTimeout(f64),

    #[error("fast_mode_threshold must be greater than zero")]
    InvalidThreshold,

    #[error("progress_interval must be greater than zero")]
    InvalidProgressInterval,

    #[error("primary and secondary service ports must differ (both are {0})")]
    SamePorts(u16),

    #[error("invalid subnet prefix '{0}': expected three octets such as 192.168.1")]
    InvalidPrefix(String),

    #[error("invalid segment pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("I/O error reading settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}
