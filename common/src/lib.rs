//! Shared model for `lanprobe`: configuration, segment classification,
//! candidate generation and the collaborator traits the scanner consumes.

pub mod config;
pub mod error;
pub mod network;
pub mod scanning;

pub use config::ScanConfig;
pub use error::ConfigError;
