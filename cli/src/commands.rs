pub mod estimate;
pub mod scan;
pub mod segments;
pub mod verify;

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use lanprobe_common::config::{ScanConfig, Settings, timeout_from_secs};
use lanprobe_common::error::ConfigError;
use lanprobe_common::network::segment::SubnetPrefix;

#[derive(Parser)]
#[command(name = "lanprobe", version)]
#[command(about = "Finds speech synthesis servers (web UI + synthesis API) on the local network.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML settings file with [scan] defaults and [[segment]] rules
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Less output
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the local segments for servers
    #[command(alias = "s")]
    Scan {
        #[command(flatten)]
        args: ScanArgs,

        /// Do not listen for 'q' on the keyboard
        #[arg(long)]
        no_input: bool,
    },
    /// Show the scan plan and how long it would take
    #[command(alias = "e")]
    Estimate {
        #[command(flatten)]
        args: ScanArgs,
    },
    /// Check a single address for a server
    #[command(alias = "v")]
    Verify {
        /// Address to check, e.g. 192.168.1.20
        ip: Ipv4Addr,

        #[command(flatten)]
        args: ScanArgs,
    },
    /// List adapters and how each segment is classified
    #[command(alias = "seg")]
    Segments {
        #[command(flatten)]
        args: ScanArgs,
    },
}

/// Flags that override the settings file for one run.
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Seconds to wait for each probe
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Hosts verified in parallel (capped at 150)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Stop once enough servers are found
    #[arg(short, long)]
    pub fast: bool,

    /// Servers needed to stop early in fast mode
    #[arg(long, value_name = "N")]
    pub threshold: Option<usize>,

    /// Extra segment to scan, e.g. 192.168.50 (repeatable)
    #[arg(short, long = "subnet", value_name = "PREFIX")]
    pub subnets: Vec<SubnetPrefix>,

    /// Stop dispatching new hosts after this many seconds
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<f64>,
}

impl ScanArgs {
    /// Applies the flags on top of `config`.
    pub fn apply(&self, config: &mut ScanConfig) -> Result<(), ConfigError> {
        if let Some(secs) = self.timeout {
            config.set_timeout_secs(secs)?;
        }
        if let Some(threads) = self.threads {
            config.max_threads = threads;
        }
        if self.fast {
            config.fast_mode = true;
        }
        if let Some(threshold) = self.threshold {
            config.fast_mode_threshold = threshold;
        }
        for subnet in &self.subnets {
            if !config.supplementary_subnets.contains(subnet) {
                config.supplementary_subnets.push(*subnet);
            }
        }
        if let Some(secs) = self.deadline {
            config.deadline = Some(timeout_from_secs(secs)?);
        }
        Ok(())
    }

    pub fn resolve(&self, settings: &Settings) -> Result<ScanConfig, ConfigError> {
        let mut config: ScanConfig = settings.scan_config()?;
        self.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn settings(&self) -> Result<Settings, ConfigError> {
        match &self.config {
            Some(path) => Settings::load(path),
            None => Ok(Settings::default()),
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
