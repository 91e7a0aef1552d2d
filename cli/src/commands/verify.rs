use std::net::Ipv4Addr;

use colored::*;
use lanprobe_common::config::Settings;
use lanprobe_core::ScanCoordinator;

use crate::commands::{ScanArgs, scan};
use crate::mprint;
use crate::terminal::{colors, print};

pub async fn verify(settings: &Settings, args: &ScanArgs, ip: Ipv4Addr, quiet: u8) -> anyhow::Result<()> {
    let config = args.resolve(settings)?;
    let coordinator = ScanCoordinator::new(config);

    print::header("verifying host", quiet);
    if quiet == 0 {
        print::aligned_line("Target", ip.to_string().color(colors::IPV4_ADDR));
        print::aligned_line(
            "Ports",
            format!("{}, {}", coordinator.config().ports.primary, coordinator.config().ports.secondary)
                .color(colors::PORT),
        );
        mprint!();
    }

    match coordinator.verify_host(ip).await? {
        Some(server) if quiet == 0 => scan::print_server_tree(&server, 0),
        Some(server) => {
            mprint!(&server.web_url());
        }
        None => print::print_status(format!("No server answering at {ip}")),
    }
    Ok(())
}
