use colored::*;
use lanprobe_common::config::Settings;
use lanprobe_common::network::host::DiscoveredServer;
use lanprobe_common::scanning::{ScanProgress, ScanReport};
use lanprobe_core::ScanCoordinator;
use tokio::sync::mpsc;

use crate::commands::ScanArgs;
use crate::mprint;
use crate::terminal::input::{self, CancelKeys};
use crate::terminal::{colors, print, progress};

type Detail = (String, ColoredString);

pub async fn scan(settings: &Settings, args: &ScanArgs, no_input: bool, quiet: u8) -> anyhow::Result<()> {
    let config = args.resolve(settings)?;
    let (tx, rx) = mpsc::unbounded_channel::<ScanProgress>();

    let mut coordinator = ScanCoordinator::new(config)
        .with_classifier(settings.classifier())
        .with_progress(tx);
    let cancel = coordinator.cancel_handle();

    let keys: Option<CancelKeys> = if no_input {
        input::cancel_on_ctrl_c(cancel);
        None
    } else {
        if quiet == 0 {
            print::print_status("Press 'q' to finish early");
        }
        Some(CancelKeys::start(cancel))
    };

    let span = progress::scan_span();
    let follower = tokio::spawn(progress::follow(span.clone(), rx));

    let guard = span.enter();
    let report: ScanReport = coordinator.scan().await?;
    drop(coordinator);
    let _ = follower.await;
    drop(guard);
    drop(span);
    drop(keys);

    scan_ends(&report, quiet);
    Ok(())
}

fn scan_ends(report: &ScanReport, quiet: u8) {
    if report.servers.is_empty() {
        no_servers_found(report, quiet);
        return;
    }

    print::header("discovered servers", quiet);
    print_servers(&report.servers, quiet);
    print_summary(report, quiet);
}

fn no_servers_found(report: &ScanReport, quiet: u8) {
    print::header("zero servers detected", quiet);
    if quiet == 0 {
        print::no_results();
    }
    print_summary(report, quiet);
}

fn print_servers(servers: &[DiscoveredServer], quiet: u8) {
    for (idx, server) in servers.iter().enumerate() {
        match quiet {
            0 => {
                print_server_tree(server, idx);
                if idx + 1 != servers.len() {
                    mprint!();
                }
            }
            _ => {
                mprint!(&server.web_url());
            }
        }
    }
}

pub fn print_server_tree(server: &DiscoveredServer, idx: usize) {
    print::tree_head(idx, &server.ip().to_string());

    let ports: String = format!("{}, {}", server.primary_port(), server.secondary_port());
    let details: Vec<Detail> = vec![
        ("Web".to_string(), server.web_url().color(colors::URL)),
        ("Ports".to_string(), ports.color(colors::PORT)),
        (
            "Found".to_string(),
            server
                .verified_at()
                .format("%H:%M:%S UTC")
                .to_string()
                .color(colors::TEXT_DEFAULT),
        ),
    ];

    print::as_tree_one_level(details);
}

fn print_summary(report: &ScanReport, quiet: u8) {
    if quiet > 1 {
        return;
    }

    let found: ColoredString = format!("{} servers", report.servers.len()).bold().green();
    let scanned: ColoredString =
        format!("{}/{} hosts", report.progress.scanned, report.progress.total).bold().blue();
    let total_time: ColoredString = format!("{:.2}s", report.elapsed.as_secs_f64()).bold().yellow();
    let verb: &str = if report.was_cancelled() { "Scan Cancelled" } else { "Scan Complete" };
    let output: String = format!("{verb}: {found} in {scanned}, {total_time}")
        .color(colors::TEXT_DEFAULT)
        .to_string();

    match quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => print::print_status(output),
    }
}
