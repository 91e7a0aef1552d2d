use colored::*;
use indicatif::ProgressStyle;
use lanprobe_common::scanning::ScanProgress;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

fn style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {wide_bar:.green/bright_black} {pos}/{len} {msg}")
        .map(|style| style.progress_chars("━╸─").tick_strings(TICKS))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Span whose progress bar tracks a scan while it is entered.
pub fn scan_span() -> Span {
    let span: Span = info_span!("scan", indicatif.pb_show = true);
    span.pb_set_style(&style());
    span
}

pub fn message(progress: &ScanProgress) -> String {
    let found: ColoredString = progress.verified_count.to_string().green().bold();
    format!(
        "{found} found, segment {}/{}",
        (progress.segments_done + 1).min(progress.segments_total),
        progress.segments_total
    )
}

/// Mirrors progress snapshots onto the span's bar until the sender is gone.
pub async fn follow(span: Span, mut rx: UnboundedReceiver<ScanProgress>) {
    while let Some(snapshot) = rx.recv().await {
        span.pb_set_length(snapshot.total as u64);
        span.pb_set_position(snapshot.scanned as u64);
        span.pb_set_message(&message(&snapshot));
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
