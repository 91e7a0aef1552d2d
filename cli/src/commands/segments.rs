use colored::*;
use lanprobe_common::config::Settings;
use lanprobe_common::network::interface::Adapter;
use lanprobe_common::network::segment::{NetworkSegment, PriorityTier, SegmentClassifier, SubnetPrefix};
use lanprobe_core::ScanCoordinator;

use crate::commands::ScanArgs;
use crate::mprint;
use crate::terminal::{colors, print};

pub fn tier_color(tier: PriorityTier) -> Color {
    match tier {
        PriorityTier::High => colors::TIER_HIGH,
        PriorityTier::Medium => colors::TIER_MEDIUM,
        PriorityTier::Low => colors::TIER_LOW,
    }
}

fn rule_note(classifier: &SegmentClassifier, prefix: &SubnetPrefix) -> String {
    classifier
        .rules()
        .iter()
        .find(|rule| rule.pattern.matches(prefix))
        .map(|rule| match &rule.note {
            Some(note) => format!("{} ({note})", rule.pattern),
            None => rule.pattern.to_string(),
        })
        .unwrap_or_else(|| "no rule, default".to_string())
}

fn segment_details(segment: &NetworkSegment, classifier: &SegmentClassifier) -> Vec<(String, ColoredString)> {
    let verdict: ColoredString = if segment.is_eligible() {
        "scanned".green()
    } else {
        "skipped".bright_black()
    };
    vec![
        ("Tier".to_string(), segment.tier.to_string().color(tier_color(segment.tier))),
        ("Mode".to_string(), segment.mode.to_string().normal()),
        ("Rule".to_string(), rule_note(classifier, &segment.prefix).normal()),
        ("Scan".to_string(), verdict),
    ]
}

pub fn segments(settings: &Settings, args: &ScanArgs, quiet: u8) -> anyhow::Result<()> {
    let config = args.resolve(settings)?;
    let coordinator = ScanCoordinator::new(config).with_classifier(settings.classifier());
    let classifier = coordinator.classifier();

    let adapters: Vec<Adapter> = coordinator.adapters();
    print::header("local adapters", quiet);
    if adapters.is_empty() {
        print::print_status("No adapter with an IPv4 address");
    }
    for (idx, adapter) in adapters.iter().enumerate() {
        print::tree_head(idx, &adapter.name);
        print::as_tree_one_level(
            adapter
                .ipv4_addresses
                .iter()
                .map(|ip| ("IPv4".to_string(), ip.to_string().color(colors::IPV4_ADDR)))
                .collect(),
        );
    }

    mprint!();
    print::header("segments", quiet);
    let plan = coordinator.plan_for(&adapters);
    let all: Vec<&NetworkSegment> = plan
        .segments
        .iter()
        .map(|planned| &planned.segment)
        .chain(plan.skipped.iter())
        .collect();

    for (idx, segment) in all.into_iter().enumerate() {
        print::tree_head(idx, &segment.prefix.to_string());
        print::as_tree_one_level(segment_details(segment, classifier));
    }
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
