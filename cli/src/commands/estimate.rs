use std::time::Duration;

use colored::*;
use lanprobe_common::config::Settings;
use lanprobe_core::{ScanCoordinator, ScanPlan, estimate_for};

use crate::commands::ScanArgs;
use crate::commands::segments::tier_color;
use crate::terminal::{colors, print};

pub fn estimate(settings: &Settings, args: &ScanArgs, quiet: u8) -> anyhow::Result<()> {
    let config = args.resolve(settings)?;
    let coordinator = ScanCoordinator::new(config).with_classifier(settings.classifier());

    let plan: ScanPlan = coordinator.plan();
    let config = coordinator.config();
    let duration: Duration = estimate_for(config, plan.candidate_count());

    print::header("scan plan", quiet);
    if quiet == 0 {
        for (idx, planned) in plan.segments.iter().enumerate() {
            let segment = &planned.segment;
            print::tree_head(idx, &segment.prefix.to_string());
            print::as_tree_one_level(vec![
                ("Tier".to_string(), segment.tier.to_string().color(tier_color(segment.tier))),
                ("Mode".to_string(), segment.mode.to_string().normal()),
                ("Hosts".to_string(), planned.candidates.len().to_string().color(colors::ACCENT)),
            ]);
        }
        for skipped in &plan.skipped {
            print::print_status(format!("{} skipped ({})", skipped.prefix, skipped.tier));
        }
        print::fat_separator();
    }

    print::aligned_line("Candidates", plan.candidate_count().to_string());
    print::aligned_line("Threads", config.effective_threads().to_string());
    print::aligned_line("Timeout", format!("{:.2}s", config.timeout.as_secs_f64()));
    print::aligned_line(
        "Estimate",
        format!("{:.1}s", duration.as_secs_f64()).bold().yellow(),
    );
    if config.fast_mode {
        print::print_status(format!(
            "Fast mode may finish after the first {} server(s)",
            config.fast_mode_threshold
        ));
    }
    Ok(())
}
