//! `pwb doctor` - show what the last discovery pass accepted and rejected
//!
//! Always exits successfully: excluded contributions reduce the feature set,
//! they never make the tool itself unhealthy.

use crate::commands::{load_config, run_discovery};
use crate::common::GlobalOpts;
use colored::Colorize;
use pwb_contrib::DiscoveryErrorKind;
use pwb_logger as logger;

pub fn doctor(opts: &GlobalOpts) -> Result<(), String> {
    let config = load_config();
    let result = run_discovery(opts, &config);

    println!(
        "{} {} feature(s) registered",
        "\u{2714}".green().bold(),
        result.features.len()
    );

    if opts.verbosity_level() >= 1 {
        for manifest in &result.features {
            println!(
                "    {} {}",
                manifest.name.as_ref().cyan(),
                format!("({})", manifest.source).dimmed()
            );
        }
    }

    if result.errors.is_empty() {
        println!("{}", "No contributions were excluded.".dimmed());
    } else {
        println!();
        println!(
            "{}",
            format!("Excluded contributions ({}):", result.errors.len())
                .bold()
                .red()
        );
        for error in &result.errors {
            println!(
                "  {} {} {}",
                kind_label(error.kind),
                error.source.as_ref().bold(),
                error.message
            );
        }
    }

    if !result.warnings.is_empty() {
        println!();
        println!(
            "{}",
            format!("Warnings ({}):", result.warnings.len()).bold().yellow()
        );
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }

    println!();
    logger::show_log_path();
    Ok(())
}

fn kind_label(kind: DiscoveryErrorKind) -> String {
    let text = match kind {
        DiscoveryErrorKind::Load => "load",
        DiscoveryErrorKind::Validation => "invalid",
        DiscoveryErrorKind::MissingDependency => "missing-dep",
        DiscoveryErrorKind::Cycle => "cycle",
    };
    format!("[{}]", text).red().to_string()
}
