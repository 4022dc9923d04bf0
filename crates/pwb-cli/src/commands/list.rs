//! `pwb list` - render the discovered feature menu

use crate::commands::{load_config, run_discovery};
use crate::common::GlobalOpts;
use colored::Colorize;
use pwb_contrib::{FeatureCategory, FeatureManifest, FeatureRegistry};

pub fn list_features(
    opts: &GlobalOpts,
    category_filter: Option<String>,
    include_disabled: bool,
) -> Result<(), String> {
    let category_filter = match category_filter {
        None => None,
        Some(raw) => Some(FeatureCategory::parse(&raw).ok_or_else(|| {
            format!(
                "Unknown category '{}' (expected one of CORE, AI, STORAGE, EXPORT, UTILITY)",
                raw
            )
        })?),
    };

    let config = load_config();
    let result = run_discovery(opts, &config);
    let registry = FeatureRegistry::from_result(&result);

    if registry.is_empty() {
        println!("No features registered.\n");
        println!(
            "Scaffold one with:\n  {} init <name>",
            "pwb".bold().cyan()
        );
        return Ok(());
    }

    let mut shown = 0_usize;
    for (category, features) in registry.categories_with_features() {
        if category_filter.is_some_and(|filter| filter != category) {
            continue;
        }
        let visible: Vec<&FeatureManifest> = features
            .into_iter()
            .filter(|manifest| include_disabled || manifest.enabled)
            .collect();
        if visible.is_empty() {
            continue;
        }

        println!("{}", category.label().bold().green());
        for manifest in visible {
            print_feature_line(manifest);
            shown += 1;
        }
        println!();
    }

    if shown == 0 {
        println!("No features match the filter.");
    } else {
        println!("{}: {}", "Total features".bold(), shown);
    }

    if registry.has_errors() {
        println!(
            "{}",
            format!(
                "{} contribution(s) were excluded; run `pwb doctor` for details",
                registry.errors().len()
            )
            .dimmed()
        );
    }

    Ok(())
}

fn print_feature_line(manifest: &FeatureManifest) {
    let mut line = format!(
        "  {} {}",
        manifest.icon,
        manifest.display_name.as_ref().bold().cyan()
    );
    if let Some(key) = manifest.shortcut_key {
        line.push_str(&format!(" {}", format!("({})", key).dimmed()));
    }
    if !manifest.description.is_empty() {
        line.push_str(&format!(" - {}", manifest.description.dimmed()));
    }
    if manifest.requires_api_key {
        line.push_str(&format!(" {}", "[api]".yellow()));
    }
    if !manifest.enabled {
        line.push_str(&format!(" {}", "[disabled]".red()));
    }
    println!("{}", line);
}
