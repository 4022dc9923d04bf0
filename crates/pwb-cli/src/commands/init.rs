//! `pwb init <name>` - scaffold a contrib feature directory

use crate::commands::load_config;
use crate::common::GlobalOpts;
use colored::Colorize;
use once_cell::sync::Lazy;
use pwb_contrib::{FeatureCategory, MANIFEST_FILE_NAME};
use pwb_logger as logger;
use regex::Regex;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

static NAME_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_-]{0,63}$").ok());

const MANIFEST_TEMPLATE: &str = r#"# pwb contrib feature manifest
#
# The directory name is only a label; `name` below is the identity other
# features reference in their `dependencies`.

name = "{name}"
display_name = "{display_name}"
description = ""
category = "{category}"
icon = "•"

# Needs an external LLM provider credential to work
requires_api_key = false

# Names of features that must be registered before this one
dependencies = []

# Toggle without deleting the directory
enabled = true

# Optional single-key menu accelerator, e.g. "x"
# shortcut_key = ""

# Entry point reference resolved by the host; defaults to `name`
# entry = "{name}"
"#;

pub fn handle_init(
    opts: &GlobalOpts,
    name: &str,
    category: Option<String>,
    dir: Option<PathBuf>,
) -> Result<(), String> {
    let valid = NAME_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(name));
    if !valid {
        return Err(format!(
            "Invalid feature name '{}': use lowercase letters, digits, '-' and '_', starting with a letter",
            name
        ));
    }

    let category = match category {
        None => FeatureCategory::Utility,
        Some(raw) => FeatureCategory::parse(&raw)
            .ok_or_else(|| format!("Unknown category '{}'", raw))?,
    };

    let config = load_config();
    let root = dir
        .or_else(|| opts.contrib_dir.clone())
        .unwrap_or_else(|| config.contrib_root());
    let feature_dir = root.join(name);
    let manifest_path = feature_dir.join(MANIFEST_FILE_NAME);

    if manifest_path.exists() && !confirm_overwrite(&manifest_path)? {
        logger::info("Init cancelled");
        return Ok(());
    }

    fs::create_dir_all(&feature_dir)
        .map_err(|err| format!("Failed to create {}: {}", feature_dir.display(), err))?;

    let display_name = display_name_from(name);
    let manifest = MANIFEST_TEMPLATE
        .replace("{name}", name)
        .replace("{display_name}", &display_name)
        .replace("{category}", category.label());
    fs::write(&manifest_path, manifest)
        .map_err(|err| format!("Failed to write {}: {}", manifest_path.display(), err))?;

    logger::success(&format!("Created {}", manifest_path.display()));
    println!(
        "Next: register an entry point named {} with the host, then check {}",
        name.bold().cyan(),
        "pwb doctor".bold()
    );
    Ok(())
}

/// "prompt-diff" -> "Prompt Diff"
fn display_name_from(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn confirm_overwrite(path: &std::path::Path) -> Result<bool, String> {
    // Skip the prompt in scripted runs
    if std::env::var("PWB_INIT_YES").is_ok() {
        return Ok(true);
    }

    print!(
        "{} {} already exists. Overwrite? {} ",
        "?".bold().cyan(),
        path.display(),
        "[y/n] \u{203a}".dimmed()
    );
    let _ = io::stdout().flush();

    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .map_err(|err| format!("Failed to read answer: {}", err))?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[cfg(test)]
mod tests {
    use crate::commands::init::*;

    #[test]
    fn test_display_name_from_kebab_and_snake() {
        assert_eq!(display_name_from("prompt-diff"), "Prompt Diff");
        assert_eq!(display_name_from("token_counter"), "Token Counter");
        assert_eq!(display_name_from("solo"), "Solo");
    }

    #[test]
    fn test_name_pattern() {
        let Some(pattern) = NAME_PATTERN.as_ref() else {
            return;
        };
        assert!(pattern.is_match("prompt-diff"));
        assert!(pattern.is_match("a2_tool"));
        assert!(!pattern.is_match("Prompt"));
        assert!(!pattern.is_match("-leading"));
        assert!(!pattern.is_match(""));
    }

    #[test]
    fn test_template_mentions_every_contract_field() {
        for field in [
            "name",
            "display_name",
            "description",
            "category",
            "icon",
            "requires_api_key",
            "dependencies",
            "enabled",
            "shortcut_key",
            "entry",
        ] {
            assert!(
                MANIFEST_TEMPLATE.contains(field),
                "template is missing '{field}'"
            );
        }
    }
}
