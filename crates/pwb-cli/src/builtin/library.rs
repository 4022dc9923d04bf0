//! Prompt library - saved prompt snippets
//!
//! Stores reusable prompts in a JSON file under the config directory (or the
//! `library-path` config key). Other features archive their output here,
//! which is why they declare a dependency on this one.

use chrono::Utc;
use pwb_contrib::{FeatureCategory, FeatureContext, FeatureManifest, FeatureResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One saved prompt snippet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPrompt {
    pub name: String,
    pub technique: String,
    pub prompt: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
}

impl SavedPrompt {
    pub fn new(name: impl Into<String>, technique: impl Into<String>, prompt: impl Into<String>) -> Self {
        SavedPrompt {
            name: name.into(),
            technique: technique.into(),
            prompt: prompt.into(),
            description: String::new(),
            tags: Vec::new(),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

pub fn manifest() -> FeatureManifest {
    FeatureManifest {
        name: Arc::from("prompt-library"),
        display_name: Arc::from("Prompt Library"),
        description: Arc::from("Browse and archive reusable prompt snippets"),
        category: FeatureCategory::Storage,
        icon: Arc::from("\u{1f4da}"),
        shortcut_key: Some('l'),
        source: Arc::from("builtin:prompt-library"),
        ..Default::default()
    }
}

/// Resolve the library file from the opaque config view
pub fn library_path(config: &dyn pwb_contrib::ConfigView) -> PathBuf {
    config.get("library-path").map_or_else(
        || pwb_config::WorkbenchConfig::config_dir().join("library.json"),
        PathBuf::from,
    )
}

/// Load the library, treating a missing file as empty
pub fn load(path: &Path) -> anyhow::Result<Vec<SavedPrompt>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Append one entry and persist the library
pub fn append(path: &Path, entry: SavedPrompt) -> anyhow::Result<()> {
    let mut entries = load(path)?;
    entries.push(entry);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&entries)?)?;
    Ok(())
}

/// Entry point: list the saved prompts
pub fn run(ctx: &FeatureContext<'_>) -> anyhow::Result<FeatureResult> {
    let path = library_path(ctx.config);
    let entries = load(&path)?;

    if entries.is_empty() {
        ctx.console
            .line("Library is empty. Features archive their output here.");
    } else {
        for entry in &entries {
            let tags = if entry.tags.is_empty() {
                String::new()
            } else {
                format!("  #{}", entry.tags.join(" #"))
            };
            ctx.console
                .line(&format!("{} [{}]{}", entry.name, entry.technique, tags));
        }
    }

    Ok(FeatureResult::ok_with_data(
        format!("{} saved prompt(s)", entries.len()),
        serde_json::json!({ "count": entries.len(), "path": path.display().to_string() }),
    ))
}
