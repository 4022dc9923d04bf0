//! Command handlers for the pwb CLI

pub mod config;
pub mod doctor;
pub mod init;
pub mod list;
pub mod run;

use crate::builtin;
use crate::common::GlobalOpts;
use pwb_config::WorkbenchConfig;
use pwb_contrib::{DiscoveryEngine, DiscoveryResult};
use pwb_logger as logger;

/// Load the workbench config, falling back to defaults on a broken file
pub(crate) fn load_config() -> WorkbenchConfig {
    match WorkbenchConfig::load() {
        Ok(config) => config,
        Err(err) => {
            logger::warn(&format!("Failed to load config, using defaults: {}", err));
            WorkbenchConfig::default()
        }
    }
}

/// Run one discovery pass over builtins plus the effective contrib root
pub(crate) fn run_discovery(opts: &GlobalOpts, config: &WorkbenchConfig) -> DiscoveryResult {
    let root = opts
        .contrib_dir
        .clone()
        .unwrap_or_else(|| config.contrib_root());

    DiscoveryEngine::new()
        .with_root(root)
        .with_builtins(builtin::manifests())
        .discover()
}
