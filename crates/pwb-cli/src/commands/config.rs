//! `pwb config` - inspect and edit the workbench configuration

use clap::Subcommand;
use colored::Colorize;
use pwb_config::WorkbenchConfig;
use pwb_logger as logger;

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Print one configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// Print the config file location
    Path,
}

pub fn handle_config(action: Option<ConfigAction>) -> Result<(), String> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => show(),
        ConfigAction::Get { key } => get(&key),
        ConfigAction::Set { key, value } => set(&key, value),
        ConfigAction::Path => {
            println!("{}", WorkbenchConfig::path().display());
            Ok(())
        }
    }
}

fn show() -> Result<(), String> {
    let config = WorkbenchConfig::load().map_err(|err| err.to_string())?;

    println!("{}", "Configuration".bold().green());
    println!("  {}: {}", "file".dimmed(), WorkbenchConfig::path().display());
    println!(
        "  {}: {}",
        "contrib root".dimmed(),
        config.contrib_root().display()
    );

    if config.is_empty() {
        println!("\n  (no keys set; defaults are in effect)");
        return Ok(());
    }

    println!();
    for (key, value) in config.values_iter() {
        println!("  {} = {}", key.bold().cyan(), value);
    }
    Ok(())
}

fn get(key: &str) -> Result<(), String> {
    let config = WorkbenchConfig::load().map_err(|err| err.to_string())?;
    match config.get(key) {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => Err(format!("Config key '{}' is not set", key)),
    }
}

fn set(key: &str, value: String) -> Result<(), String> {
    let mut config = WorkbenchConfig::load().map_err(|err| err.to_string())?;
    config
        .set(key, value.clone())
        .map_err(|err| err.to_string())?;
    config.save().map_err(|err| err.to_string())?;
    logger::success(&format!("Set {} = {}", key, value));
    Ok(())
}
