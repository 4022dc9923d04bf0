//! User-facing logging for the pwb CLI
//!
//! Console messages are leveled by a process-wide verbosity setting; every
//! message is also appended to `pwb.log` under the config directory so a
//! failed discovery pass can be inspected after the fact. A spinner is shown
//! for longer operations when not in verbose mode.

use colored::Colorize;
use indicatif::ProgressBar;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

static LOG_FILE: Mutex<Option<PathBuf>> = Mutex::new(None);
static VERBOSITY: Mutex<u8> = Mutex::new(0);
static CURRENT_FEATURE: Mutex<Option<String>> = Mutex::new(None);
static SPINNER: Mutex<Option<ProgressBar>> = Mutex::new(None);

/// Current verbosity level: 0 = warn only, 1 = debug (-v), 2 = trace (-vv)
pub fn get_verbosity() -> u8 {
    VERBOSITY.lock().ok().map(|v| *v).unwrap_or(0)
}

/// Name of the feature currently executing, if any
pub fn get_current_feature() -> Option<String> {
    CURRENT_FEATURE.lock().ok().and_then(|guard| guard.clone())
}

/// Mark a feature as currently executing (cleared with `None`)
pub fn set_current_feature(feature: Option<String>) {
    if let Ok(mut guard) = CURRENT_FEATURE.lock() {
        *guard = feature;
    }
}

/// Initialize the logger with a verbosity level and open the log file
pub fn init_with_verbosity(verbosity: u8) -> Result<(), String> {
    if let Ok(mut v) = VERBOSITY.lock() {
        *v = verbosity;
    }

    let config_dir = get_config_dir()?;
    fs::create_dir_all(&config_dir)
        .map_err(|e| format!("Failed to create config directory: {}", e))?;

    let log_file = config_dir.join("pwb.log");

    // Truncate on each run; the log covers one invocation
    if log_file.exists() {
        let _ = fs::remove_file(&log_file);
    }

    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(log_file);
    }

    Ok(())
}

fn get_config_dir() -> Result<PathBuf, String> {
    #[cfg(not(target_os = "windows"))]
    let config_dir = dirs::home_dir()
        .ok_or("Could not determine home directory")?
        .join(".config")
        .join("pwb");

    #[cfg(target_os = "windows")]
    let config_dir = dirs::config_dir()
        .ok_or("Could not determine config directory")?
        .join("pwb");

    Ok(config_dir)
}

fn write_to_log(message: &str) {
    if let Ok(guard) = LOG_FILE.lock() {
        if let Some(ref log_path) = *guard {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path) {
                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                let feature = get_current_feature()
                    .map(|name| format!(" [{}]", name))
                    .unwrap_or_default();
                let _ = writeln!(file, "[{}]{} {}", timestamp, feature, message);
            }
        }
    }
}

/// Informational message (console when verbose, always to file)
pub fn info(message: &str) {
    write_to_log(&format!("INFO {}", message));
    if get_verbosity() >= 1 {
        eprintln!("{}", message);
    }
}

/// Debug message (console when verbose, always to file)
pub fn debug(message: &str) {
    write_to_log(&format!("DEBUG {}", message));
    if get_verbosity() >= 1 {
        eprintln!("{} {}", "DEBUG:".blue().bold(), message);
    }
}

/// Warning (both console and file)
pub fn warn(message: &str) {
    write_to_log(&format!("WARN {}", message));
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

/// Error (both console and file)
pub fn error(message: &str) {
    write_to_log(&format!("ERROR {}", message));
    eprintln!("{} {}", "Error:".red().bold(), message);
}

/// Success message with a check mark (console for user feedback)
pub fn success(message: &str) {
    write_to_log(&format!("SUCCESS {}", message));
    eprintln!("{} {}", "\u{2714}".green().bold(), message);
}

/// Log file path for display
pub fn get_log_path() -> Option<PathBuf> {
    LOG_FILE.lock().ok().and_then(|guard| guard.clone())
}

/// Print the log file location to the user
pub fn show_log_path() {
    if let Some(path) = get_log_path() {
        eprintln!("Log file: {}", path.display());
    } else if let Ok(config_dir) = get_config_dir() {
        eprintln!("Log file: {}", config_dir.join("pwb.log").display());
    } else {
        eprintln!("Log file location not available");
    }
}

/// Start a spinner with the given message (suppressed in verbose mode)
pub fn spinner_start(message: &str) {
    if get_verbosity() > 0 {
        return;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        indicatif::ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(message.to_string());

    if let Ok(mut guard) = SPINNER.lock() {
        *guard = Some(spinner);
    }
}

/// Clear the spinner and print a success message
pub fn spinner_success(message: &str) {
    spinner_stop();
    eprintln!("{} {}", "✔".green().bold(), message);
}

/// Clear the spinner and print an error message
pub fn spinner_error(message: &str) {
    spinner_stop();
    eprintln!("  {} {}", "✗".red().bold(), message);
}

/// Clear the spinner without printing anything
pub fn spinner_stop() {
    if let Ok(mut guard) = SPINNER.lock() {
        if let Some(spinner) = guard.take() {
            spinner.finish_and_clear();
        }
    }
}
