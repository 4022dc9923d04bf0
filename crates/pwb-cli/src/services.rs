//! Concrete service implementations handed to features
//!
//! The contrib framework only sees these through the trait objects in
//! `FeatureContext`; everything here is owned by the CLI and constructed once
//! per process from the loaded config.

use anyhow::{bail, Context};
use pwb_config::WorkbenchConfig;
use pwb_contrib::{
    AnalyticsSink, ConsoleSink, HistoryStore, HostServices, LlmClient, PromptBuilder, RunRecord,
};
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use tracing::debug;

/// Writes feature output to stdout
pub struct TerminalConsole;

impl ConsoleSink for TerminalConsole {
    fn line(&self, text: &str) {
        println!("{}", text);
    }
}

/// Appends run records to the configured JSONL history file
pub struct JsonlHistory {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlHistory {
    pub fn new(path: PathBuf) -> Self {
        JsonlHistory {
            path,
            lock: Mutex::new(()),
        }
    }
}

impl HistoryStore for JsonlHistory {
    fn append(&self, record: &RunRecord) -> anyhow::Result<()> {
        let line = serde_json::to_string(record)?;
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("history lock poisoned"))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// Emits usage events onto the tracing log
pub struct UsageLog;

impl AnalyticsSink for UsageLog {
    fn record(&self, event: &str, feature: &str) {
        debug!(target: "pwb::usage", event, feature);
    }
}

/// LLM access through an external command.
///
/// pwb bundles no provider client; when `llm-command` is configured the
/// prompt is piped to that command's stdin and its stdout is the completion.
/// Without it, credential-requiring features fail gracefully with guidance.
pub struct CommandLlm {
    command: Option<String>,
}

impl CommandLlm {
    pub fn from_config(config: &WorkbenchConfig) -> Self {
        CommandLlm {
            command: config.llm_command.clone().or_else(|| {
                std::env::var("PWB_LLM_COMMAND")
                    .ok()
                    .filter(|value| !value.trim().is_empty())
            }),
        }
    }
}

impl LlmClient for CommandLlm {
    fn complete(&self, system: Option<&str>, prompt: &str) -> anyhow::Result<String> {
        let Some(command) = &self.command else {
            bail!("No LLM command configured; set PWB_LLM_COMMAND to a prompt-reading command");
        };

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawning llm command '{}'", command))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A command that ignores stdin may exit before the prompt lands;
            // that is its business, not an invocation failure
            if let Some(system) = system {
                let _ = writeln!(stdin, "{}", system);
                let _ = writeln!(stdin);
            }
            let _ = write!(stdin, "{}", prompt);
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            bail!(
                "llm command exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Prompt templates for the fixed technique set
pub struct TemplatePrompts;

impl PromptBuilder for TemplatePrompts {
    fn build(&self, technique: &str, task: &str) -> anyhow::Result<String> {
        let prompt = match technique {
            "cot" => format!("{task}\n\nLet's work through this step by step."),
            "few_shot" => format!(
                "Here are examples of the pattern to follow.\n\n<examples>\n</examples>\n\nNow: {task}"
            ),
            "role" => format!("You are a domain expert. {task}"),
            "structured" => format!("{task}\n\nRespond only with valid JSON."),
            "react" => format!(
                "{task}\n\nAlternate Thought / Action / Observation until you can give a final answer."
            ),
            "tot" => format!(
                "{task}\n\nExplore three distinct solution paths, then pick the strongest."
            ),
            "self_consistency" => format!(
                "{task}\n\nProduce three independent solutions and report the consensus."
            ),
            other => bail!("Unknown prompt technique '{}'", other),
        };
        Ok(prompt)
    }
}

/// Everything the bridge needs, owned in one place
pub struct WorkbenchServices {
    pub console: TerminalConsole,
    pub llm: CommandLlm,
    pub history: JsonlHistory,
    pub analytics: UsageLog,
    pub prompts: TemplatePrompts,
}

impl WorkbenchServices {
    pub fn from_config(config: &WorkbenchConfig) -> Self {
        WorkbenchServices {
            console: TerminalConsole,
            llm: CommandLlm::from_config(config),
            history: JsonlHistory::new(config.history_file()),
            analytics: UsageLog,
            prompts: TemplatePrompts,
        }
    }

    /// Borrowed trait-object view for the execution bridge
    pub fn as_host<'a>(&'a self, config: &'a WorkbenchConfig) -> HostServices<'a> {
        HostServices {
            console: &self.console,
            llm: &self.llm,
            history: &self.history,
            config,
            analytics: &self.analytics,
            prompts: &self.prompts,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::services::*;

    #[test]
    fn test_history_appends_jsonl_lines() {
        let Ok(temp) = tempfile::TempDir::new() else {
            return;
        };
        let path = temp.path().join("history.jsonl");
        let history = JsonlHistory::new(path.clone());

        let first = RunRecord::new("prompt-library".into(), true, 12);
        let second = RunRecord::new("prompt-chains".into(), false, 340);
        assert!(history.append(&first).is_ok());
        assert!(history.append(&second).is_ok());

        let Ok(content) = std::fs::read_to_string(&path) else {
            return;
        };
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("prompt-library"));
        assert!(lines[1].contains("\"success\":false"));
    }

    #[test]
    fn test_unconfigured_llm_fails_with_guidance() {
        let llm = CommandLlm { command: None };
        let result = llm.complete(None, "hello");
        assert!(result.is_err_and(|e| e.to_string().contains("PWB_LLM_COMMAND")));
    }

    #[test]
    fn test_prompt_templates_cover_known_techniques() {
        let prompts = TemplatePrompts;
        for technique in ["cot", "few_shot", "role", "structured", "react", "tot", "self_consistency"] {
            assert!(prompts.build(technique, "Summarize this").is_ok());
        }
        assert!(prompts.build("mesmerize", "x").is_err());
    }
}
