//! Prompt chains - multi-step prompt pipelines
//!
//! Runs a sequence of templated prompt steps, feeding each step's output into
//! the next through a substitution context, then archives the final output in
//! the prompt library (hence the declared dependency). The chain definition
//! comes from the `chain-file` config key as TOML, falling back to a built-in
//! draft-and-refine pair.

use crate::builtin::library::{self, SavedPrompt};
use pwb_contrib::{FeatureCategory, FeatureContext, FeatureManifest, FeatureResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One templated step; `{key}` placeholders resolve against prior outputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainStep {
    pub name: String,
    pub template: String,
    /// Context key the output lands under; defaults to the step name
    #[serde(default)]
    pub output_key: Option<String>,
}

/// A named pipeline of steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<ChainStep>,
}

/// Outcome summary returned as the feature payload
#[derive(Debug, Clone, Serialize)]
pub struct ChainRunReport {
    pub chain: String,
    pub steps_completed: usize,
    pub total_steps: usize,
    pub outputs: BTreeMap<String, String>,
    pub final_output: String,
}

pub fn manifest() -> FeatureManifest {
    FeatureManifest {
        name: Arc::from("prompt-chains"),
        display_name: Arc::from("Prompt Chains"),
        description: Arc::from("Run multi-step prompt pipelines"),
        category: FeatureCategory::Ai,
        icon: Arc::from("\u{26d3}"),
        requires_api_key: true,
        dependencies: [Arc::from("prompt-library")].into_iter().collect(),
        shortcut_key: Some('c'),
        source: Arc::from("builtin:prompt-chains"),
        ..Default::default()
    }
}

fn default_chain() -> ChainSpec {
    ChainSpec {
        name: "draft-refine".to_string(),
        description: "Draft an answer, then tighten it".to_string(),
        steps: vec![
            ChainStep {
                name: "draft".to_string(),
                template: "Write a first draft answering:\n{input}".to_string(),
                output_key: None,
            },
            ChainStep {
                name: "refine".to_string(),
                template: "Improve the following draft. Keep it concise.\n\n{draft}".to_string(),
                output_key: Some("final".to_string()),
            },
        ],
    }
}

fn load_chain(ctx: &FeatureContext<'_>) -> anyhow::Result<ChainSpec> {
    match ctx.config.get("chain-file") {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            Ok(toml::from_str(&content)?)
        }
        None => Ok(default_chain()),
    }
}

fn substitute(template: &str, context: &BTreeMap<String, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in context {
        rendered = rendered.replace(&format!("{{{key}}}"), value);
    }
    rendered
}

/// Entry point: run the configured chain
pub fn run(ctx: &FeatureContext<'_>) -> anyhow::Result<FeatureResult> {
    let Some(input) = ctx.config.get("chain-input") else {
        return Ok(FeatureResult::failed(
            "No chain input; set the 'chain-input' config key",
        ));
    };

    let chain = load_chain(ctx)?;
    if chain.steps.is_empty() {
        return Ok(FeatureResult::failed(format!(
            "Chain '{}' has no steps",
            chain.name
        )));
    }

    let mut outputs: BTreeMap<String, String> = BTreeMap::new();
    outputs.insert("input".to_string(), input);
    let mut final_output = String::new();
    let total_steps = chain.steps.len();

    for (position, step) in chain.steps.iter().enumerate() {
        ctx.console
            .line(&format!("[{}/{}] {}", position + 1, total_steps, step.name));

        let prompt = substitute(&step.template, &outputs);
        let reply = match ctx.llm.complete(None, &prompt) {
            Ok(reply) => reply.trim().to_string(),
            Err(err) => {
                let report = ChainRunReport {
                    chain: chain.name.clone(),
                    steps_completed: position,
                    total_steps,
                    outputs,
                    final_output,
                };
                let mut result = FeatureResult::failed(format!(
                    "Step '{}' failed: {:#}",
                    step.name, err
                ));
                result.data = serde_json::to_value(&report).ok();
                return Ok(result);
            }
        };

        let key = step.output_key.clone().unwrap_or_else(|| step.name.clone());
        outputs.insert(key, reply.clone());
        final_output = reply;
    }

    let archive_path = library::library_path(ctx.config);
    let mut entry = SavedPrompt::new(
        format!("chain:{}", chain.name),
        "chain",
        final_output.clone(),
    );
    entry.description = chain.description.clone();
    library::append(&archive_path, entry)?;

    let report = ChainRunReport {
        chain: chain.name.clone(),
        steps_completed: total_steps,
        total_steps,
        outputs,
        final_output,
    };
    let data = serde_json::to_value(&report)?;
    Ok(FeatureResult::ok_with_data(
        format!("Chain '{}' completed", chain.name),
        data,
    ))
}
