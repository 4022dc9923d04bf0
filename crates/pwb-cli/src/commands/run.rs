//! `pwb run <feature>` - execute one feature through the bridge

use crate::commands::{load_config, run_discovery};
use crate::common::GlobalOpts;
use crate::services::WorkbenchServices;
use pwb_contrib::{BridgeError, EntryPointTable, ExecutionBridge, FeatureRegistry};
use pwb_logger as logger;

pub fn run_feature(opts: &GlobalOpts, name: &str) -> Result<(), String> {
    let config = load_config();

    logger::spinner_start("Discovering features");
    let result = run_discovery(opts, &config);
    logger::spinner_stop();

    let registry = FeatureRegistry::from_result(&result);
    for warning in registry.warnings() {
        logger::warn(warning);
    }

    let Some(manifest) = registry.get(name) else {
        let mut message = format!("Feature '{}' is not registered", name);
        if registry
            .errors()
            .iter()
            .any(|err| err.message.contains(name))
        {
            message.push_str("; it was excluded during discovery (see `pwb doctor`)");
        }
        return Err(message);
    };

    if manifest.requires_api_key
        && config.llm_command.is_none()
        && std::env::var("PWB_LLM_COMMAND").is_err()
    {
        logger::warn(
            "This feature needs LLM access; set the 'llm-command' config key or PWB_LLM_COMMAND",
        );
    }

    let services = WorkbenchServices::from_config(&config);
    let entry_points: &EntryPointTable = &crate::builtin::ENTRY_POINTS;
    let bridge = ExecutionBridge::new(&registry, entry_points, services.as_host(&config));

    logger::set_current_feature(Some(name.to_string()));
    let outcome = bridge.run(name);
    logger::set_current_feature(None);

    match outcome {
        Ok(result) => {
            if result.success {
                logger::success(result.message.as_deref().unwrap_or("Feature completed"));
                if opts.verbosity_level() >= 1 {
                    if let Some(data) = &result.data {
                        let rendered = serde_json::to_string_pretty(data)
                            .unwrap_or_else(|_| data.to_string());
                        println!("{}", rendered);
                    }
                }
                Ok(())
            } else {
                Err(result
                    .error
                    .unwrap_or_else(|| "Feature reported failure".to_string()))
            }
        }
        Err(err @ BridgeError::FeatureDisabled(_)) => {
            Err(format!("{} (enable it in its manifest.toml)", err))
        }
        Err(err) => Err(err.to_string()),
    }
}
