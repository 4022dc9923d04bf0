//! Execution bridge
//!
//! Invokes a registered feature's entry point with a freshly assembled
//! `FeatureContext` and normalizes whatever comes back - a result, an error,
//! or a panic - into a `FeatureResult`. A misbehaving feature never
//! terminates the host; the failure surfaces as `success: false`. Execution
//! is at-most-once per call, with no retry at this layer.
//!
//! Entry points are registered in a static table keyed by the manifest's
//! entry reference. Registration carries only the lightweight function
//! pointer; a feature's heavy internals are built inside the entry point at
//! invocation time, never at registration time.

use crate::execution::{
    AnalyticsSink, ConfigView, ConsoleSink, FeatureContext, FeatureResult, HistoryStore,
    LlmClient, PromptBuilder, RunRecord,
};
use crate::registry::FeatureRegistry;
use ahash::AHashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// A feature's callable entry point
pub type EntryPoint = fn(&FeatureContext<'_>) -> anyhow::Result<FeatureResult>;

/// Host-level failures that prevent an invocation from starting.
///
/// Distinct from a failed `FeatureResult`: these mean the bridge never
/// reached the feature's entry point at all.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Feature '{0}' is not registered")]
    UnknownFeature(String),

    #[error("Feature '{0}' is disabled")]
    FeatureDisabled(String),

    #[error("No entry point registered for '{0}' (entry reference '{1}')")]
    MissingEntryPoint(String, String),
}

/// Name-to-callable table populated by the host at startup
#[derive(Debug, Default)]
pub struct EntryPointTable {
    entries: AHashMap<Arc<str>, EntryPoint>,
}

impl EntryPointTable {
    pub fn new() -> Self {
        EntryPointTable {
            entries: AHashMap::new(),
        }
    }

    /// Register an entry point; the last registration for a name wins
    pub fn register(&mut self, entry_ref: impl Into<Arc<str>>, entry: EntryPoint) {
        self.entries.insert(entry_ref.into(), entry);
    }

    pub fn get(&self, entry_ref: &str) -> Option<EntryPoint> {
        self.entries.get(entry_ref).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Borrowed handles to every host-owned service a feature may use
#[derive(Clone, Copy)]
pub struct HostServices<'a> {
    pub console: &'a dyn ConsoleSink,
    pub llm: &'a dyn LlmClient,
    pub history: &'a dyn HistoryStore,
    pub config: &'a dyn ConfigView,
    pub analytics: &'a dyn AnalyticsSink,
    pub prompts: &'a dyn PromptBuilder,
}

/// Runs registry features against host services
pub struct ExecutionBridge<'a> {
    registry: &'a FeatureRegistry,
    entry_points: &'a EntryPointTable,
    services: HostServices<'a>,
}

impl<'a> ExecutionBridge<'a> {
    pub fn new(
        registry: &'a FeatureRegistry,
        entry_points: &'a EntryPointTable,
        services: HostServices<'a>,
    ) -> Self {
        ExecutionBridge {
            registry,
            entry_points,
            services,
        }
    }

    /// Execute one feature by name.
    ///
    /// `Err` means the invocation never started (unknown, disabled, or
    /// unwired feature); `Ok` carries the normalized outcome, failed or not.
    pub fn run(&self, name: &str) -> Result<FeatureResult, BridgeError> {
        let manifest = self
            .registry
            .get(name)
            .ok_or_else(|| BridgeError::UnknownFeature(name.to_string()))?;

        if !manifest.enabled {
            return Err(BridgeError::FeatureDisabled(name.to_string()));
        }

        let entry = self.entry_points.get(manifest.entry_ref()).ok_or_else(|| {
            BridgeError::MissingEntryPoint(name.to_string(), manifest.entry_ref().to_string())
        })?;

        let context = FeatureContext {
            console: self.services.console,
            llm: self.services.llm,
            history: self.services.history,
            config: self.services.config,
            analytics: self.services.analytics,
            prompts: self.services.prompts,
            registry: self.registry,
            manifest,
        };

        debug!("Invoking feature '{}'", manifest.name);
        let started = Instant::now();
        let result = invoke(entry, &context);
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let record = RunRecord::new(manifest.name.clone(), result.success, duration_ms);
        if let Err(err) = self.services.history.append(&record) {
            warn!("Failed to record run of '{}': {}", manifest.name, err);
        }
        self.services.analytics.record(
            if result.success {
                "feature_run_ok"
            } else {
                "feature_run_failed"
            },
            &manifest.name,
        );

        Ok(result)
    }
}

/// Call the entry point, converting errors and panics into failed results
fn invoke(entry: EntryPoint, context: &FeatureContext<'_>) -> FeatureResult {
    let outcome = catch_unwind(AssertUnwindSafe(|| entry(context)));

    match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            warn!("Feature '{}' failed: {:#}", context.manifest.name, err);
            FeatureResult::failed(format!("{:#}", err))
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "feature panicked".to_string());
            warn!("Feature '{}' panicked: {}", context.manifest.name, message);
            FeatureResult::failed(format!("Feature panicked: {}", message))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::bridge::*;
    use crate::types::{DiscoveryResult, FeatureManifest};

    struct NullConsole;
    impl ConsoleSink for NullConsole {
        fn line(&self, _text: &str) {}
    }

    struct NullLlm;
    impl LlmClient for NullLlm {
        fn complete(&self, _system: Option<&str>, _prompt: &str) -> anyhow::Result<String> {
            anyhow::bail!("no provider configured")
        }
    }

    struct MemoryHistory {
        records: parking_lot::Mutex<Vec<RunRecord>>,
    }
    impl HistoryStore for MemoryHistory {
        fn append(&self, record: &RunRecord) -> anyhow::Result<()> {
            self.records.lock().push(record.clone());
            Ok(())
        }
    }

    struct NullConfig;
    impl ConfigView for NullConfig {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }
    }

    struct NullAnalytics;
    impl AnalyticsSink for NullAnalytics {
        fn record(&self, _event: &str, _feature: &str) {}
    }

    struct NullPrompts;
    impl PromptBuilder for NullPrompts {
        fn build(&self, _technique: &str, _task: &str) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    fn manifest(name: &str, enabled: bool) -> FeatureManifest {
        FeatureManifest {
            name: Arc::from(name),
            display_name: Arc::from(name),
            source: Arc::from(name),
            enabled,
            ..Default::default()
        }
    }

    fn steady(_ctx: &FeatureContext<'_>) -> anyhow::Result<FeatureResult> {
        Ok(FeatureResult::ok("steady done"))
    }

    fn erroring(_ctx: &FeatureContext<'_>) -> anyhow::Result<FeatureResult> {
        anyhow::bail!("internal failure")
    }

    fn panicking(_ctx: &FeatureContext<'_>) -> anyhow::Result<FeatureResult> {
        assert!(false, "entry point blew up");
        Ok(FeatureResult::ok("unreachable"))
    }

    fn harness(
        features: Vec<FeatureManifest>,
    ) -> (FeatureRegistry, EntryPointTable, MemoryHistory) {
        let result = DiscoveryResult {
            features,
            ..Default::default()
        };
        let registry = FeatureRegistry::from_result(&result);

        let mut table = EntryPointTable::new();
        table.register("steady", steady);
        table.register("erroring", erroring);
        table.register("panicking", panicking);

        let history = MemoryHistory {
            records: parking_lot::Mutex::new(Vec::new()),
        };
        (registry, table, history)
    }

    fn run_one(name: &str, enabled: bool) -> (Result<FeatureResult, BridgeError>, usize) {
        let (registry, table, history) = harness(vec![manifest(name, enabled)]);
        let services = HostServices {
            console: &NullConsole,
            llm: &NullLlm,
            history: &history,
            config: &NullConfig,
            analytics: &NullAnalytics,
            prompts: &NullPrompts,
        };
        let bridge = ExecutionBridge::new(&registry, &table, services);
        let outcome = bridge.run(name);
        let recorded = history.records.lock().len();
        (outcome, recorded)
    }

    #[test]
    fn test_successful_run_records_history() {
        let (outcome, recorded) = run_one("steady", true);
        assert!(outcome.is_ok_and(|r| r.success));
        assert_eq!(recorded, 1);
    }

    #[test]
    fn test_entry_point_error_becomes_failed_result() {
        let (outcome, recorded) = run_one("erroring", true);
        assert!(outcome.is_ok_and(|r| {
            !r.success && r.error.as_deref().is_some_and(|e| e.contains("internal failure"))
        }));
        assert_eq!(recorded, 1);
    }

    #[test]
    fn test_panicking_entry_point_does_not_take_down_the_host() {
        let (outcome, _) = run_one("panicking", true);
        assert!(outcome.is_ok_and(|r| {
            !r.success && r.error.as_deref().is_some_and(|e| e.contains("panicked"))
        }));
        // Reaching this assertion is the point: the panic stayed inside the bridge
    }

    #[test]
    fn test_unknown_feature_is_a_bridge_error() {
        let (registry, table, history) = harness(vec![]);
        let services = HostServices {
            console: &NullConsole,
            llm: &NullLlm,
            history: &history,
            config: &NullConfig,
            analytics: &NullAnalytics,
            prompts: &NullPrompts,
        };
        let bridge = ExecutionBridge::new(&registry, &table, services);
        assert!(matches!(
            bridge.run("phantom"),
            Err(BridgeError::UnknownFeature(_))
        ));
    }

    #[test]
    fn test_disabled_feature_refused_before_invocation() {
        let (outcome, recorded) = run_one("steady", false);
        assert!(matches!(outcome, Err(BridgeError::FeatureDisabled(_))));
        assert_eq!(recorded, 0);
    }

    #[test]
    fn test_missing_entry_point() {
        let (registry, table, history) = harness(vec![manifest("unwired", true)]);
        let services = HostServices {
            console: &NullConsole,
            llm: &NullLlm,
            history: &history,
            config: &NullConfig,
            analytics: &NullAnalytics,
            prompts: &NullPrompts,
        };
        let bridge = ExecutionBridge::new(&registry, &table, services);
        assert!(matches!(
            bridge.run("unwired"),
            Err(BridgeError::MissingEntryPoint(_, _))
        ));
    }
}
