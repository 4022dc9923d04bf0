//! Execution-time contract
//!
//! Value objects and service interfaces passed into and returned from a
//! feature's entry point. The framework neither owns nor constructs the
//! services; the host supplies them and the bridge threads them through a
//! fresh `FeatureContext` per invocation.

use crate::registry::FeatureRegistry;
use crate::types::FeatureManifest;
use serde::Serialize;
use std::sync::Arc;

// =============================================================================
// SERVICE INTERFACES - host-owned collaborators, opaque to the framework
// =============================================================================

/// Output sink for user-visible feature text
pub trait ConsoleSink: Sync {
    fn line(&self, text: &str);
}

/// Handle to whichever LLM provider the host has configured
pub trait LlmClient: Sync {
    fn complete(&self, system: Option<&str>, prompt: &str) -> anyhow::Result<String>;
}

/// Append-only store of feature run records
pub trait HistoryStore: Sync {
    fn append(&self, record: &RunRecord) -> anyhow::Result<()>;
}

/// Read-only view of the workbench configuration
pub trait ConfigView: Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Fire-and-forget usage events
pub trait AnalyticsSink: Sync {
    fn record(&self, event: &str, feature: &str);
}

/// Handle to the core prompt builder (template substitution over the fixed
/// technique set; not part of this framework)
pub trait PromptBuilder: Sync {
    fn build(&self, technique: &str, task: &str) -> anyhow::Result<String>;
}

// =============================================================================
// FEATURE CONTEXT - borrowed services for one invocation
// =============================================================================

/// Everything a feature entry point may touch during one invocation.
///
/// Contexts are assembled per invocation and never shared between
/// invocations; concurrent runs each get their own value.
pub struct FeatureContext<'a> {
    pub console: &'a dyn ConsoleSink,
    pub llm: &'a dyn LlmClient,
    pub history: &'a dyn HistoryStore,
    pub config: &'a dyn ConfigView,
    pub analytics: &'a dyn AnalyticsSink,
    pub prompts: &'a dyn PromptBuilder,
    /// Self-reference so features can query sibling features
    pub registry: &'a FeatureRegistry,
    /// The manifest being executed
    pub manifest: &'a FeatureManifest,
}

// =============================================================================
// FEATURE RESULT - normalized outcome of one invocation
// =============================================================================

/// Outcome of one feature invocation
#[derive(Debug, Clone, Serialize)]
pub struct FeatureResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Opaque payload for the host (menu, tests, exporters)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FeatureResult {
    pub fn ok(message: impl Into<String>) -> Self {
        FeatureResult {
            success: true,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    pub fn ok_with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        FeatureResult {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        FeatureResult {
            success: false,
            message: None,
            data: None,
            error: Some(error.into()),
        }
    }
}

// =============================================================================
// RUN RECORD - history side effect written by the bridge
// =============================================================================

/// One feature run as recorded in the history store
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub feature: Arc<str>,
    pub success: bool,
    pub duration_ms: u64,
    pub at: Arc<str>,
}

impl RunRecord {
    pub fn new(feature: Arc<str>, success: bool, duration_ms: u64) -> Self {
        RunRecord {
            feature,
            success,
            duration_ms,
            at: Arc::from(chrono::Utc::now().to_rfc3339()),
        }
    }
}
