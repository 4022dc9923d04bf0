//! pwb contrib framework
//!
//! This crate is the discovery and execution core for pwb contrib features.
//! A contrib feature is a self-contained contribution described by a
//! `manifest.toml` in its own directory under the contrib root. One discovery
//! pass scans that tree, validates each manifest against the shared contract,
//! orders the valid set by declared dependencies (rejecting cycles and
//! dangling references without aborting the pass), and produces an immutable
//! registry the host queries to render menus and run features.
//!
//! A broken contribution is recorded and excluded; it never takes the rest of
//! the workbench down with it.

pub mod bridge;
pub mod discovery;
pub mod errors;
pub mod execution;
pub mod registry;
pub mod resolver;
pub mod scanner;
pub mod types;
pub mod validator;

pub use bridge::{BridgeError, EntryPoint, EntryPointTable, ExecutionBridge, HostServices};
pub use discovery::DiscoveryEngine;
pub use errors::{ContribError, DiscoveryError, DiscoveryErrorKind};
pub use execution::{
    AnalyticsSink, ConfigView, ConsoleSink, FeatureContext, FeatureResult, HistoryStore,
    LlmClient, PromptBuilder, RunRecord,
};
pub use registry::FeatureRegistry;
pub use types::{DiscoveryResult, FeatureCategory, FeatureManifest, RawManifest};

/// Name of the manifest file expected in each contrib directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.toml";
