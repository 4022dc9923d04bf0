//! Contract types for the contrib feature system
//!
//! This module provides:
//! - The `FeatureManifest` record every contribution must satisfy
//! - The closed `FeatureCategory` set used for menu grouping
//! - The permissive `RawManifest` shape the scanner loads before validation
//! - The immutable `DiscoveryResult` produced by one discovery pass
//!
//! Strings are interned as `Arc<str>` and dependency lists use `SmallVec`
//! so registry queries stay cheap to clone and iterate.

use crate::errors::DiscoveryError;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

// =============================================================================
// FEATURE CATEGORY - closed set used for menu grouping
// =============================================================================

/// Menu category for a contrib feature
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureCategory {
    Core,
    Ai,
    Storage,
    Export,
    Utility,
}

impl FeatureCategory {
    /// All categories in the order the menu displays them
    pub const DISPLAY_ORDER: [FeatureCategory; 5] = [
        FeatureCategory::Core,
        FeatureCategory::Ai,
        FeatureCategory::Storage,
        FeatureCategory::Export,
        FeatureCategory::Utility,
    ];

    /// Parse a manifest category string, accepting any casing
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CORE" => Some(FeatureCategory::Core),
            "AI" => Some(FeatureCategory::Ai),
            "STORAGE" => Some(FeatureCategory::Storage),
            "EXPORT" => Some(FeatureCategory::Export),
            "UTILITY" => Some(FeatureCategory::Utility),
            _ => None,
        }
    }

    /// Canonical label as written in manifest files
    pub fn label(self) -> &'static str {
        match self {
            FeatureCategory::Core => "CORE",
            FeatureCategory::Ai => "AI",
            FeatureCategory::Storage => "STORAGE",
            FeatureCategory::Export => "EXPORT",
            FeatureCategory::Utility => "UTILITY",
        }
    }
}

impl std::fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// FEATURE MANIFEST - validated identity and metadata for one contribution
// =============================================================================

/// Validated manifest for a single contrib feature.
///
/// Instances only exist after the validator has accepted the raw record; a
/// manifest is either fully present in the registry or entirely absent.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureManifest {
    /// Unique identifier, stable across runs
    pub name: Arc<str>,
    pub display_name: Arc<str>,
    pub description: Arc<str>,
    pub category: FeatureCategory,
    /// Display glyph, opaque to the framework
    pub icon: Arc<str>,
    /// True when the feature needs an external provider credential to work
    pub requires_api_key: bool,
    /// Names of features that must be registered before this one
    #[serde(skip_serializing_if = "SmallVec::is_empty")]
    pub dependencies: SmallVec<[Arc<str>; 4]>,
    /// Toggle independent of validity; disabled features still validate
    pub enabled: bool,
    /// Optional single-key menu accelerator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut_key: Option<char>,
    /// Entry point reference; defaults to `name` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<Arc<str>>,

    /// Runtime only - contrib directory name or builtin tag
    #[serde(skip)]
    pub source: Arc<str>,
}

impl FeatureManifest {
    /// The entry-point symbol the bridge resolves for this feature
    pub fn entry_ref(&self) -> &str {
        self.entry.as_deref().unwrap_or(&self.name)
    }
}

impl Default for FeatureManifest {
    fn default() -> Self {
        FeatureManifest {
            name: Arc::from(""),
            display_name: Arc::from(""),
            description: Arc::from(""),
            category: FeatureCategory::Utility,
            icon: Arc::from("\u{2022}"),
            requires_api_key: false,
            dependencies: SmallVec::new(),
            enabled: true,
            shortcut_key: None,
            entry: None,
            source: Arc::from(""),
        }
    }
}

// =============================================================================
// RAW MANIFEST - permissive shape loaded from manifest.toml
// =============================================================================

/// Manifest file contents before validation.
///
/// Every field is optional so a malformed file still deserializes and the
/// validator can report which check failed, instead of surfacing a serde
/// type error at use time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawManifest {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub requires_api_key: Option<bool>,
    pub dependencies: Option<Vec<String>>,
    pub enabled: Option<bool>,
    pub shortcut_key: Option<String>,
    pub entry: Option<String>,
}

// =============================================================================
// DISCOVERY RESULT - outcome of one full pass, immutable thereafter
// =============================================================================

/// Everything one discovery pass produced.
///
/// `features` is the dependency-ordered valid set; `errors` holds one record
/// per rejected contribution; `warnings` are informational only and never
/// exclude a manifest. The registry is built from `features` alone.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryResult {
    pub features: Vec<FeatureManifest>,
    pub errors: Vec<DiscoveryError>,
    pub warnings: Vec<String>,
    pub completed_at: Arc<str>,
}

impl DiscoveryResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// One-line summary for logs: `N features, M errors, K warnings`
    pub fn summary(&self) -> String {
        format!(
            "{} features, {} errors, {} warnings",
            self.features.len(),
            self.errors.len(),
            self.warnings.len()
        )
    }
}

impl Default for DiscoveryResult {
    fn default() -> Self {
        DiscoveryResult {
            features: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            completed_at: Arc::from(chrono::Utc::now().to_rfc3339()),
        }
    }
}
