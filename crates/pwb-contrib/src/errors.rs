use serde::Serialize;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during contrib framework operations
#[derive(Error, Debug)]
pub enum ContribError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Contrib root is not a directory: {0}")]
    RootNotFound(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),
}

/// Which stage of a discovery pass rejected a contribution
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryErrorKind {
    /// Manifest file missing, unreadable, or unparseable
    Load,
    /// Manifest loaded but structurally malformed
    Validation,
    /// Declared dependency does not resolve to a registered feature
    MissingDependency,
    /// Feature participates in a dependency cycle
    Cycle,
}

/// One rejected contribution, attached to the pass result for host display.
///
/// `source` names the contrib directory (or the builtin tag) the error came
/// from so the user can fix the right manifest.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryError {
    pub source: Arc<str>,
    pub kind: DiscoveryErrorKind,
    pub message: String,
}

impl DiscoveryError {
    pub fn new(source: impl Into<Arc<str>>, kind: DiscoveryErrorKind, message: String) -> Self {
        DiscoveryError {
            source: source.into(),
            kind,
            message,
        }
    }

    pub fn load(source: impl Into<Arc<str>>, message: String) -> Self {
        Self::new(source, DiscoveryErrorKind::Load, message)
    }

    pub fn validation(source: impl Into<Arc<str>>, message: String) -> Self {
        Self::new(source, DiscoveryErrorKind::Validation, message)
    }
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.source, self.message)
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::*;

    #[test]
    fn test_discovery_error_display() {
        let err = DiscoveryError::load("broken_feature", "manifest.toml not found".to_string());
        assert_eq!(err.to_string(), "[broken_feature] manifest.toml not found");
        assert_eq!(err.kind, DiscoveryErrorKind::Load);
    }

    #[test]
    fn test_contrib_error_display() {
        let err = ContribError::RootNotFound("/tmp/missing".to_string());
        assert_eq!(
            err.to_string(),
            "Contrib root is not a directory: /tmp/missing"
        );
    }
}
