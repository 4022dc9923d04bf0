//! Discovery orchestration
//!
//! One `DiscoveryEngine` runs one complete pass: builtin manifest seeds,
//! then the contrib directory scan, then validation in deterministic order
//! (builtins first, scanned directories lexicographically), then dependency
//! resolution. The outcome is an immutable `DiscoveryResult`; a new pass
//! means a new engine, never a mutation of an old result.
//!
//! Builtins are manifest values produced by the host's static constructor
//! table. They ride the same validation and resolution path as scanned
//! manifests, so a builtin name collision or dependency problem is reported
//! like any other.

use crate::errors::DiscoveryError;
use crate::resolver;
use crate::scanner::ManifestScanner;
use crate::types::{DiscoveryResult, FeatureManifest};
use crate::validator;
use ahash::AHashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs one scan-validate-resolve pass over builtins plus a contrib root
#[derive(Debug, Default)]
pub struct DiscoveryEngine {
    root: Option<PathBuf>,
    builtins: Vec<FeatureManifest>,
    parallel: bool,
}

impl DiscoveryEngine {
    pub fn new() -> Self {
        DiscoveryEngine::default()
    }

    /// Contrib directory to scan; skipped when unset or absent on disk
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Seed manifests from the host's builtin constructor table
    pub fn with_builtins(mut self, builtins: Vec<FeatureManifest>) -> Self {
        self.builtins = builtins;
        self
    }

    /// Scan contrib directories on the rayon pool instead of sequentially
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run the pass and produce its immutable result
    pub fn discover(&self) -> DiscoveryResult {
        let mut errors: Vec<DiscoveryError> = Vec::new();
        let mut seen: AHashSet<Arc<str>> = AHashSet::new();
        let mut validated: Vec<FeatureManifest> = Vec::new();

        for builtin in &self.builtins {
            if builtin.name.is_empty() {
                errors.push(DiscoveryError::validation(
                    builtin.source.clone(),
                    "Builtin manifest has an empty name".to_string(),
                ));
                continue;
            }
            if seen.contains(&builtin.name) {
                errors.push(DiscoveryError::validation(
                    builtin.source.clone(),
                    format!("Duplicate feature name '{}'; keeping the first", builtin.name),
                ));
                continue;
            }
            seen.insert(builtin.name.clone());
            validated.push(builtin.clone());
        }

        self.scan_into(&mut validated, &mut seen, &mut errors);

        let outcome = resolver::resolve(validated);
        errors.extend(outcome.errors);

        let result = DiscoveryResult {
            features: outcome.ordered,
            errors,
            warnings: outcome.warnings,
            completed_at: Arc::from(chrono::Utc::now().to_rfc3339()),
        };
        info!("Discovery pass finished: {}", result.summary());
        result
    }

    fn scan_into(
        &self,
        validated: &mut Vec<FeatureManifest>,
        seen: &mut AHashSet<Arc<str>>,
        errors: &mut Vec<DiscoveryError>,
    ) {
        let Some(root) = &self.root else {
            debug!("No contrib root configured; using builtins only");
            return;
        };
        if !root.is_dir() {
            // A fresh install has no contrib tree yet; that is not an error
            debug!("Contrib root {} does not exist; skipping scan", root.display());
            return;
        }

        let scanner = ManifestScanner::new(root);
        let scanned = if self.parallel {
            scanner.scan_parallel()
        } else {
            scanner.scan()
        };

        match scanned {
            Ok(output) => {
                errors.extend(output.errors);
                for entry in output.manifests {
                    match validator::validate(entry.raw, &entry.source, seen) {
                        Ok(manifest) => {
                            seen.insert(manifest.name.clone());
                            validated.push(manifest);
                        }
                        Err(err) => errors.push(err),
                    }
                }
            }
            Err(err) => {
                errors.push(DiscoveryError::load(
                    root.display().to_string(),
                    err.to_string(),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::discovery::*;
    use crate::registry::FeatureRegistry;
    use crate::types::FeatureCategory;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_feature(root: &Path, dir_name: &str, manifest: &str) {
        let dir = root.join(dir_name);
        let Ok(()) = fs::create_dir_all(&dir) else {
            return;
        };
        let _ = fs::write(dir.join(crate::MANIFEST_FILE_NAME), manifest);
    }

    fn builtin(name: &str, deps: &[&str]) -> FeatureManifest {
        FeatureManifest {
            name: Arc::from(name),
            display_name: Arc::from(name),
            source: Arc::from(format!("builtin:{name}").as_str()),
            dependencies: deps.iter().map(|dep| Arc::from(*dep)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_root_is_not_an_error() {
        let engine = DiscoveryEngine::new()
            .with_root("/tmp/pwb_engine_no_such_root_91c2")
            .with_builtins(vec![builtin("prompt-library", &[])]);
        let result = engine.discover();
        assert!(!result.has_errors());
        assert_eq!(result.features.len(), 1);
    }

    #[test]
    fn test_full_pass_orders_scanned_and_builtin_features() {
        let Ok(temp) = TempDir::new() else {
            return;
        };
        let root = temp.path();
        write_feature(
            root,
            "session_export",
            "name = \"session-export\"\ndisplay_name = \"Session Export\"\ncategory = \"EXPORT\"\ndependencies = [\"prompt-library\"]\n",
        );

        let engine = DiscoveryEngine::new()
            .with_root(root)
            .with_builtins(vec![builtin("prompt-library", &[])]);
        let result = engine.discover();

        assert!(!result.has_errors(), "unexpected errors: {:?}", result.errors);
        let names: Vec<&str> = result.features.iter().map(|m| m.name.as_ref()).collect();
        assert_eq!(names, vec!["prompt-library", "session-export"]);
    }

    #[test]
    fn test_broken_contribution_reduces_but_never_aborts() {
        let Ok(temp) = TempDir::new() else {
            return;
        };
        let root = temp.path();
        write_feature(
            root,
            "good_one",
            "name = \"good-one\"\ndisplay_name = \"Good One\"\ncategory = \"UTILITY\"\n",
        );
        write_feature(root, "no_category", "name = \"no-category\"\ndisplay_name = \"X\"\n");
        write_feature(root, "scrambled", "name = not even toml");

        let result = DiscoveryEngine::new().with_root(root).discover();

        assert_eq!(result.features.len(), 1);
        assert_eq!(result.features[0].name.as_ref(), "good-one");
        assert_eq!(result.errors.len(), 2);

        // Excluded contributions are entirely absent, never half-registered
        let registry = FeatureRegistry::from_result(&result);
        assert!(registry.get("no-category").is_none());
        assert!(registry.get("scrambled").is_none());
    }

    #[test]
    fn test_builtin_wins_name_collisions() {
        let Ok(temp) = TempDir::new() else {
            return;
        };
        let root = temp.path();
        write_feature(
            root,
            "imposter",
            "name = \"prompt-library\"\ndisplay_name = \"Imposter\"\ncategory = \"STORAGE\"\n",
        );

        let mut seeded = builtin("prompt-library", &[]);
        seeded.category = FeatureCategory::Storage;
        let result = DiscoveryEngine::new()
            .with_root(root)
            .with_builtins(vec![seeded])
            .discover();

        assert_eq!(result.features.len(), 1);
        assert_eq!(result.features[0].display_name.as_ref(), "prompt-library");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("Duplicate"));
    }

    #[test]
    fn test_cycle_across_scanned_features() {
        let Ok(temp) = TempDir::new() else {
            return;
        };
        let root = temp.path();
        write_feature(
            root,
            "p_feature",
            "name = \"p-feature\"\ndisplay_name = \"P\"\ncategory = \"AI\"\ndependencies = [\"q-feature\"]\n",
        );
        write_feature(
            root,
            "q_feature",
            "name = \"q-feature\"\ndisplay_name = \"Q\"\ncategory = \"AI\"\ndependencies = [\"p-feature\"]\n",
        );
        write_feature(
            root,
            "standalone",
            "name = \"standalone\"\ndisplay_name = \"S\"\ncategory = \"UTILITY\"\n",
        );

        let result = DiscoveryEngine::new().with_root(root).discover();

        let names: Vec<&str> = result.features.iter().map(|m| m.name.as_ref()).collect();
        assert_eq!(names, vec!["standalone"]);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("p-feature"));
        assert!(result.errors[0].message.contains("q-feature"));
    }

    #[test]
    fn test_repeated_passes_are_identical() {
        let Ok(temp) = TempDir::new() else {
            return;
        };
        let root = temp.path();
        for (dir, name, deps) in [
            ("one", "one", "[]"),
            ("two", "two", "[\"one\"]"),
            ("three", "three", "[\"two\"]"),
        ] {
            write_feature(
                root,
                dir,
                &format!(
                    "name = \"{name}\"\ndisplay_name = \"{name}\"\ncategory = \"CORE\"\ndependencies = {deps}\n"
                ),
            );
        }

        let engine = DiscoveryEngine::new().with_root(root);
        let first: Vec<String> = engine
            .discover()
            .features
            .iter()
            .map(|m| m.name.to_string())
            .collect();
        let second: Vec<String> = engine
            .discover()
            .features
            .iter()
            .map(|m| m.name.to_string())
            .collect();

        assert_eq!(first, second);
        assert_eq!(first, vec!["one", "two", "three"]);
    }
}
