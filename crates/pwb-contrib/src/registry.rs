//! Feature registry
//!
//! Immutable queryable index over one discovery pass. Built once at startup
//! from a `DiscoveryResult` and read-only afterwards; a fresh pass builds a
//! fresh registry rather than mutating this one, which is what makes
//! concurrent reads from parallel feature invocations safe without locks.
//!
//! Every list operation returns features in the dependency-respecting order
//! the resolver established, so callers never re-sort.

use crate::errors::DiscoveryError;
use crate::types::{DiscoveryResult, FeatureCategory, FeatureManifest};
use ahash::AHashMap;
use std::sync::Arc;

/// Queryable index over the validated, ordered feature set
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    /// Resolved order from the discovery pass
    features: Vec<FeatureManifest>,
    /// O(1) lookup by unique name
    name_index: AHashMap<Arc<str>, usize>,
    /// Feature positions per category, in resolved order
    category_index: AHashMap<FeatureCategory, Vec<usize>>,
    errors: Vec<DiscoveryError>,
    warnings: Vec<String>,
}

impl FeatureRegistry {
    /// Build the registry from a finished discovery pass
    pub fn from_result(result: &DiscoveryResult) -> Self {
        let mut registry = FeatureRegistry {
            features: result.features.clone(),
            errors: result.errors.clone(),
            warnings: result.warnings.clone(),
            ..Default::default()
        };

        for (idx, manifest) in registry.features.iter().enumerate() {
            registry.name_index.insert(manifest.name.clone(), idx);
            registry
                .category_index
                .entry(manifest.category)
                .or_default()
                .push(idx);
        }

        registry
    }

    /// Look up a feature by exact name; absence is a `None`, never a panic
    #[inline]
    pub fn get(&self, name: &str) -> Option<&FeatureManifest> {
        self.name_index.get(name).map(|&idx| &self.features[idx])
    }

    /// All registered features in resolved order
    pub fn list_all(&self) -> &[FeatureManifest] {
        &self.features
    }

    /// Features in one category, resolved order preserved
    pub fn list_by_category(&self, category: FeatureCategory) -> Vec<&FeatureManifest> {
        self.category_index
            .get(&category)
            .map(|indexes| indexes.iter().map(|&idx| &self.features[idx]).collect())
            .unwrap_or_default()
    }

    /// Features that need an external provider credential
    pub fn list_requiring_api(&self) -> Vec<&FeatureManifest> {
        self.features
            .iter()
            .filter(|manifest| manifest.requires_api_key)
            .collect()
    }

    /// Features available for execution (enabled only)
    pub fn list_enabled(&self) -> Vec<&FeatureManifest> {
        self.features
            .iter()
            .filter(|manifest| manifest.enabled)
            .collect()
    }

    /// Non-empty categories with their features, in menu display order
    pub fn categories_with_features(
        &self,
    ) -> Vec<(FeatureCategory, Vec<&FeatureManifest>)> {
        FeatureCategory::DISPLAY_ORDER
            .into_iter()
            .map(|category| (category, self.list_by_category(category)))
            .filter(|(_, features)| !features.is_empty())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// True when the discovery pass this registry was built from rejected
    /// at least one contribution
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[DiscoveryError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
