//! Manifest validation
//!
//! Converts the permissive `RawManifest` the scanner loads into the concrete
//! `FeatureManifest` contract, or rejects it with a single structured
//! validation error. Checks run in a fixed order and short-circuit on the
//! first failure so each broken manifest surfaces one actionable message.
//!
//! Dependency *existence* is deliberately not checked here - the full set of
//! names is only known once every directory has been validated, so that check
//! belongs to the resolver.

use crate::errors::DiscoveryError;
use crate::types::{FeatureCategory, FeatureManifest, RawManifest};
use ahash::AHashSet;
use smallvec::SmallVec;
use std::sync::Arc;

/// Validate one raw manifest against the contract.
///
/// `seen` holds every name already accepted in this pass; a duplicate name
/// rejects the later manifest so the first registration wins deterministically.
pub fn validate(
    raw: RawManifest,
    source: &Arc<str>,
    seen: &AHashSet<Arc<str>>,
) -> Result<FeatureManifest, DiscoveryError> {
    let name = required_field(raw.name, "name", source)?;
    let display_name = required_field(raw.display_name, "display_name", source)?;
    let category_text = required_field(raw.category, "category", source)?;

    let category = FeatureCategory::parse(&category_text).ok_or_else(|| {
        DiscoveryError::validation(
            source.clone(),
            format!(
                "Unknown category '{}' (expected one of CORE, AI, STORAGE, EXPORT, UTILITY)",
                category_text
            ),
        )
    })?;

    let shortcut_key = match raw.shortcut_key {
        None => None,
        Some(key) => Some(parse_shortcut_key(&key, source)?),
    };

    let mut dependencies: SmallVec<[Arc<str>; 4]> = SmallVec::new();
    for dep in raw.dependencies.unwrap_or_default() {
        let dep = dep.trim();
        if dep.is_empty() {
            return Err(DiscoveryError::validation(
                source.clone(),
                format!("Feature '{}' declares an empty dependency name", name),
            ));
        }
        dependencies.push(Arc::from(dep));
    }

    let name: Arc<str> = Arc::from(name.as_str());
    if seen.contains(&name) {
        return Err(DiscoveryError::validation(
            source.clone(),
            format!("Duplicate feature name '{}'; keeping the first", name),
        ));
    }

    Ok(FeatureManifest {
        name,
        display_name: Arc::from(display_name.as_str()),
        description: Arc::from(raw.description.unwrap_or_default().as_str()),
        category,
        icon: raw
            .icon
            .map_or_else(|| Arc::from("\u{2022}"), |icon| Arc::from(icon.as_str())),
        requires_api_key: raw.requires_api_key.unwrap_or(false),
        dependencies,
        enabled: raw.enabled.unwrap_or(true),
        shortcut_key,
        entry: raw.entry.map(|entry| Arc::from(entry.as_str())),
        source: source.clone(),
    })
}

fn required_field(
    value: Option<String>,
    field: &str,
    source: &Arc<str>,
) -> Result<String, DiscoveryError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(DiscoveryError::validation(
            source.clone(),
            format!("Missing required field '{}'", field),
        )),
    }
}

fn parse_shortcut_key(key: &str, source: &Arc<str>) -> Result<char, DiscoveryError> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if !ch.is_whitespace() && !ch.is_control() => Ok(ch),
        _ => Err(DiscoveryError::validation(
            source.clone(),
            format!(
                "shortcut_key '{}' must be a single printable character",
                key
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::DiscoveryErrorKind;
    use crate::validator::*;

    fn raw(name: &str, category: &str) -> RawManifest {
        RawManifest {
            name: Some(name.to_string()),
            display_name: Some("Display".to_string()),
            category: Some(category.to_string()),
            ..Default::default()
        }
    }

    fn src(name: &str) -> Arc<str> {
        Arc::from(name)
    }

    #[test]
    fn test_valid_manifest_passes() {
        let result = validate(raw("prompt-library", "STORAGE"), &src("prompt_library"), &AHashSet::new());
        assert!(result.is_ok_and(|m| {
            m.name.as_ref() == "prompt-library"
                && m.category == FeatureCategory::Storage
                && m.enabled
                && !m.requires_api_key
        }));
    }

    #[test]
    fn test_missing_name_rejected() {
        let mut manifest = raw("x", "AI");
        manifest.name = Some("   ".to_string());
        let result = validate(manifest, &src("blank"), &AHashSet::new());
        assert!(result.is_err_and(|e| {
            e.kind == DiscoveryErrorKind::Validation && e.message.contains("'name'")
        }));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let result = validate(raw("widget", "GADGETS"), &src("widget"), &AHashSet::new());
        assert!(result.is_err_and(|e| e.message.contains("GADGETS")));
    }

    #[test]
    fn test_shortcut_key_must_be_single_char() {
        let mut manifest = raw("keyed", "UTILITY");
        manifest.shortcut_key = Some("ab".to_string());
        assert!(validate(manifest, &src("keyed"), &AHashSet::new()).is_err());

        let mut manifest = raw("keyed", "UTILITY");
        manifest.shortcut_key = Some("k".to_string());
        let result = validate(manifest, &src("keyed"), &AHashSet::new());
        assert!(result.is_ok_and(|m| m.shortcut_key == Some('k')));
    }

    #[test]
    fn test_empty_dependency_name_rejected() {
        let mut manifest = raw("chained", "AI");
        manifest.dependencies = Some(vec!["base".to_string(), "  ".to_string()]);
        let result = validate(manifest, &src("chained"), &AHashSet::new());
        assert!(result.is_err_and(|e| e.message.contains("empty dependency")));
    }

    #[test]
    fn test_duplicate_name_rejects_the_later_manifest() {
        let mut seen = AHashSet::new();
        seen.insert(Arc::from("prompt-library"));
        let result = validate(raw("prompt-library", "STORAGE"), &src("copycat"), &seen);
        assert!(result.is_err_and(|e| e.message.contains("Duplicate")));
    }

    #[test]
    fn test_disabled_manifest_still_validates() {
        let mut manifest = raw("dormant", "UTILITY");
        manifest.enabled = Some(false);
        let result = validate(manifest, &src("dormant"), &AHashSet::new());
        assert!(result.is_ok_and(|m| !m.enabled));
    }
}
