//! Bundled workbench features
//!
//! Each builtin contributes a manifest constructor plus an entry point, both
//! registered statically. Registration stays lightweight; a feature's real
//! machinery is only built when its entry point runs. External contributions
//! discovered on disk use the same contract and can depend on these names.

pub mod chains;
pub mod library;
pub mod optimizer;

use once_cell::sync::Lazy;
use pwb_contrib::{EntryPointTable, FeatureManifest};

/// Manifest seeds handed to every discovery pass
pub fn manifests() -> Vec<FeatureManifest> {
    vec![
        library::manifest(),
        optimizer::manifest(),
        chains::manifest(),
    ]
}

/// Entry points for the bundled features, built once per process
pub static ENTRY_POINTS: Lazy<EntryPointTable> = Lazy::new(|| {
    let mut table = EntryPointTable::new();
    table.register("prompt-library", library::run);
    table.register("prompt-optimizer", optimizer::run);
    table.register("prompt-chains", chains::run);
    table
});


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_has_an_entry_point() {
        for manifest in manifests() {
            assert!(
                ENTRY_POINTS.get(manifest.entry_ref()).is_some(),
                "builtin '{}' is not wired",
                manifest.name
            );
        }
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let manifests = manifests();
        let mut names: Vec<&str> = manifests.iter().map(|m| m.name.as_ref()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), manifests.len());
    }
}
