//! Dependency resolution
//!
//! Orders validated manifests so every feature appears strictly after all of
//! its declared dependencies, in two passes:
//!
//! 1. *Classification* - a depth-first traversal with a `Visiting` marker per
//!    node. Revisiting a `Visiting` node identifies a cycle; every manifest on
//!    the cycle is excluded and the cycle is reported once. A dependency that
//!    names no validated manifest (or one excluded earlier) excludes the
//!    dependent with a single missing-dependency error. Exclusions cascade,
//!    the unrelated remainder of the graph resolves normally.
//! 2. *Ordering* - Kahn's algorithm over the surviving subgraph with a
//!    min-heap on name, so manifests with no constraint between them come out
//!    in name-ascending order and the sequence is identical across runs.

use crate::errors::{DiscoveryError, DiscoveryErrorKind};
use crate::types::FeatureManifest;
use ahash::AHashMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use tracing::debug;

/// Ordered survivors plus everything the resolver rejected or flagged
#[derive(Debug, Default)]
pub struct ResolveOutcome {
    pub ordered: Vec<FeatureManifest>,
    pub errors: Vec<DiscoveryError>,
    pub warnings: Vec<String>,
}

/// Resolve the validated set into a deterministic dependency order
pub fn resolve(manifests: Vec<FeatureManifest>) -> ResolveOutcome {
    let mut classifier = Classifier::new(&manifests);
    for idx in classifier.name_ordered_indexes() {
        classifier.visit(idx);
    }

    let Classifier {
        marks,
        errors,
        mut warnings,
        ..
    } = classifier;

    let survivors: Vec<&FeatureManifest> = manifests
        .iter()
        .enumerate()
        .filter(|(idx, _)| marks[*idx] == Mark::Resolved)
        .map(|(_, manifest)| manifest)
        .collect();

    collect_dependency_warnings(&survivors, &mut warnings);
    let ordered = kahn_order(&survivors);

    debug!(
        "Resolved {} of {} manifests ({} errors)",
        ordered.len(),
        manifests.len(),
        errors.len()
    );

    // Error order already follows the name-ascending visit order, so hosts
    // that diff doctor output between runs see a stable list.
    ResolveOutcome {
        ordered,
        errors,
        warnings,
    }
}

// =============================================================================
// PASS 1 - CLASSIFICATION (cycle + missing-dependency exclusion)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Resolved,
    Excluded,
}

struct Classifier<'a> {
    manifests: &'a [FeatureManifest],
    index: AHashMap<Arc<str>, usize>,
    marks: Vec<Mark>,
    path: Vec<usize>,
    errors: Vec<DiscoveryError>,
    warnings: Vec<String>,
}

impl<'a> Classifier<'a> {
    fn new(manifests: &'a [FeatureManifest]) -> Self {
        let index = manifests
            .iter()
            .enumerate()
            .map(|(idx, manifest)| (manifest.name.clone(), idx))
            .collect();
        Classifier {
            manifests,
            index,
            marks: vec![Mark::Unvisited; manifests.len()],
            path: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Roots visited in name-ascending order for deterministic traversal
    fn name_ordered_indexes(&self) -> Vec<usize> {
        let mut indexes: Vec<usize> = (0..self.manifests.len()).collect();
        indexes.sort_by(|&a, &b| self.manifests[a].name.cmp(&self.manifests[b].name));
        indexes
    }

    /// Returns true when the manifest (and its whole dependency closure)
    /// survived classification
    fn visit(&mut self, idx: usize) -> bool {
        match self.marks[idx] {
            Mark::Resolved => return true,
            Mark::Excluded => return false,
            Mark::Visiting | Mark::Unvisited => {}
        }

        self.marks[idx] = Mark::Visiting;
        self.path.push(idx);

        let mut failed_dependency: Option<Arc<str>> = None;
        let dependencies = self.manifests[idx].dependencies.clone();
        for dep in &dependencies {
            match self.index.get(dep).copied() {
                None => {
                    failed_dependency = Some(dep.clone());
                    break;
                }
                Some(dep_idx) => match self.marks[dep_idx] {
                    Mark::Resolved => {}
                    Mark::Excluded => {
                        failed_dependency = Some(dep.clone());
                        break;
                    }
                    Mark::Visiting => {
                        self.report_cycle(dep_idx);
                        break;
                    }
                    Mark::Unvisited => {
                        if !self.visit(dep_idx) {
                            // The recursive visit may have put this node on a
                            // reported cycle; in that case it is already
                            // excluded and owes no further error.
                            if self.marks[idx] == Mark::Excluded {
                                break;
                            }
                            failed_dependency = Some(dep.clone());
                            break;
                        }
                    }
                },
            }
        }

        self.path.pop();

        if self.marks[idx] == Mark::Excluded {
            return false;
        }

        if let Some(dep) = failed_dependency {
            let manifest = &self.manifests[idx];
            let reason = if self.index.contains_key(&dep) {
                "was excluded earlier in this pass"
            } else {
                "is not registered in this pass"
            };
            self.errors.push(DiscoveryError::new(
                manifest.source.clone(),
                DiscoveryErrorKind::MissingDependency,
                format!(
                    "Feature '{}' depends on '{}', which {}",
                    manifest.name, dep, reason
                ),
            ));
            self.marks[idx] = Mark::Excluded;
            return false;
        }

        self.marks[idx] = Mark::Resolved;
        true
    }

    /// Exclude every manifest on the cycle closed by an edge back to
    /// `entry_idx` and record the cycle exactly once
    fn report_cycle(&mut self, entry_idx: usize) {
        let Some(start) = self.path.iter().position(|&idx| idx == entry_idx) else {
            return;
        };
        let cycle: Vec<usize> = self.path[start..].to_vec();

        // Rotate so the smallest name leads; the reported loop is then
        // independent of which member the traversal entered first.
        let lead = cycle
            .iter()
            .enumerate()
            .min_by(|(_, &a), (_, &b)| self.manifests[a].name.cmp(&self.manifests[b].name))
            .map_or(0, |(pos, _)| pos);

        let mut names: Vec<&str> = Vec::with_capacity(cycle.len() + 1);
        for offset in 0..cycle.len() {
            let idx = cycle[(lead + offset) % cycle.len()];
            names.push(self.manifests[idx].name.as_ref());
        }
        names.push(self.manifests[cycle[lead]].name.as_ref());

        self.errors.push(DiscoveryError::new(
            self.manifests[cycle[lead]].source.clone(),
            DiscoveryErrorKind::Cycle,
            format!("Dependency cycle: {}", names.join(" -> ")),
        ));

        for idx in cycle {
            self.marks[idx] = Mark::Excluded;
        }
    }
}

/// Flag enabled survivors whose dependencies are disabled. The dependency
/// still satisfies the reference, so this is informational only.
fn collect_dependency_warnings(survivors: &[&FeatureManifest], warnings: &mut Vec<String>) {
    let enabled: AHashMap<&str, bool> = survivors
        .iter()
        .map(|manifest| (manifest.name.as_ref(), manifest.enabled))
        .collect();

    for manifest in survivors {
        if !manifest.enabled {
            continue;
        }
        for dep in &manifest.dependencies {
            if enabled.get(dep.as_ref()) == Some(&false) {
                warnings.push(format!(
                    "Feature '{}' depends on disabled feature '{}'",
                    manifest.name, dep
                ));
            }
        }
    }

    let mut by_key: AHashMap<char, Vec<&str>> = AHashMap::new();
    for manifest in survivors {
        if !manifest.enabled {
            continue;
        }
        if let Some(key) = manifest.shortcut_key {
            by_key.entry(key).or_default().push(manifest.name.as_ref());
        }
    }
    let mut clashes: Vec<(char, Vec<&str>)> = by_key
        .into_iter()
        .filter(|(_, names)| names.len() > 1)
        .collect();
    clashes.sort_by_key(|(key, _)| *key);
    for (key, names) in clashes {
        warnings.push(format!(
            "Shortcut key '{}' is shared by features: {}",
            key,
            names.join(", ")
        ));
    }
}

// =============================================================================
// PASS 2 - DETERMINISTIC ORDERING (Kahn, name-ascending tie-break)
// =============================================================================

fn kahn_order(survivors: &[&FeatureManifest]) -> Vec<FeatureManifest> {
    let index: AHashMap<&str, usize> = survivors
        .iter()
        .enumerate()
        .map(|(idx, manifest)| (manifest.name.as_ref(), idx))
        .collect();

    let mut in_degree = vec![0_usize; survivors.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); survivors.len()];
    for (idx, manifest) in survivors.iter().enumerate() {
        for dep in &manifest.dependencies {
            if let Some(&dep_idx) = index.get(dep.as_ref()) {
                in_degree[idx] += 1;
                dependents[dep_idx].push(idx);
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<(Arc<str>, usize)>> = survivors
        .iter()
        .enumerate()
        .filter(|(idx, _)| in_degree[*idx] == 0)
        .map(|(idx, manifest)| Reverse((manifest.name.clone(), idx)))
        .collect();

    let mut ordered = Vec::with_capacity(survivors.len());
    while let Some(Reverse((_, idx))) = ready.pop() {
        ordered.push(survivors[idx].clone());
        for &dependent in &dependents[idx] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.push(Reverse((survivors[dependent].name.clone(), dependent)));
            }
        }
    }

    ordered
}
