//! Contrib directory scanner
//!
//! Walks the immediate children of the contrib root and loads one raw
//! manifest per directory. A directory with a missing or unreadable
//! `manifest.toml` is recorded as a load error and never aborts the scan of
//! its siblings. Traversal is lexicographic by directory name so discovery
//! output is reproducible on an unchanged filesystem.

use crate::errors::{ContribError, DiscoveryError};
use crate::types::RawManifest;
use crate::MANIFEST_FILE_NAME;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// One successfully loaded (not yet validated) manifest
#[derive(Debug, Clone)]
pub struct ScannedManifest {
    /// Contrib directory name, used as the error source label downstream
    pub source: Arc<str>,
    pub dir: PathBuf,
    pub raw: RawManifest,
}

/// Everything one scan produced: loadable manifests in lexicographic
/// directory order, plus one error per directory that failed to load
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub manifests: Vec<ScannedManifest>,
    pub errors: Vec<DiscoveryError>,
}

/// Scans a contrib root for feature manifests
#[derive(Debug, Clone)]
pub struct ManifestScanner {
    root: PathBuf,
}

impl ManifestScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ManifestScanner { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan sequentially in lexicographic directory order
    pub fn scan(&self) -> Result<ScanOutput, ContribError> {
        let dirs = self.contrib_dirs()?;
        let mut output = ScanOutput::default();

        for (source, dir) in dirs {
            match load_manifest(&source, &dir) {
                Ok(raw) => output.manifests.push(ScannedManifest { source, dir, raw }),
                Err(err) => output.errors.push(err),
            }
        }

        debug!(
            "Scanned {}: {} manifests, {} load errors",
            self.root.display(),
            output.manifests.len(),
            output.errors.len()
        );
        Ok(output)
    }

    /// Scan directories in parallel and merge results.
    ///
    /// Observationally identical to `scan`: manifest order follows the
    /// indexed collect and the shared error list is re-sorted by source
    /// after the merge.
    pub fn scan_parallel(&self) -> Result<ScanOutput, ContribError> {
        let dirs = self.contrib_dirs()?;
        let errors: Mutex<Vec<DiscoveryError>> = Mutex::new(Vec::new());

        let manifests: Vec<ScannedManifest> = dirs
            .into_par_iter()
            .filter_map(|(source, dir)| match load_manifest(&source, &dir) {
                Ok(raw) => Some(ScannedManifest { source, dir, raw }),
                Err(err) => {
                    errors.lock().push(err);
                    None
                }
            })
            .collect();

        let mut errors = errors.into_inner();
        errors.sort_by(|a, b| a.source.cmp(&b.source));

        Ok(ScanOutput { manifests, errors })
    }

    /// Immediate child directories of the root, lexicographic by name
    fn contrib_dirs(&self) -> Result<Vec<(Arc<str>, PathBuf)>, ContribError> {
        if !self.root.is_dir() {
            return Err(ContribError::RootNotFound(
                self.root.display().to_string(),
            ));
        }

        let dirs = walkdir::WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .map(|entry| {
                let source: Arc<str> = Arc::from(entry.file_name().to_string_lossy().as_ref());
                (source, entry.into_path())
            })
            .collect();

        Ok(dirs)
    }
}

/// Load and parse one directory's manifest file
fn load_manifest(source: &Arc<str>, dir: &Path) -> Result<RawManifest, DiscoveryError> {
    let manifest_path = dir.join(MANIFEST_FILE_NAME);

    if !manifest_path.is_file() {
        return Err(DiscoveryError::load(
            source.clone(),
            format!("{} not found in {}", MANIFEST_FILE_NAME, dir.display()),
        ));
    }

    let content = fs::read_to_string(&manifest_path).map_err(|err| {
        DiscoveryError::load(
            source.clone(),
            format!("Failed to read {}: {}", manifest_path.display(), err),
        )
    })?;

    toml::from_str(&content).map_err(|err| {
        DiscoveryError::load(
            source.clone(),
            format!("Failed to parse {}: {}", MANIFEST_FILE_NAME, err),
        )
    })
}
