//! RegenerationManager (spec.md §4.7): drift detection against a prior
//! manifest and the overwrite policy the `AtomicWriter` enforces.

use crate::errors::WriteError;
use crate::manifest::Manifest;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};

/// How the writer should treat a target directory that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegenPolicy {
    /// Any drift on a regeneratable file aborts the write.
    #[default]
    Default,
    /// Drift is accepted; regenerated content wins. Non-regeneratable files
    /// are still left untouched (the writer handles that, not this policy).
    Force,
    /// Reserved; spec.md §4.7 requires this to fail until implemented.
    Merge,
}

/// Hashes every `regeneratable: true` component of `prior` against the copy
/// on disk under `target_dir` and returns the paths whose content no longer
/// matches the stored hash. A component whose file is missing entirely also
/// counts as drifted — its content has certainly diverged from what was
/// recorded.
pub fn detect_drift(target_dir: &Path, prior: &Manifest) -> Vec<PathBuf> {
    let mut drifted = Vec::new();
    for component in &prior.generated.components {
        if !component.regeneratable {
            continue;
        }
        let path = target_dir.join(&component.file);
        let matches = std::fs::read(&path)
            .map(|bytes| hex::encode(Sha1::digest(&bytes)) == component.hash)
            .unwrap_or(false);
        if !matches {
            drifted.push(PathBuf::from(&component.file));
        }
    }
    drifted
}

/// Applies `policy` to a set of drifted paths, either letting the write
/// proceed or producing the appropriate [`WriteError`].
pub fn reconcile(policy: RegenPolicy, drifted: Vec<PathBuf>) -> Result<(), WriteError> {
    match policy {
        RegenPolicy::Merge => Err(WriteError::NotImplemented),
        RegenPolicy::Force => Ok(()),
        RegenPolicy::Default => {
            if drifted.is_empty() {
                Ok(())
            } else {
                Err(WriteError::Drift { paths: drifted })
            }
        }
    }
}
