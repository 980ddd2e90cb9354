//! AtomicWriter (spec.md §4.6): stages a [`FileSet`] to a same-filesystem
//! temp directory and installs it as an indivisible rename-swap, consulting
//! the [`crate::regen`] RegenerationManager for drift before committing.
//!
//! Staging starts from a full copy of the existing target directory (when
//! one exists) so that files the generator never owned — anything not in
//! the current `FileSet` — survive the swap untouched, exactly like a
//! regeneratable file the manifest says to overwrite and a `false`-flagged
//! one it must leave alone.

use crate::errors::WriteError;
use crate::fileset::{FileEntry, FileSet};
use crate::manifest::Manifest;
use crate::regen::{self, RegenPolicy};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Installs `fileset` into `target_dir`, either creating it fresh or
/// replacing it via rename-swap, and returns the manifest that was written
/// alongside it.
///
/// `target_dir`'s parent must exist; the staging directory is created as its
/// sibling so the final rename is guaranteed to stay on one filesystem.
pub fn install(
    target_dir: &Path,
    fileset: &FileSet,
    generator_version: impl Into<String>,
    timestamp: DateTime<Utc>,
    spec_hash: String,
    policy: RegenPolicy,
) -> Result<Manifest, WriteError> {
    let parent = target_dir.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&parent).map_err(|e| WriteError::StagingFailed(e.to_string()))?;

    let staging = tempfile::Builder::new()
        .prefix(".k8s-generator-staging-")
        .tempdir_in(&parent)
        .map_err(|e| WriteError::StagingFailed(e.to_string()))?;

    stage_files(staging.path(), target_dir, fileset).map_err(|e| WriteError::StagingFailed(e.to_string()))?;

    let effective = read_back_fileset(staging.path(), fileset);
    let manifest = Manifest::build(generator_version, timestamp, spec_hash, &effective);
    let manifest_yaml = manifest.to_yaml().map_err(|e| WriteError::StagingFailed(e.to_string()))?;
    std::fs::write(staging.path().join(".k8s-generator.yaml"), manifest_yaml)
        .map_err(|e| WriteError::StagingFailed(e.to_string()))?;

    if target_dir.exists() {
        if let Some(prior) = read_prior_manifest(target_dir) {
            let drifted = regen::detect_drift(target_dir, &prior);
            regen::reconcile(policy, drifted)?;
        }
        commit_over_existing(staging, target_dir)?;
    } else {
        std::fs::rename(staging.path(), target_dir).map_err(|e| WriteError::CommitFailed(e.to_string()))?;
    }

    Ok(manifest)
}

fn read_prior_manifest(target_dir: &Path) -> Option<Manifest> {
    let text = std::fs::read_to_string(target_dir.join(".k8s-generator.yaml")).ok()?;
    Manifest::from_yaml(&text).ok()
}

/// Seeds `staging_root` with a full copy of `target_dir` (if it exists),
/// then overlays `fileset`: regeneratable entries always overwrite, while
/// `regeneratable: false` entries only get their freshly rendered stub when
/// no on-disk copy was there to preserve.
fn stage_files(staging_root: &Path, target_dir: &Path, fileset: &FileSet) -> std::io::Result<()> {
    if target_dir.exists() {
        copy_dir_recursive(target_dir, staging_root)?;
    }
    for entry in fileset.sorted_by_path() {
        let dest = staging_root.join(&entry.relative_path);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if entry.regeneratable || !dest.exists() {
            std::fs::write(&dest, &entry.contents)?;
            set_executable(&dest, entry.executable)?;
        }
    }
    Ok(())
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in walkdir::WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir only yields descendants of its root");
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
            copy_permissions(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_permissions(src: &Path, dst: &Path) -> std::io::Result<()> {
    let perms = std::fs::metadata(src)?.permissions();
    std::fs::set_permissions(dst, perms)
}

#[cfg(not(unix))]
fn copy_permissions(_src: &Path, _dst: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Rebuilds a [`FileSet`] whose bytes are whatever actually ended up staged
/// for each entry (the fresh render, or a preserved on-disk file), so the
/// manifest records the hash of what is really about to be committed.
fn read_back_fileset(staging_root: &Path, fileset: &FileSet) -> FileSet {
    let mut effective = FileSet::new();
    for entry in fileset.entries() {
        let staged_path = staging_root.join(&entry.relative_path);
        let contents = std::fs::read(&staged_path).unwrap_or_else(|_| entry.contents.clone());
        effective.push(FileEntry {
            contents,
            ..entry.clone()
        });
    }
    effective
}

#[cfg(unix)]
fn set_executable(path: &Path, executable: bool) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(if executable { 0o755 } else { 0o644 });
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn set_executable(_path: &Path, _executable: bool) -> std::io::Result<()> {
    Ok(())
}

fn sibling_path(target_dir: &Path, suffix: &str) -> PathBuf {
    let mut name = target_dir.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    target_dir.with_file_name(name)
}

/// Rename-swaps `staging` into `target_dir`: `target_dir -> target_dir.old`,
/// `staging -> target_dir`, then delete `target_dir.old`. On failure between
/// the two renames, the original directory is restored from `.old`.
fn commit_over_existing(staging: TempDir, target_dir: &Path) -> Result<(), WriteError> {
    let old = sibling_path(target_dir, ".old");
    std::fs::rename(target_dir, &old).map_err(|e| WriteError::CommitFailed(e.to_string()))?;

    match std::fs::rename(staging.path(), target_dir) {
        Ok(()) => std::fs::remove_dir_all(&old).map_err(|e| WriteError::CleanupFailed(e.to_string())),
        Err(e) => {
            if let Err(restore_err) = std::fs::rename(&old, target_dir) {
                return Err(WriteError::CommitFailed(format!(
                    "commit failed ({e}) and restoring the previous directory also failed ({restore_err})"
                )));
            }
            Err(WriteError::CommitFailed(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fileset_with(entries: Vec<FileEntry>) -> FileSet {
        let mut fs = FileSet::new();
        for e in entries {
            fs.push(e);
        }
        fs
    }

    fn ts() -> DateTime<Utc> {
        "2024-01-01T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn fresh_target_is_created_with_exact_bytes_and_manifest() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("pt-m1");
        let fs = fileset_with(vec![
            FileEntry::new("Vagrantfile", b"vagrant body".to_vec()),
            FileEntry::new("scripts/bootstrap.sh", b"#!/bin/sh\n".to_vec()).executable(true),
        ]);

        let manifest = install(&target, &fs, "1.0.0", ts(), "deadbeef".into(), RegenPolicy::Default).unwrap();

        assert_eq!(std::fs::read(target.join("Vagrantfile")).unwrap(), b"vagrant body");
        assert!(target.join(".k8s-generator.yaml").exists());
        assert_eq!(manifest.generated.components.len(), 2);
    }

    #[test]
    fn rerunning_with_no_changes_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("pt-m1");
        let fs = fileset_with(vec![FileEntry::new("Vagrantfile", b"body".to_vec())]);

        install(&target, &fs, "1.0.0", ts(), "abc".into(), RegenPolicy::Default).unwrap();
        let second = install(&target, &fs, "1.0.0", ts(), "abc".into(), RegenPolicy::Default);
        assert!(second.is_ok());
        assert_eq!(std::fs::read(target.join("Vagrantfile")).unwrap(), b"body");
    }

    #[test]
    fn drift_without_force_is_rejected_and_leaves_target_untouched() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("pt-m1");
        let fs = fileset_with(vec![FileEntry::new("Vagrantfile", b"original".to_vec())]);
        install(&target, &fs, "1.0.0", ts(), "abc".into(), RegenPolicy::Default).unwrap();

        std::fs::write(target.join("Vagrantfile"), b"edited-by-hand").unwrap();

        let err = install(&target, &fs, "1.0.0", ts(), "abc".into(), RegenPolicy::Default).unwrap_err();
        assert!(matches!(err, WriteError::Drift { .. }));
        assert_eq!(std::fs::read(target.join("Vagrantfile")).unwrap(), b"edited-by-hand");
    }

    #[test]
    fn drift_with_force_converges_while_preserving_untracked_files() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("pt-m1");
        let fs = fileset_with(vec![FileEntry::new("Vagrantfile", b"original".to_vec())]);
        install(&target, &fs, "1.0.0", ts(), "abc".into(), RegenPolicy::Default).unwrap();

        std::fs::write(target.join("Vagrantfile"), b"edited-by-hand").unwrap();
        std::fs::write(target.join("assets_my.sh"), b"keep me").unwrap();

        install(&target, &fs, "1.0.0", ts(), "abc".into(), RegenPolicy::Force).unwrap();
        assert_eq!(std::fs::read(target.join("Vagrantfile")).unwrap(), b"original");
        assert_eq!(std::fs::read(target.join("assets_my.sh")).unwrap(), b"keep me");
    }

    #[test]
    fn non_regeneratable_files_survive_a_forced_overwrite() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("pt-m1");
        let fs = fileset_with(vec![
            FileEntry::new("Vagrantfile", b"original".to_vec()),
            FileEntry::new("scripts/bootstrap.env.local", b"stub".to_vec()).regeneratable(false),
        ]);
        install(&target, &fs, "1.0.0", ts(), "abc".into(), RegenPolicy::Default).unwrap();

        std::fs::write(target.join("scripts/bootstrap.env.local"), b"MY_OVERRIDE=1").unwrap();
        std::fs::write(target.join("Vagrantfile"), b"edited-by-hand").unwrap();

        install(&target, &fs, "1.0.0", ts(), "abc".into(), RegenPolicy::Force).unwrap();
        assert_eq!(
            std::fs::read(target.join("scripts/bootstrap.env.local")).unwrap(),
            b"MY_OVERRIDE=1"
        );
    }

    #[test]
    fn merge_policy_is_rejected_even_without_drift() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("pt-m1");
        let fs = fileset_with(vec![FileEntry::new("Vagrantfile", b"body".to_vec())]);
        install(&target, &fs, "1.0.0", ts(), "abc".into(), RegenPolicy::Default).unwrap();

        let err = install(&target, &fs, "1.0.0", ts(), "abc".into(), RegenPolicy::Merge).unwrap_err();
        assert!(matches!(err, WriteError::NotImplemented));
    }
}
