//! Closed error taxonomy for the generation pipeline (spec.md §7).
//!
//! Each stage gets its own `thiserror` enum, the direct descendant of the
//! per-module `#[derive(Fail)]` enums the teacher keeps next to each
//! subsystem (`HErrKind`, `VErrKind`, `GErrKind`).

use std::path::PathBuf;
use thiserror::Error;

/// Failures from the IP allocator (§4.2).
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum IpError {
    #[error("allocating {count} addresses from {start} would pass the .255 boundary")]
    Exhausted { start: std::net::Ipv4Addr, count: u32 },
}

/// Failures from the renderer (§4.5).
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum TemplateError {
    #[error("no template registered for id '{0}'")]
    MissingTemplate(String),

    #[error("template '{template}' failed to render: {message}")]
    RenderFailure { template: String, message: String },
}

/// Sub-kinds of atomic-write failure (§4.6).
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to stage file set: {0}")]
    StagingFailed(String),

    #[error("drift detected in {} regeneratable file(s): {}\nre-run with --force to overwrite", paths.len(), paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    Drift { paths: Vec<PathBuf> },

    #[error("failed to commit staged directory: {0}")]
    CommitFailed(String),

    #[error("failed to clean up after a failed commit: {0}")]
    CleanupFailed(String),

    #[error("regeneration mode 'merge' is not implemented")]
    NotImplemented,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WriteError {
    /// Paths reported as drifted, if this is a [`WriteError::Drift`].
    pub fn drifted_paths(&self) -> Option<&[PathBuf]> {
        match self {
            WriteError::Drift { paths } => Some(paths),
            _ => None,
        }
    }
}
