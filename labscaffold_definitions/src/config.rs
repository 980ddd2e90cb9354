//! Environment-derived knobs the generator honours, beyond the CLI shape
//! itself (SPEC_FULL.md §2 ambient "Configuration" note).

use std::path::PathBuf;

const GENERATOR_VERSION_VAR: &str = "K8S_LAB_GENERATOR_VERSION";
const TEMPLATE_OVERRIDE_DIR_VAR: &str = "K8S_LAB_TEMPLATE_OVERRIDE_DIR";

/// Resolved runtime configuration. Never read from a file — the generator
/// has no YAML-spec ingestion surface beyond the CLI shape (spec.md §1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub generator_version: String,
    /// Set only when `K8S_LAB_TEMPLATE_OVERRIDE_DIR` is present in the
    /// environment. The renderer never consults this for production output —
    /// it exists purely as a local-development escape hatch, and the CLI
    /// driver logs a `warn!` when it is set (see SPEC_FULL.md §2).
    pub template_override_dir: Option<PathBuf>,
}

impl Config {
    /// Reads `Config` from the process environment, falling back to the
    /// crate's own compiled-in version when `K8S_LAB_GENERATOR_VERSION` is
    /// unset.
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Testable variant of [`Config::from_env`] taking an injected lookup
    /// function instead of reading the real process environment.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let generator_version = lookup(GENERATOR_VERSION_VAR).unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
        let template_override_dir = lookup(TEMPLATE_OVERRIDE_DIR_VAR).map(PathBuf::from);
        Config {
            generator_version,
            template_override_dir,
        }
    }
}
