//! The `.k8s-generator.yaml` manifest (spec.md §3, §6): the generator's audit
//! record of what it produced, read back on the next run for drift
//! detection (§4.7).

use crate::fileset::FileSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sha2::Sha256;

/// The manifest schema version, bumped only if the on-disk shape changes in
/// a way that breaks older readers.
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// One rendered file's entry in the manifest (spec.md §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub file: String,
    pub regeneratable: bool,
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// The body of the `generated:` top-level map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestBody {
    pub version: u32,
    pub generator_version: String,
    pub timestamp: DateTime<Utc>,
    pub spec_hash: String,
    pub components: Vec<Component>,
}

/// `.k8s-generator.yaml`: a single top-level map `generated:` (spec.md §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub generated: ManifestBody,
}

impl Manifest {
    /// Builds the manifest for a freshly-rendered `FileSet`. `timestamp` is
    /// passed in rather than read from the clock here, since workflow
    /// scripts and tests must not call `Utc::now()` from inside otherwise
    /// pure code; the CLI driver stamps it once at the pipeline boundary.
    pub fn build(
        generator_version: impl Into<String>,
        timestamp: DateTime<Utc>,
        spec_hash: String,
        fileset: &FileSet,
    ) -> Self {
        let components = fileset
            .sorted_by_path()
            .into_iter()
            .map(|entry| Component {
                file: entry.relative_path.to_string_lossy().replace('\\', "/"),
                regeneratable: entry.regeneratable,
                hash: hex::encode(Sha1::digest(&entry.contents)),
                template: entry.template_path.clone(),
            })
            .collect();

        Manifest {
            generated: ManifestBody {
                version: MANIFEST_SCHEMA_VERSION,
                generator_version: generator_version.into(),
                timestamp,
                spec_hash,
                components,
            },
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn component(&self, relative_path: &str) -> Option<&Component> {
        self.generated
            .components
            .iter()
            .find(|c| c.file == relative_path)
    }
}

/// SHA-256 over a canonical JSON encoding of a value, hex-encoded (spec.md
/// §6's `spec_hash`). Takes anything `Serialize` so the CLI can hash the
/// post-defaults `Request` without this crate depending on the CLI's own
/// request-shape details.
pub fn spec_hash(value: &impl Serialize) -> Result<String, serde_json::Error> {
    let canonical = serde_json::to_vec(value)?;
    Ok(hex::encode(Sha256::digest(canonical)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileset::FileEntry;

    fn fixed_timestamp() -> DateTime<Utc> {
        "2024-01-01T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn build_sorts_components_lexicographically_by_file() {
        let mut fs = FileSet::new();
        fs.push(FileEntry::new("scripts/bootstrap.sh", b"b".to_vec()));
        fs.push(FileEntry::new("Vagrantfile", b"v".to_vec()));

        let manifest = Manifest::build("1.0.0", fixed_timestamp(), "deadbeef".into(), &fs);
        let files: Vec<_> = manifest.generated.components.iter().map(|c| c.file.clone()).collect();
        assert_eq!(files, vec!["Vagrantfile".to_string(), "scripts/bootstrap.sh".to_string()]);
    }

    #[test]
    fn round_trips_through_yaml() {
        let mut fs = FileSet::new();
        fs.push(
            FileEntry::new("scripts/bootstrap.env.local", b"".to_vec())
                .regeneratable(false),
        );
        let manifest = Manifest::build("1.0.0", fixed_timestamp(), "cafe".into(), &fs);
        let yaml = manifest.to_yaml().unwrap();
        assert!(yaml.contains("generated:"));
        let back = Manifest::from_yaml(&yaml).unwrap();
        assert_eq!(back, manifest);
        assert!(!back.component("scripts/bootstrap.env.local").unwrap().regeneratable);
    }

    #[test]
    fn spec_hash_is_stable_for_identical_input() {
        #[derive(Serialize)]
        struct R {
            a: u32,
            b: String,
        }
        let r = R { a: 1, b: "x".into() };
        assert_eq!(spec_hash(&r).unwrap(), spec_hash(&r).unwrap());
    }

    #[test]
    fn spec_hash_differs_for_different_input() {
        #[derive(Serialize)]
        struct R {
            a: u32,
        }
        assert_ne!(spec_hash(&R { a: 1 }).unwrap(), spec_hash(&R { a: 2 }).unwrap());
    }
}
